//! Browser collaborators: the document, the `ApexTree` global, and timers.

use gloo_timers::callback::Timeout;
use js_sys::{Function, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event};

use super::bridge::Bridge;
use super::error::{BridgeError, EngineError};
use super::host::{Backend, Dom, NodeEvent, Scheduler, TreeEngine, TreeGraph};
use super::options::EffectiveConfig;
use super::template::Template;
use super::types::{TreeDirection, TreeNode};

/// Elements the engine renders node content into.
const NODE_SELECTOR: &str = "foreignObject";
/// Attribute that names a node directly, checked before walking ancestors.
const NODE_ID_ATTRIBUTE: &str = "data-node-id";
/// Global the engine library installs.
const ENGINE_GLOBAL: &str = "ApexTree";

#[wasm_bindgen]
extern "C" {
	#[wasm_bindgen(js_name = ApexTree)]
	type ApexTreeJs;

	#[wasm_bindgen(constructor, js_class = "ApexTree", catch)]
	fn new(element: &Element, options: &JsValue) -> Result<ApexTreeJs, JsValue>;

	#[wasm_bindgen(method, js_class = "ApexTree", catch)]
	fn render(this: &ApexTreeJs, data: &JsValue) -> Result<GraphJs, JsValue>;

	type GraphJs;

	#[wasm_bindgen(method, js_name = changeLayout, catch)]
	fn change_layout(this: &GraphJs, direction: &str) -> Result<(), JsValue>;

	#[wasm_bindgen(method, catch)]
	fn expand(this: &GraphJs, node_id: &str) -> Result<(), JsValue>;

	#[wasm_bindgen(method, catch)]
	fn collapse(this: &GraphJs, node_id: &str) -> Result<(), JsValue>;

	#[wasm_bindgen(method, js_name = fitScreen, catch)]
	fn fit_screen(this: &GraphJs) -> Result<(), JsValue>;
}

impl From<JsValue> for EngineError {
	fn from(value: JsValue) -> Self {
		EngineError::new(js_message(&value))
	}
}

fn js_message(value: &JsValue) -> String {
	value
		.dyn_ref::<js_sys::Error>()
		.map(|e| String::from(e.message()))
		.or_else(|| value.as_string())
		.unwrap_or_else(|| format!("{:?}", value))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, EngineError> {
	value
		.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
		.map_err(|e| EngineError::new(e.to_string()))
}

/// The `ApexTree` constructor, if the library has been loaded.
fn engine_class() -> Option<Function> {
	Reflect::get(&js_sys::global(), &JsValue::from_str(ENGINE_GLOBAL))
		.ok()?
		.dyn_into::<Function>()
		.ok()
}

/// Wrap a compiled template as the one-argument function the engine calls.
fn template_closure(template: Template) -> Closure<dyn Fn(JsValue) -> JsValue> {
	Closure::wrap(Box::new(move |content: JsValue| {
		let content: Value = serde_wasm_bindgen::from_value(content).unwrap_or(Value::Null);
		JsValue::from_str(&template.render(&content))
	}) as Box<dyn Fn(JsValue) -> JsValue>)
}

/// An engine instance plus the template callbacks it may still invoke.
pub struct WebInstance {
	tree: ApexTreeJs,
	_templates: Vec<Closure<dyn Fn(JsValue) -> JsValue>>,
}

/// A rendered graph returned by `ApexTree.render`.
pub struct WebGraph(GraphJs);

impl TreeGraph for WebGraph {
	fn change_layout(&self, direction: TreeDirection) -> Result<(), EngineError> {
		Ok(self.0.change_layout(direction.as_str())?)
	}

	fn expand(&self, node_id: &str) -> Result<(), EngineError> {
		Ok(self.0.expand(node_id)?)
	}

	fn collapse(&self, node_id: &str) -> Result<(), EngineError> {
		Ok(self.0.collapse(node_id)?)
	}

	fn fit_screen(&self) -> Result<(), EngineError> {
		Ok(self.0.fit_screen()?)
	}
}

/// The `ApexTree` library loaded on the page.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebEngine;

impl TreeEngine<Element> for WebEngine {
	type Instance = WebInstance;
	type Graph = WebGraph;

	fn is_loaded(&self) -> bool {
		engine_class().is_some()
	}

	fn create(&self, element: &Element, config: &EffectiveConfig) -> Result<WebInstance, EngineError> {
		let options = to_js(&config.fields)?;
		let mut templates = Vec::new();
		for (field, template) in config.templates() {
			let closure = template_closure(template.clone());
			Reflect::set(&options, &JsValue::from_str(field), closure.as_ref())?;
			templates.push(closure);
		}

		Ok(WebInstance {
			tree: ApexTreeJs::new(element, &options)?,
			_templates: templates,
		})
	}

	fn render(&self, instance: &WebInstance, data: &TreeNode) -> Result<WebGraph, EngineError> {
		let data = to_js(data)?;
		Ok(WebGraph(instance.tree.render(&data)?))
	}

	fn has_license_hook(&self) -> bool {
		license_hook().is_some()
	}

	fn set_license(&self, key: &str) -> Result<(), EngineError> {
		let (class, hook) =
			license_hook().ok_or_else(|| EngineError::new("ApexTree.setLicense not available"))?;
		hook.call1(&class, &JsValue::from_str(key))?;
		Ok(())
	}
}

fn license_hook() -> Option<(Function, Function)> {
	let class = engine_class()?;
	let hook = Reflect::get(&class, &JsValue::from_str("setLicense"))
		.ok()?
		.dyn_into::<Function>()
		.ok()?;
	Some((class, hook))
}

/// A registered event listener; keeps its closure alive until detached.
pub struct WebListener {
	event: NodeEvent,
	closure: Closure<dyn FnMut(Event)>,
}

/// The window's document.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebDom;

impl Dom for WebDom {
	type Element = Element;
	type Listener = WebListener;

	fn element_by_id(&self, id: &str) -> Option<Element> {
		web_sys::window()?.document()?.get_element_by_id(id)
	}

	fn node_elements(&self, container: &Element) -> Vec<Element> {
		let Ok(list) = container.query_selector_all(NODE_SELECTOR) else {
			return Vec::new();
		};
		(0..list.length())
			.filter_map(|i| list.item(i))
			.filter_map(|node| node.dyn_into::<Element>().ok())
			.collect()
	}

	/// Reads `data-node-id`, else the id of the nearest enclosing `<g>`.
	fn resolve_node_id(&self, element: &Element) -> Option<String> {
		if let Some(id) = element
			.get_attribute(NODE_ID_ATTRIBUTE)
			.filter(|id| !id.is_empty())
		{
			return Some(id);
		}

		let mut current = element.parent_element();
		while let Some(ancestor) = current {
			if ancestor.tag_name().eq_ignore_ascii_case("g") && !ancestor.id().is_empty() {
				return Some(ancestor.id());
			}
			current = ancestor.parent_element();
		}
		None
	}

	fn listen(
		&self,
		element: &Element,
		event: NodeEvent,
		handler: Box<dyn Fn()>,
	) -> Result<WebListener, BridgeError> {
		let closure = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
			ev.stop_propagation();
			handler();
		});
		element
			.add_event_listener_with_callback(event.dom_event(), closure.as_ref().unchecked_ref())
			.map_err(|e| BridgeError::Dom(js_message(&e)))?;
		Ok(WebListener { event, closure })
	}

	fn unlisten(&self, element: &Element, listener: WebListener) -> Result<(), BridgeError> {
		element
			.remove_event_listener_with_callback(
				listener.event.dom_event(),
				listener.closure.as_ref().unchecked_ref(),
			)
			.map_err(|e| BridgeError::Dom(js_message(&e)))
	}
}

/// Defers work with `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
	type Handle = Timeout;

	fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Timeout {
		Timeout::new(delay_ms, task)
	}
}

/// Browser flavor of the bridge collaborators.
pub struct WebBackend;

impl Backend for WebBackend {
	type Dom = WebDom;
	type Engine = WebEngine;
	type Scheduler = TimeoutScheduler;
}

/// Bridge over the live document.
pub type WebBridge = Bridge<WebBackend>;

impl Bridge<WebBackend> {
	pub fn for_document() -> Self {
		Bridge::new(WebDom, WebEngine, TimeoutScheduler)
	}
}
