//! Leptos component hosting an ApexTree instance.
//!
//! The component mounts a container `<div>`, initializes the bridge for it
//! once mounted, re-renders whenever the tree data or options change, and
//! destroys the instance on cleanup. Node clicks and hovers, as well as
//! expand, collapse and layout changes, surface as Leptos callbacks.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;

use super::error::SinkError;
use super::host::NodeEventSink;
use super::template::TemplateLibrary;
use super::types::{TreeDirection, TreeNode, TreeOptions};
use super::web::WebBridge;

/// Forwards bridge notifications into the component's callbacks.
struct CallbackSink {
	on_click: Option<Callback<String>>,
	on_hover: Option<Callback<String>>,
	on_expand: Option<Callback<String>>,
	on_collapse: Option<Callback<String>>,
	on_layout_change: Option<Callback<TreeDirection>>,
	layout: Rc<LayoutState>,
}

/// What the mounted engine shows, as far as the component knows.
#[derive(Debug, Default)]
struct LayoutState {
	initialized: Cell<bool>,
	/// Direction the engine currently shows, once rendered.
	applied: Cell<Option<TreeDirection>>,
}

impl LayoutState {
	/// Until the first render lands, direction changes must re-run the render.
	fn awaiting_first_render(&self) -> bool {
		!self.initialized.get()
	}

	/// Record a successful render. Returns `true` for the first one.
	fn rendered(&self, direction: TreeDirection) -> bool {
		self.applied.set(Some(direction));
		!self.initialized.replace(true)
	}

	fn layout_changed(&self, direction: TreeDirection) {
		self.applied.set(Some(direction));
	}

	/// Whether `direction` has to be pushed to the engine as a layout change.
	fn needs_layout_change(&self, direction: TreeDirection) -> bool {
		self.initialized.get() && self.applied.get() != Some(direction)
	}
}

fn deliver<T: 'static>(callback: Option<Callback<T>>, value: T) -> Result<(), SinkError> {
	match callback {
		Some(cb) => cb.try_run(value).ok_or(SinkError::Disposed),
		None => Ok(()),
	}
}

impl NodeEventSink for CallbackSink {
	fn node_clicked(&self, node_id: &str) -> Result<(), SinkError> {
		deliver(self.on_click, node_id.to_string())
	}

	fn node_hovered(&self, node_id: &str) -> Result<(), SinkError> {
		deliver(self.on_hover, node_id.to_string())
	}

	fn node_expanded(&self, node_id: &str) -> Result<(), SinkError> {
		deliver(self.on_expand, node_id.to_string())
	}

	fn node_collapsed(&self, node_id: &str) -> Result<(), SinkError> {
		deliver(self.on_collapse, node_id.to_string())
	}

	fn layout_changed(&self, direction: TreeDirection) -> Result<(), SinkError> {
		self.layout.layout_changed(direction);
		deliver(self.on_layout_change, direction)
	}
}

/// Imperative access to a mounted tree, handed out through `on_ready`.
///
/// All methods return `false` once the component has been unmounted. On
/// success the matching `on_layout_change`, `on_node_expand` or
/// `on_node_collapse` callback fires.
#[derive(Clone)]
pub struct TreeHandle {
	bridge: StoredValue<WebBridge, LocalStorage>,
	container_id: Arc<str>,
}

impl TreeHandle {
	pub fn container_id(&self) -> &str {
		&self.container_id
	}

	pub fn change_layout(&self, direction: TreeDirection) -> bool {
		self.with_bridge(|b, id| b.change_layout(id, direction))
	}

	pub fn expand(&self, node_id: &str) -> bool {
		self.with_bridge(|b, id| b.expand(id, node_id))
	}

	pub fn collapse(&self, node_id: &str) -> bool {
		self.with_bridge(|b, id| b.collapse(id, node_id))
	}

	pub fn fit_to_view(&self) -> bool {
		self.with_bridge(|b, id| b.fit_to_view(id))
	}

	fn with_bridge(&self, f: impl FnOnce(&WebBridge, &str) -> bool) -> bool {
		self.bridge
			.try_with_value(|b| f(b, &self.container_id))
			.unwrap_or(false)
	}
}

/// Renders a hierarchical tree with the ApexTree engine.
///
/// `id` names the container element and must be unique in the document. A
/// `direction` signal, when given, overrides `options.direction` and drives
/// layout changes without re-rendering; a change made before the first
/// successful render is picked up by that render. Template fields in `options` may
/// reference callbacks from `templates` as `@name`.
#[component]
pub fn ApexTree(
	#[prop(into)] id: String,
	#[prop(into)] data: Signal<TreeNode>,
	#[prop(into)] options: Signal<TreeOptions>,
	#[prop(optional, into)] direction: Option<Signal<TreeDirection>>,
	#[prop(optional)] templates: Option<TemplateLibrary>,
	#[prop(optional, into)] license_key: Option<String>,
	#[prop(optional, into)] on_node_click: Option<Callback<String>>,
	#[prop(optional, into)] on_node_hover: Option<Callback<String>>,
	#[prop(optional, into)] on_node_expand: Option<Callback<String>>,
	#[prop(optional, into)] on_node_collapse: Option<Callback<String>>,
	#[prop(optional, into)] on_ready: Option<Callback<TreeHandle>>,
	#[prop(optional, into)] on_layout_change: Option<Callback<TreeDirection>>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let container_id: Arc<str> = Arc::from(id.as_str());

	let mut bridge = WebBridge::for_document();
	if let Some(templates) = templates {
		bridge = bridge.with_templates(templates);
	}
	if let Some(key) = license_key.as_deref() {
		bridge.set_license_key(key);
	}
	let bridge = StoredValue::new_local(bridge);

	let layout = Rc::new(LayoutState::default());

	// The component owns the sink; the bridge only holds a weak reference.
	let sink: Rc<dyn NodeEventSink> = Rc::new(CallbackSink {
		on_click: on_node_click,
		on_hover: on_node_hover,
		on_expand: on_node_expand,
		on_collapse: on_node_collapse,
		on_layout_change,
		layout: layout.clone(),
	});

	let render_id = container_id.clone();
	let render_layout = layout.clone();
	Effect::new(move |_| {
		if container_ref.get().is_none() {
			return;
		}
		let tree = data.get();
		let mut options = options.get();
		let first = render_layout.awaiting_first_render();
		if let Some(direction) = direction {
			// Tracked until the first render lands, so an early change retries it.
			options.direction = if first {
				direction.get()
			} else {
				direction.get_untracked()
			};
		}
		let config = options.to_configuration();

		let rendered = bridge
			.try_with_value(|b| {
				if first && !b.initialize(&render_id, Rc::downgrade(&sink)) {
					return false;
				}
				b.render(&render_id, &tree, &config)
			})
			.unwrap_or(false);
		if rendered && render_layout.rendered(options.direction) {
			if let Some(on_ready) = on_ready {
				on_ready.run(TreeHandle {
					bridge,
					container_id: render_id.clone(),
				});
			}
		}
	});

	if let Some(direction) = direction {
		let layout_id = container_id.clone();
		Effect::new(move |_| {
			let current = direction.get();
			if layout.needs_layout_change(current) {
				bridge.try_with_value(|b| b.change_layout(&layout_id, current));
			}
		});
	}

	let cleanup_id = container_id.clone();
	on_cleanup(move || {
		bridge.try_with_value(|b| b.destroy(&cleanup_id));
	});

	view! {
		<div
			node_ref=container_ref
			id=id
			class="apex-tree-container"
			style="width: 100%; height: 100%;"
		/>
	}
}
