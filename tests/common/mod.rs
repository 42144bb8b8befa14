//! In-memory stand-ins for the DOM, the tree engine and timers.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use apex_tree_bridge::components::apex_tree::{
	Backend, BridgeError, Dom, EffectiveConfig, EngineError, NodeEvent, NodeEventSink, Scheduler,
	SinkError, TreeDirection, TreeEngine, TreeGraph, TreeNode,
};

/// A DOM element with identity semantics.
#[derive(Clone)]
pub struct FakeElement(Rc<ElementData>);

pub struct ElementData {
	pub id: String,
	/// Node id the element renders, `None` for decorations the engine adds.
	pub node_id: Option<String>,
	listeners: RefCell<Vec<(u64, NodeEvent, Rc<dyn Fn()>)>>,
}

impl FakeElement {
	fn new(id: &str, node_id: Option<&str>) -> Self {
		Self(Rc::new(ElementData {
			id: id.to_string(),
			node_id: node_id.map(str::to_string),
			listeners: RefCell::new(Vec::new()),
		}))
	}

	pub fn node_id(&self) -> Option<&str> {
		self.0.node_id.as_deref()
	}

	pub fn listener_count(&self) -> usize {
		self.0.listeners.borrow().len()
	}

	pub fn same(&self, other: &FakeElement) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Fire `event` like the browser would.
	pub fn dispatch(&self, event: NodeEvent) -> usize {
		let handlers: Vec<_> = self
			.0
			.listeners
			.borrow()
			.iter()
			.filter(|(_, e, _)| *e == event)
			.map(|(_, _, h)| h.clone())
			.collect();
		for handler in &handlers {
			handler();
		}
		handlers.len()
	}
}

pub struct FakeListener {
	id: u64,
}

#[derive(Default)]
struct DomState {
	containers: RefCell<HashMap<String, FakeElement>>,
	nodes: RefCell<HashMap<String, Vec<FakeElement>>>,
	next_listener: Cell<u64>,
	attached: Cell<usize>,
	detached: Cell<usize>,
	fail_listen: Cell<bool>,
}

/// Shared handle to a fake document.
#[derive(Clone, Default)]
pub struct FakeDom(Rc<DomState>);

impl FakeDom {
	pub fn with_container(id: &str) -> Self {
		let dom = Self::default();
		dom.add_container(id);
		dom
	}

	pub fn add_container(&self, id: &str) {
		self.0
			.containers
			.borrow_mut()
			.insert(id.to_string(), FakeElement::new(id, None));
	}

	pub fn remove_container(&self, id: &str) {
		self.0.containers.borrow_mut().remove(id);
	}

	/// Replace the node elements of a container with fresh ones.
	pub fn replace_nodes(&self, container_id: &str, node_ids: &[Option<&str>]) {
		let elements = node_ids
			.iter()
			.enumerate()
			.map(|(i, node_id)| FakeElement::new(&format!("{container_id}-{i}"), *node_id))
			.collect();
		self.0
			.nodes
			.borrow_mut()
			.insert(container_id.to_string(), elements);
	}

	pub fn nodes(&self, container_id: &str) -> Vec<FakeElement> {
		self.0
			.nodes
			.borrow()
			.get(container_id)
			.cloned()
			.unwrap_or_default()
	}

	pub fn node(&self, container_id: &str, node_id: &str) -> Option<FakeElement> {
		self.nodes(container_id)
			.into_iter()
			.find(|e| e.node_id() == Some(node_id))
	}

	pub fn click(&self, container_id: &str, node_id: &str) -> usize {
		self.node(container_id, node_id)
			.map(|e| e.dispatch(NodeEvent::Click))
			.unwrap_or(0)
	}

	pub fn hover(&self, container_id: &str, node_id: &str) -> usize {
		self.node(container_id, node_id)
			.map(|e| e.dispatch(NodeEvent::Hover))
			.unwrap_or(0)
	}

	/// Listeners attached and not yet detached, across every element ever created.
	pub fn live_listeners(&self) -> usize {
		self.0.attached.get() - self.0.detached.get()
	}

	pub fn attached(&self) -> usize {
		self.0.attached.get()
	}

	pub fn detached(&self) -> usize {
		self.0.detached.get()
	}

	pub fn fail_listen(&self, fail: bool) {
		self.0.fail_listen.set(fail);
	}
}

impl Dom for FakeDom {
	type Element = FakeElement;
	type Listener = FakeListener;

	fn element_by_id(&self, id: &str) -> Option<FakeElement> {
		self.0.containers.borrow().get(id).cloned()
	}

	fn node_elements(&self, container: &FakeElement) -> Vec<FakeElement> {
		self.nodes(&container.0.id)
	}

	fn resolve_node_id(&self, element: &FakeElement) -> Option<String> {
		element.0.node_id.clone()
	}

	fn listen(
		&self,
		element: &FakeElement,
		event: NodeEvent,
		handler: Box<dyn Fn()>,
	) -> Result<FakeListener, BridgeError> {
		if self.0.fail_listen.get() {
			return Err(BridgeError::Dom("listen refused".into()));
		}
		let id = self.0.next_listener.get() + 1;
		self.0.next_listener.set(id);
		element
			.0
			.listeners
			.borrow_mut()
			.push((id, event, Rc::from(handler)));
		self.0.attached.set(self.0.attached.get() + 1);
		Ok(FakeListener { id })
	}

	fn unlisten(&self, element: &FakeElement, listener: FakeListener) -> Result<(), BridgeError> {
		let mut listeners = element.0.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|(id, _, _)| *id != listener.id);
		if listeners.len() == before {
			return Err(BridgeError::Dom("listener not attached".into()));
		}
		self.0.detached.set(self.0.detached.get() + 1);
		Ok(())
	}
}

/// Calls made against the fake engine, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
	Create { container: String },
	Render { root: String },
	ChangeLayout(TreeDirection),
	Expand(String),
	Collapse(String),
	FitScreen,
	SetLicense(String),
}

#[derive(Default)]
struct EngineState {
	loaded: Cell<bool>,
	license_hook: Cell<bool>,
	fail_render: Cell<bool>,
	fail_graph: Cell<bool>,
	calls: RefCell<Vec<EngineCall>>,
	last_config: RefCell<Option<EffectiveConfig>>,
	on_mutation: RefCell<Option<Rc<dyn Fn()>>>,
}

/// A tree engine that "draws" one element per node into the fake DOM.
#[derive(Clone)]
pub struct FakeEngine {
	dom: FakeDom,
	state: Rc<EngineState>,
}

impl FakeEngine {
	pub fn new(dom: &FakeDom) -> Self {
		let state = EngineState::default();
		state.loaded.set(true);
		state.license_hook.set(true);
		Self {
			dom: dom.clone(),
			state: Rc::new(state),
		}
	}

	pub fn unloaded(dom: &FakeDom) -> Self {
		let engine = Self::new(dom);
		engine.state.loaded.set(false);
		engine
	}

	pub fn without_license_hook(self) -> Self {
		self.state.license_hook.set(false);
		self
	}

	pub fn fail_render(&self, fail: bool) {
		self.state.fail_render.set(fail);
	}

	pub fn fail_graph(&self, fail: bool) {
		self.state.fail_graph.set(fail);
	}

	/// Run `hook` inside every graph mutation, while the engine call is in flight.
	pub fn on_mutation(&self, hook: impl Fn() + 'static) {
		*self.state.on_mutation.borrow_mut() = Some(Rc::new(hook));
	}

	pub fn calls(&self) -> Vec<EngineCall> {
		self.state.calls.borrow().clone()
	}

	pub fn last_config(&self) -> Option<EffectiveConfig> {
		self.state.last_config.borrow().clone()
	}

	fn record(&self, call: EngineCall) {
		self.state.calls.borrow_mut().push(call);
	}
}

pub struct FakeInstance {
	container: String,
}

/// Rendered graph; every mutation redraws all node elements.
pub struct FakeGraph {
	engine: FakeEngine,
	container: String,
	node_ids: Vec<String>,
}

impl FakeGraph {
	fn mutate(&self, call: EngineCall) -> Result<(), EngineError> {
		if self.engine.state.fail_graph.get() {
			return Err(EngineError::new("graph exploded"));
		}
		self.engine.record(call);
		self.redraw();
		let hook = self.engine.state.on_mutation.borrow().clone();
		if let Some(hook) = hook {
			hook();
		}
		Ok(())
	}

	fn redraw(&self) {
		let ids: Vec<Option<&str>> = self.node_ids.iter().map(|id| Some(id.as_str())).collect();
		self.engine.dom.replace_nodes(&self.container, &ids);
	}
}

impl TreeGraph for FakeGraph {
	fn change_layout(&self, direction: TreeDirection) -> Result<(), EngineError> {
		self.mutate(EngineCall::ChangeLayout(direction))
	}

	fn expand(&self, node_id: &str) -> Result<(), EngineError> {
		self.mutate(EngineCall::Expand(node_id.to_string()))
	}

	fn collapse(&self, node_id: &str) -> Result<(), EngineError> {
		self.mutate(EngineCall::Collapse(node_id.to_string()))
	}

	fn fit_screen(&self) -> Result<(), EngineError> {
		if self.engine.state.fail_graph.get() {
			return Err(EngineError::new("graph exploded"));
		}
		self.engine.record(EngineCall::FitScreen);
		Ok(())
	}
}

impl TreeEngine<FakeElement> for FakeEngine {
	type Instance = FakeInstance;
	type Graph = FakeGraph;

	fn is_loaded(&self) -> bool {
		self.state.loaded.get()
	}

	fn create(&self, element: &FakeElement, config: &EffectiveConfig) -> Result<FakeInstance, EngineError> {
		self.record(EngineCall::Create {
			container: element.0.id.clone(),
		});
		*self.state.last_config.borrow_mut() = Some(config.clone());
		Ok(FakeInstance {
			container: element.0.id.clone(),
		})
	}

	fn render(&self, instance: &FakeInstance, data: &TreeNode) -> Result<FakeGraph, EngineError> {
		if self.state.fail_render.get() {
			return Err(EngineError::new("render exploded"));
		}
		self.record(EngineCall::Render {
			root: data.id.clone(),
		});
		let graph = FakeGraph {
			engine: self.clone(),
			container: instance.container.clone(),
			node_ids: data.ids().into_iter().map(str::to_string).collect(),
		};
		graph.redraw();
		Ok(graph)
	}

	fn has_license_hook(&self) -> bool {
		self.state.license_hook.get()
	}

	fn set_license(&self, key: &str) -> Result<(), EngineError> {
		self.record(EngineCall::SetLicense(key.to_string()));
		Ok(())
	}
}

struct Task {
	delay_ms: u32,
	cancelled: Rc<Cell<bool>>,
	run: Box<dyn FnOnce()>,
}

/// Scheduler whose tasks run only when the test says so.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	tasks: Rc<RefCell<Vec<Task>>>,
}

/// Cancels its task when dropped.
pub struct TaskHandle {
	cancelled: Rc<Cell<bool>>,
}

impl Drop for TaskHandle {
	fn drop(&mut self) {
		self.cancelled.set(true);
	}
}

impl ManualScheduler {
	/// Tasks scheduled and not cancelled.
	pub fn pending(&self) -> usize {
		self.tasks
			.borrow()
			.iter()
			.filter(|t| !t.cancelled.get())
			.count()
	}

	pub fn delays(&self) -> Vec<u32> {
		self.tasks.borrow().iter().map(|t| t.delay_ms).collect()
	}

	/// Let the timers elapse. Returns how many tasks ran.
	pub fn run_pending(&self) -> usize {
		let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
		let mut ran = 0;
		for task in tasks {
			if !task.cancelled.get() {
				(task.run)();
				ran += 1;
			}
		}
		ran
	}

	/// Run every task, including cancelled ones, like a timer that could
	/// not be cleared in time.
	pub fn run_all(&self) -> usize {
		let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
		let count = tasks.len();
		for task in tasks {
			(task.run)();
		}
		count
	}
}

impl Scheduler for ManualScheduler {
	type Handle = TaskHandle;

	fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TaskHandle {
		let cancelled = Rc::new(Cell::new(false));
		self.tasks.borrow_mut().push(Task {
			delay_ms,
			cancelled: cancelled.clone(),
			run: task,
		});
		TaskHandle { cancelled }
	}
}

pub struct FakeBackend;

impl Backend for FakeBackend {
	type Dom = FakeDom;
	type Engine = FakeEngine;
	type Scheduler = ManualScheduler;
}

/// Host sink recording every delivered event.
#[derive(Default)]
pub struct RecordingSink {
	pub clicks: RefCell<Vec<String>>,
	pub hovers: RefCell<Vec<String>>,
	pub expanded: RefCell<Vec<String>>,
	pub collapsed: RefCell<Vec<String>>,
	pub layouts: RefCell<Vec<TreeDirection>>,
	pub reject_clicks: Cell<bool>,
}

impl NodeEventSink for RecordingSink {
	fn node_clicked(&self, node_id: &str) -> Result<(), SinkError> {
		if self.reject_clicks.get() {
			return Err(SinkError::Rejected("click handler failed".into()));
		}
		self.clicks.borrow_mut().push(node_id.to_string());
		Ok(())
	}

	fn node_hovered(&self, node_id: &str) -> Result<(), SinkError> {
		self.hovers.borrow_mut().push(node_id.to_string());
		Ok(())
	}

	fn node_expanded(&self, node_id: &str) -> Result<(), SinkError> {
		self.expanded.borrow_mut().push(node_id.to_string());
		Ok(())
	}

	fn node_collapsed(&self, node_id: &str) -> Result<(), SinkError> {
		self.collapsed.borrow_mut().push(node_id.to_string());
		Ok(())
	}

	fn layout_changed(&self, direction: TreeDirection) -> Result<(), SinkError> {
		self.layouts.borrow_mut().push(direction);
		Ok(())
	}
}
