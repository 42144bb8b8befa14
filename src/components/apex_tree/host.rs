//! Collaborators the bridge drives: the DOM, the tree engine, a timer, and
//! the host's callback sink.
//!
//! The browser implementations live in [`super::web`]. Keeping them behind
//! traits lets the lifecycle logic run natively under test.

use std::fmt;

use super::error::{BridgeError, EngineError, SinkError};
use super::options::EffectiveConfig;
use super::types::{TreeDirection, TreeNode};

/// Receives node interactions on behalf of the host component.
///
/// The bridge only ever holds a `Weak` reference to a sink. Structural
/// notifications fire after the engine accepted the change.
pub trait NodeEventSink {
	fn node_clicked(&self, node_id: &str) -> Result<(), SinkError>;
	fn node_hovered(&self, node_id: &str) -> Result<(), SinkError>;

	fn node_expanded(&self, _node_id: &str) -> Result<(), SinkError> {
		Ok(())
	}

	fn node_collapsed(&self, _node_id: &str) -> Result<(), SinkError> {
		Ok(())
	}

	fn layout_changed(&self, _direction: TreeDirection) -> Result<(), SinkError> {
		Ok(())
	}
}

/// Interactions forwarded from rendered nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeEvent {
	Click,
	Hover,
}

impl NodeEvent {
	/// DOM event type the listener is registered for.
	pub fn dom_event(self) -> &'static str {
		match self {
			Self::Click => "click",
			Self::Hover => "mouseenter",
		}
	}

	pub(crate) fn deliver(self, sink: &dyn NodeEventSink, node_id: &str) -> Result<(), SinkError> {
		match self {
			Self::Click => sink.node_clicked(node_id),
			Self::Hover => sink.node_hovered(node_id),
		}
	}
}

impl fmt::Display for NodeEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Click => "node clicked",
			Self::Hover => "node hovered",
		})
	}
}

/// Element lookup, node discovery, and listener management.
pub trait Dom: 'static {
	type Element: Clone + 'static;
	type Listener: 'static;

	fn element_by_id(&self, id: &str) -> Option<Self::Element>;

	/// Interactive node elements currently rendered inside `container`.
	fn node_elements(&self, container: &Self::Element) -> Vec<Self::Element>;

	/// Tree node id an element renders, if it can be determined.
	fn resolve_node_id(&self, element: &Self::Element) -> Option<String>;

	fn listen(
		&self,
		element: &Self::Element,
		event: NodeEvent,
		handler: Box<dyn Fn()>,
	) -> Result<Self::Listener, BridgeError>;

	fn unlisten(&self, element: &Self::Element, listener: Self::Listener) -> Result<(), BridgeError>;
}

/// The wrapped tree rendering engine, mounted on elements of type `E`.
pub trait TreeEngine<E>: 'static {
	type Instance: 'static;
	type Graph: TreeGraph + 'static;

	/// Whether the engine library is available at all.
	fn is_loaded(&self) -> bool;

	fn create(&self, element: &E, config: &EffectiveConfig) -> Result<Self::Instance, EngineError>;

	fn render(&self, instance: &Self::Instance, data: &TreeNode) -> Result<Self::Graph, EngineError>;

	fn has_license_hook(&self) -> bool;

	fn set_license(&self, key: &str) -> Result<(), EngineError>;
}

/// Mutators on a rendered graph.
pub trait TreeGraph {
	fn change_layout(&self, direction: TreeDirection) -> Result<(), EngineError>;
	fn expand(&self, node_id: &str) -> Result<(), EngineError>;
	fn collapse(&self, node_id: &str) -> Result<(), EngineError>;
	fn fit_screen(&self) -> Result<(), EngineError>;
}

/// One-shot deferred execution. Dropping the handle cancels the task.
pub trait Scheduler: 'static {
	type Handle: 'static;

	fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Ties together the collaborators of one bridge flavor.
pub trait Backend: 'static {
	type Dom: Dom;
	type Engine: TreeEngine<<Self::Dom as Dom>::Element>;
	type Scheduler: Scheduler;
}

/// Element type of a backend's DOM.
pub type ElementOf<B> = <<B as Backend>::Dom as Dom>::Element;
/// Listener type of a backend's DOM.
pub type ListenerOf<B> = <<B as Backend>::Dom as Dom>::Listener;
/// Engine instance type of a backend.
pub type InstanceOf<B> = <<B as Backend>::Engine as TreeEngine<ElementOf<B>>>::Instance;
/// Rendered graph type of a backend.
pub type GraphOf<B> = <<B as Backend>::Engine as TreeEngine<ElementOf<B>>>::Graph;
/// Pending task handle type of a backend.
pub type HandleOf<B> = <<B as Backend>::Scheduler as Scheduler>::Handle;
