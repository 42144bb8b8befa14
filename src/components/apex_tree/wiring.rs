//! Event wiring between rendered node elements and the host.
//!
//! The engine replaces node elements wholesale whenever it re-renders, so
//! listeners attached to the previous generation stop firing. After every
//! structural change the bridge schedules a pass that detaches all known
//! listeners, rediscovers node elements, and attaches fresh ones.
//!
//! The engine provides no "render complete" signal. Passes are therefore
//! deferred by [`REWIRE_DELAY_MS`] to let the DOM settle, which is a timing
//! assumption rather than a guarantee. Passes are idempotent and a newly
//! scheduled pass supersedes a pending one, so an early or repeated pass is
//! harmless.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, warn};

use super::error::BridgeError;
use super::host::{Backend, Dom, NodeEvent, NodeEventSink, Scheduler};
use super::registry::{EventBinding, Registry};

/// Delay before a scheduled rewiring pass runs, in milliseconds.
pub const REWIRE_DELAY_MS: u32 = 100;

/// Registry shared between the bridge and its deferred passes.
pub(crate) type SharedRegistry<B> = Rc<RefCell<Registry<B>>>;

/// Schedule a rewiring pass for `container_id`, replacing any pending one.
///
/// Does nothing when the container has no record.
pub(crate) fn schedule_rewire<B: Backend>(
	registry: &SharedRegistry<B>,
	dom: &Rc<B::Dom>,
	scheduler: &B::Scheduler,
	container_id: &str,
) {
	if !registry.borrow().contains(container_id) {
		return;
	}

	let (weak, dom, id) = (Rc::downgrade(registry), dom.clone(), container_id.to_string());
	let handle = scheduler.defer(
		REWIRE_DELAY_MS,
		Box::new(move || {
			// The bridge itself may be gone by now.
			if let Some(registry) = weak.upgrade() {
				rewire(&registry, dom.as_ref(), &id);
			}
		}),
	);

	if let Some(record) = registry.borrow_mut().get_mut(container_id) {
		record.pending_rewire = Some(handle);
	}
}

/// Detach stale listeners and attach fresh ones to the current node elements.
///
/// Returns the number of nodes bound. A container destroyed in the meantime
/// is silently skipped.
pub(crate) fn rewire<B: Backend>(registry: &RefCell<Registry<B>>, dom: &B::Dom, container_id: &str) -> usize {
	let Ok(mut registry) = registry.try_borrow_mut() else {
		error!("apex-tree: registry busy, skipping rewire of '{}'", container_id);
		return 0;
	};
	let Some(record) = registry.get_mut(container_id) else {
		debug!("apex-tree: '{}' destroyed before rewire, skipping", container_id);
		return 0;
	};

	record.pending_rewire = None;
	teardown::<B>(dom, &mut record.bindings);

	let Some(sink) = record.sink.clone() else {
		debug!("apex-tree: '{}' has no callback sink, nothing to wire", container_id);
		return 0;
	};
	let Some(container) = dom.element_by_id(container_id) else {
		warn!("apex-tree: element '{}' vanished before rewire", container_id);
		return 0;
	};

	for element in dom.node_elements(&container) {
		let Some(node_id) = dom.resolve_node_id(&element) else {
			debug!("apex-tree: skipping node element without an id in '{}'", container_id);
			continue;
		};
		match attach::<B>(dom, element, node_id, &sink) {
			Ok(binding) => record.bindings.push(binding),
			Err(e) => warn!("apex-tree: failed to wire node in '{}': {}", container_id, e),
		}
	}

	debug!(
		"apex-tree: wired {} nodes in '{}'",
		record.bindings.len(),
		container_id
	);
	record.bindings.len()
}

/// Detach every binding and clear the list. Returns how many were removed.
pub(crate) fn teardown<B: Backend>(dom: &B::Dom, bindings: &mut Vec<EventBinding<B>>) -> usize {
	let count = bindings.len();
	for EventBinding {
		element,
		node_id,
		click,
		hover,
	} in bindings.drain(..)
	{
		for listener in [click, hover] {
			if let Err(e) = dom.unlisten(&element, listener) {
				warn!("apex-tree: failed to detach listener from '{}': {}", node_id, e);
			}
		}
	}
	count
}

fn attach<B: Backend>(
	dom: &B::Dom,
	element: <B::Dom as Dom>::Element,
	node_id: String,
	sink: &Weak<dyn NodeEventSink>,
) -> Result<EventBinding<B>, BridgeError> {
	let click = dom.listen(&element, NodeEvent::Click, forward(sink, &node_id, NodeEvent::Click))?;
	let hover = match dom.listen(&element, NodeEvent::Hover, forward(sink, &node_id, NodeEvent::Hover)) {
		Ok(hover) => hover,
		Err(e) => {
			let _ = dom.unlisten(&element, click);
			return Err(e);
		}
	};

	Ok(EventBinding {
		element,
		node_id,
		click,
		hover,
	})
}

/// Handler delivering `event` for `node_id`; a no-op once the sink is gone.
fn forward(sink: &Weak<dyn NodeEventSink>, node_id: &str, event: NodeEvent) -> Box<dyn Fn()> {
	let (sink, node_id) = (sink.clone(), node_id.to_string());
	Box::new(move || {
		let Some(sink) = sink.upgrade() else {
			debug!("apex-tree: sink dropped, ignoring {} for '{}'", event, node_id);
			return;
		};
		if let Err(e) = event.deliver(sink.as_ref(), &node_id) {
			error!("apex-tree: error delivering {} for '{}': {}", event, node_id, e);
		}
	})
}
