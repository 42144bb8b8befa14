//! Per-container bookkeeping for live tree instances.

use std::collections::HashMap;
use std::rc::Weak;

use super::host::{Backend, ElementOf, GraphOf, HandleOf, InstanceOf, ListenerOf, NodeEventSink};

/// Listeners attached to one rendered node element.
pub(crate) struct EventBinding<B: Backend> {
	pub(crate) element: ElementOf<B>,
	pub(crate) node_id: String,
	pub(crate) click: ListenerOf<B>,
	pub(crate) hover: ListenerOf<B>,
}

/// Bridge-owned state for one container.
///
/// `graph` is only set once a render has succeeded since the record was
/// (re)initialized.
pub(crate) struct InstanceRecord<B: Backend> {
	pub(crate) instance: Option<InstanceOf<B>>,
	pub(crate) graph: Option<GraphOf<B>>,
	pub(crate) sink: Option<Weak<dyn NodeEventSink>>,
	pub(crate) bindings: Vec<EventBinding<B>>,
	/// At most one rewiring pass may be pending; replacing it cancels the old one.
	pub(crate) pending_rewire: Option<HandleOf<B>>,
}

impl<B: Backend> Default for InstanceRecord<B> {
	fn default() -> Self {
		Self {
			instance: None,
			graph: None,
			sink: None,
			bindings: Vec::new(),
			pending_rewire: None,
		}
	}
}

impl<B: Backend> InstanceRecord<B> {
	pub(crate) fn is_rendered(&self) -> bool {
		self.graph.is_some()
	}

	pub(crate) fn bound_node_ids(&self) -> Vec<String> {
		self.bindings.iter().map(|b| b.node_id.clone()).collect()
	}

	/// Forget engine state and pending work, keeping only `sink`.
	///
	/// Bindings must already have been torn down.
	pub(crate) fn reset(&mut self, sink: Weak<dyn NodeEventSink>) {
		debug_assert!(self.bindings.is_empty());
		*self = Self {
			sink: Some(sink),
			..Self::default()
		};
	}
}

/// Live instances keyed by container id.
pub(crate) struct Registry<B: Backend> {
	records: HashMap<String, InstanceRecord<B>>,
}

impl<B: Backend> Default for Registry<B> {
	fn default() -> Self {
		Self {
			records: HashMap::new(),
		}
	}
}

impl<B: Backend> Registry<B> {
	pub(crate) fn get(&self, container_id: &str) -> Option<&InstanceRecord<B>> {
		self.records.get(container_id)
	}

	pub(crate) fn get_mut(&mut self, container_id: &str) -> Option<&mut InstanceRecord<B>> {
		self.records.get_mut(container_id)
	}

	/// Apply `merge` to the record for `container_id`, creating it first if needed.
	pub(crate) fn upsert(
		&mut self,
		container_id: &str,
		merge: impl FnOnce(&mut InstanceRecord<B>),
	) -> &mut InstanceRecord<B> {
		let record = self.records.entry(container_id.to_string()).or_default();
		merge(record);
		record
	}

	pub(crate) fn remove(&mut self, container_id: &str) -> Option<InstanceRecord<B>> {
		self.records.remove(container_id)
	}

	pub(crate) fn contains(&self, container_id: &str) -> bool {
		self.records.contains_key(container_id)
	}
}
