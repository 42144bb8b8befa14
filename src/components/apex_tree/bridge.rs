//! Lifecycle controller for hosted tree instances.
//!
//! Every operation reports success as a `bool` and logs the reason for a
//! failure; nothing propagates to the host. Commands for one container must be
//! issued in order by the host (e.g. no `expand` before `render` returned),
//! the bridge does not queue them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};

use super::error::{BridgeError, EngineError, SinkError};
use super::host::{Backend, Dom, GraphOf, NodeEventSink, TreeEngine, TreeGraph};
use super::options;
use super::registry::Registry;
use super::template::TemplateLibrary;
use super::types::{TreeConfiguration, TreeDirection, TreeNode};
use super::wiring::{self, SharedRegistry};

/// Drives tree instances mounted in containers of one document.
pub struct Bridge<B: Backend> {
	registry: SharedRegistry<B>,
	dom: Rc<B::Dom>,
	engine: B::Engine,
	scheduler: B::Scheduler,
	templates: TemplateLibrary,
}

impl<B: Backend> Bridge<B> {
	pub fn new(dom: B::Dom, engine: B::Engine, scheduler: B::Scheduler) -> Self {
		Self {
			registry: Rc::new(RefCell::new(Registry::default())),
			dom: Rc::new(dom),
			engine,
			scheduler,
			templates: TemplateLibrary::default(),
		}
	}

	/// Callbacks that `@name` templates resolve against.
	pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
		self.templates = templates;
		self
	}

	/// Register the host sink for `container_id`, resetting any previous state.
	///
	/// Fails if the container element does not exist.
	pub fn initialize(&self, container_id: &str, sink: Weak<dyn NodeEventSink>) -> bool {
		if self.dom.element_by_id(container_id).is_none() {
			error!("apex-tree: element with id '{}' not found", container_id);
			return false;
		}
		let Ok(mut registry) = self.registry.try_borrow_mut() else {
			error!("apex-tree: registry busy, cannot initialize '{}'", container_id);
			return false;
		};

		let record = registry.upsert(container_id, |_| {});
		wiring::teardown::<B>(&self.dom, &mut record.bindings);
		record.reset(sink);
		info!("apex-tree: initialized '{}'", container_id);
		true
	}

	/// Mount a fresh engine instance in the container and render `tree`.
	pub fn render(&self, container_id: &str, tree: &TreeNode, config: &TreeConfiguration) -> bool {
		match self.try_render(container_id, tree, config) {
			Ok(()) => {
				info!(
					"apex-tree: rendered {} nodes in '{}'",
					tree.ids().len(),
					container_id
				);
				true
			}
			Err(e) => {
				error!("apex-tree: error rendering '{}': {}", container_id, e);
				false
			}
		}
	}

	fn try_render(
		&self,
		container_id: &str,
		tree: &TreeNode,
		config: &TreeConfiguration,
	) -> Result<(), BridgeError> {
		if !self.engine.is_loaded() {
			return Err(BridgeError::EngineNotLoaded);
		}
		let element = self
			.dom
			.element_by_id(container_id)
			.ok_or_else(|| BridgeError::ElementNotFound(container_id.to_string()))?;

		let effective = options::translate(config, &self.templates);
		let instance = self.engine.create(&element, &effective)?;
		let graph = self.engine.render(&instance, tree)?;

		self.registry
			.try_borrow_mut()
			.map_err(|_| BridgeError::RegistryBusy)?
			.upsert(container_id, |record| {
				record.instance = Some(instance);
				record.graph = Some(graph);
			});
		self.schedule_rewire(container_id);
		Ok(())
	}

	/// Forward a license key to the engine's static license hook.
	pub fn set_license_key(&self, key: &str) -> bool {
		let result = if key.trim().is_empty() {
			Err(BridgeError::InvalidLicenseKey)
		} else if !self.engine.is_loaded() || !self.engine.has_license_hook() {
			Err(BridgeError::LicenseHookUnavailable)
		} else {
			self.engine.set_license(key).map_err(BridgeError::from)
		};

		match result {
			Ok(()) => {
				info!("apex-tree: license key applied");
				true
			}
			Err(e @ BridgeError::LicenseHookUnavailable) => {
				warn!("apex-tree: {}", e);
				false
			}
			Err(e) => {
				error!("apex-tree: error setting license: {}", e);
				false
			}
		}
	}

	pub fn change_layout(&self, container_id: &str, direction: TreeDirection) -> bool {
		self.mutate(
			container_id,
			"changing layout",
			|graph| graph.change_layout(direction),
			|sink| sink.layout_changed(direction),
		)
	}

	pub fn expand(&self, container_id: &str, node_id: &str) -> bool {
		self.mutate(
			container_id,
			"expanding node",
			|graph| graph.expand(node_id),
			|sink| sink.node_expanded(node_id),
		)
	}

	pub fn collapse(&self, container_id: &str, node_id: &str) -> bool {
		self.mutate(
			container_id,
			"collapsing node",
			|graph| graph.collapse(node_id),
			|sink| sink.node_collapsed(node_id),
		)
	}

	/// Fit the rendered tree into the viewport. Node elements are unaffected,
	/// so no rewiring is scheduled.
	pub fn fit_to_view(&self, container_id: &str) -> bool {
		match self.with_graph(container_id, |graph| graph.fit_screen()) {
			Ok(()) => true,
			Err(e) => {
				error!("apex-tree: error fitting '{}' to screen: {}", container_id, e);
				false
			}
		}
	}

	/// Release listeners and forget the container. Best effort: always
	/// reports success.
	pub fn destroy(&self, container_id: &str) -> bool {
		let Ok(mut registry) = self.registry.try_borrow_mut() else {
			error!("apex-tree: registry busy, cannot destroy '{}'", container_id);
			return true;
		};
		let Some(record) = registry.get_mut(container_id) else {
			debug!("apex-tree: nothing to destroy for '{}'", container_id);
			return true;
		};

		record.pending_rewire = None;
		let released = wiring::teardown::<B>(&self.dom, &mut record.bindings);
		let record = registry.remove(container_id);
		drop(registry);
		drop(record);

		info!(
			"apex-tree: destroyed '{}' ({} bindings released)",
			container_id, released
		);
		true
	}

	/// Run a rewiring pass immediately, superseding any pending one.
	///
	/// Returns the number of nodes bound.
	pub fn rewire(&self, container_id: &str) -> usize {
		wiring::rewire(&self.registry, self.dom.as_ref(), container_id)
	}

	/// Whether `container_id` has a live record.
	pub fn is_live(&self, container_id: &str) -> bool {
		self.registry.borrow().contains(container_id)
	}

	/// Whether `container_id` holds a rendered graph.
	pub fn is_rendered(&self, container_id: &str) -> bool {
		self.registry
			.borrow()
			.get(container_id)
			.is_some_and(|record| record.is_rendered())
	}

	/// Node ids currently bound to listeners, in discovery order.
	pub fn bound_node_ids(&self, container_id: &str) -> Vec<String> {
		self.registry
			.borrow()
			.get(container_id)
			.map(|record| record.bound_node_ids())
			.unwrap_or_default()
	}

	pub fn has_pending_rewire(&self, container_id: &str) -> bool {
		self.registry
			.borrow()
			.get(container_id)
			.is_some_and(|record| record.pending_rewire.is_some())
	}

	fn mutate(
		&self,
		container_id: &str,
		action: &str,
		op: impl FnOnce(&GraphOf<B>) -> Result<(), EngineError>,
		notify: impl FnOnce(&dyn NodeEventSink) -> Result<(), SinkError>,
	) -> bool {
		match self.with_graph(container_id, op) {
			Ok(()) => {
				self.schedule_rewire(container_id);
				self.notify(container_id, notify);
				true
			}
			Err(e) => {
				error!("apex-tree: error {} in '{}': {}", action, container_id, e);
				false
			}
		}
	}

	/// Hand a notification to the container's sink, if it is still alive.
	///
	/// The registry is released first so the sink may call back into the bridge.
	fn notify(
		&self,
		container_id: &str,
		notify: impl FnOnce(&dyn NodeEventSink) -> Result<(), SinkError>,
	) {
		let sink = self
			.registry
			.borrow()
			.get(container_id)
			.and_then(|record| record.sink.as_ref())
			.and_then(Weak::upgrade);
		let Some(sink) = sink else {
			return;
		};
		if let Err(e) = notify(sink.as_ref()) {
			error!("apex-tree: error notifying host for '{}': {}", container_id, e);
		}
	}

	fn with_graph(
		&self,
		container_id: &str,
		op: impl FnOnce(&GraphOf<B>) -> Result<(), EngineError>,
	) -> Result<(), BridgeError> {
		let registry = self.registry.borrow();
		let record = registry
			.get(container_id)
			.ok_or_else(|| BridgeError::UnknownContainer(container_id.to_string()))?;
		let graph = record
			.graph
			.as_ref()
			.ok_or_else(|| BridgeError::NotRendered(container_id.to_string()))?;
		op(graph)?;
		Ok(())
	}

	fn schedule_rewire(&self, container_id: &str) {
		wiring::schedule_rewire(&self.registry, &self.dom, &self.scheduler, container_id);
	}
}
