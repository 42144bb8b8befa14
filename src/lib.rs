//! apex-tree-bridge: host the ApexTree tree visualization engine in Leptos.
//!
//! This crate provides a lifecycle bridge between Leptos components and the
//! imperative ApexTree engine, plus a ready-made `<ApexTree>` component.

use leptos::prelude::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::apex_tree::{
	ApexTree, Bridge, TemplateLibrary, TreeConfiguration, TreeDirection, TreeHandle, TreeNode,
	TreeOptions, WebBridge,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("apex-tree: logging initialized");
}

/// Load tree data from a script element with id="tree-data".
/// Expected format: a JSON tree node `{ id, name, children: [...] }`.
fn load_tree_data() -> Option<TreeNode> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("tree-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<TreeNode>(&json_text) {
		Ok(tree) => {
			info!("apex-tree: loaded {} nodes", tree.ids().len());
			Some(tree)
		}
		Err(e) => {
			warn!("apex-tree: failed to parse tree data: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads tree data from the DOM and renders it, cycling the layout direction
/// from a button.
#[component]
pub fn App() -> impl IntoView {
	let tree = load_tree_data().unwrap_or_else(|| TreeNode::new("root", "Root"));
	let tree_signal = Signal::derive(move || tree.clone());
	let options = Signal::derive(|| TreeOptions {
		width: "100%".into(),
		height: "100%".into(),
		enable_expand_collapse: true,
		..TreeOptions::default()
	});
	let (direction, set_direction) = signal(TreeDirection::Top);
	let (selected, set_selected) = signal(None::<String>);

	let next_direction = move |_| {
		set_direction.update(|d| {
			*d = match *d {
				TreeDirection::Top => TreeDirection::Left,
				TreeDirection::Left => TreeDirection::Bottom,
				TreeDirection::Bottom => TreeDirection::Right,
				TreeDirection::Right => TreeDirection::Top,
			}
		})
	};

	view! {
		<div class="fullscreen-tree">
			<ApexTree
				id="apex-tree"
				data=tree_signal
				options=options
				direction=direction
				on_node_click=move |id: String| set_selected.set(Some(id))
			/>
			<div class="tree-overlay">
				<button on:click=next_direction>{move || format!("Layout: {}", direction.get())}</button>
				<p class="subtitle">
					{move || selected.get().map(|id| format!("Selected: {id}")).unwrap_or_default()}
				</p>
			</div>
		</div>
	}
}
