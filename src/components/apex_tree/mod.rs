//! Hosting of the ApexTree hierarchical tree engine inside Leptos.
//!
//! The engine is an imperative JavaScript library that draws a tree into an
//! SVG subtree of a container element. This module keeps it in step with the
//! component tree:
//! - [`Bridge`] owns one record per container and drives the engine through
//!   initialize, render, layout change, expand/collapse, fit and destroy
//! - [`options::translate`] turns host configuration into the engine's shape,
//!   compiling template text into callables
//! - [`wiring`] re-attaches click/hover listeners after every structural
//!   change, since the engine replaces node elements wholesale
//!
//! The bridge is generic over its collaborators (see [`host`]); the browser
//! flavor is [`WebBridge`], and [`ApexTree`] is the component most hosts use.
//!
//! # Example
//!
//! ```ignore
//! use apex_tree_bridge::{ApexTree, TreeNode, TreeOptions};
//!
//! let tree = TreeNode::new("root", "CEO")
//!     .with_child(TreeNode::new("cto", "CTO"))
//!     .with_child(TreeNode::new("cfo", "CFO"));
//!
//! view! {
//!     <ApexTree
//!         id="org-chart"
//!         data=Signal::stored(tree)
//!         options=Signal::stored(TreeOptions::default())
//!         on_node_click=move |id: String| log::info!("clicked {id}")
//!     />
//! }
//! ```

mod bridge;
mod component;
mod error;
pub mod host;
pub mod options;
mod registry;
pub mod template;
mod types;
mod web;
pub mod wiring;

pub use bridge::Bridge;
pub use component::{ApexTree, TreeHandle};
pub use error::{BridgeError, EngineError, SinkError};
pub use host::{Backend, Dom, NodeEvent, NodeEventSink, Scheduler, TreeEngine, TreeGraph};
pub use options::EffectiveConfig;
pub use template::{Template, TemplateError, TemplateLibrary};
pub use types::{
	Dimension, NodeOptions, ParseDirectionError, TreeConfiguration, TreeDirection, TreeNode,
	TreeOptions,
};
pub use web::{TimeoutScheduler, WebBackend, WebBridge, WebDom, WebEngine};
