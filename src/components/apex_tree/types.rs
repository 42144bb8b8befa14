//! Tree data and configuration structures handed to the tree engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node in the tree hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
	/// Unique identifier within one tree. Reported back on click/hover.
	pub id: String,
	/// Display name, rendered by default when `contentKey` is `name`.
	pub name: String,
	/// Child nodes. Order determines sibling layout order.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<TreeNode>,
	/// Arbitrary payload available to node templates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
	/// Per-node overrides that shadow the global options.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<NodeOptions>,
}

impl TreeNode {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			..Self::default()
		}
	}

	pub fn with_child(mut self, child: TreeNode) -> Self {
		self.children.push(child);
		self
	}

	pub fn with_options(mut self, options: NodeOptions) -> Self {
		self.options = Some(options);
		self
	}

	/// Depth-first search for a node by id.
	pub fn find(&self, id: &str) -> Option<&TreeNode> {
		if self.id == id {
			return Some(self);
		}
		self.children.iter().find_map(|child| child.find(id))
	}

	/// Node ids in depth-first pre-order.
	pub fn ids(&self) -> Vec<&str> {
		let mut ids = vec![self.id.as_str()];
		for child in &self.children {
			ids.extend(child.ids());
		}
		ids
	}
}

/// Styling overrides for a single node. Unset fields are not serialized.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOptions {
	#[serde(rename = "nodeBGColor", skip_serializing_if = "Option::is_none")]
	pub node_bg_color: Option<String>,
	#[serde(rename = "nodeBGColorHover", skip_serializing_if = "Option::is_none")]
	pub node_bg_color_hover: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_color_hover: Option<String>,
	/// Border width in pixels.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_width: Option<u32>,
	/// CSS border style (solid, dashed, dotted, ...).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_style: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub border_radius: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_size: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_family: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_weight: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_color: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_width: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_height: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_class_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_style: Option<String>,
}

/// Direction in which the tree layout flows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeDirection {
	#[default]
	Top,
	Bottom,
	Left,
	Right,
}

impl TreeDirection {
	pub const ALL: [TreeDirection; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

	/// Name understood by the engine's `changeLayout`.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Top => "top",
			Self::Bottom => "bottom",
			Self::Left => "left",
			Self::Right => "right",
		}
	}
}

impl fmt::Display for TreeDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when text does not name one of the four directions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown tree direction '{0}'")]
pub struct ParseDirectionError(String);

impl FromStr for TreeDirection {
	type Err = ParseDirectionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| ParseDirectionError(s.to_string()))
	}
}

/// Container width or height: pixels or any CSS length such as `"100%"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
	Pixels(u32),
	Css(String),
}

impl From<u32> for Dimension {
	fn from(px: u32) -> Self {
		Self::Pixels(px)
	}
}

impl From<&str> for Dimension {
	fn from(css: &str) -> Self {
		Self::Css(css.to_string())
	}
}

/// Typed global options, defaulting to the engine's documented values.
///
/// Convert with [`TreeOptions::to_configuration`] before rendering. Fields the
/// engine supports but this struct does not name can be set through `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeOptions {
	// Layout
	pub width: Dimension,
	pub height: Dimension,
	pub direction: TreeDirection,
	/// Spacing between parent and children, in pixels.
	pub children_spacing: u32,
	/// Spacing between siblings, in pixels.
	pub sibling_spacing: u32,

	// Nodes
	pub node_width: u32,
	pub node_height: u32,
	#[serde(rename = "nodeBGColor")]
	pub node_bg_color: String,
	#[serde(rename = "nodeBGColorHover")]
	pub node_bg_color_hover: String,
	pub border_width: u32,
	pub border_style: String,
	pub border_radius: String,
	pub border_color: String,
	pub border_color_hover: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_class_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_style: Option<String>,
	/// Template source for node content, see [`super::template`].
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node_template: Option<String>,

	// Edges
	pub edge_width: u32,
	pub edge_color: String,
	pub edge_color_hover: String,

	// Fonts
	pub font_size: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub font_family: Option<String>,
	pub font_weight: String,
	pub font_color: String,

	// Interaction
	pub highlight_on_hover: bool,
	pub enable_toolbar: bool,
	pub enable_expand_collapse: bool,

	// Tooltips
	pub enable_tooltip: bool,
	pub tooltip_id: String,
	pub tooltip_max_width: u32,
	pub tooltip_border_color: String,
	#[serde(rename = "tooltipBGColor")]
	pub tooltip_bg_color: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tooltip_template: Option<String>,

	// Leaf grouping
	pub group_leaf_nodes: bool,
	pub group_leaf_nodes_spacing: u32,

	// Container
	pub container_class_name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub canvas_style: Option<String>,
	/// Node field whose value is handed to the node template.
	pub content_key: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub view_port_width: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub view_port_height: Option<u32>,

	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Default for TreeOptions {
	fn default() -> Self {
		Self {
			width: Dimension::Pixels(800),
			height: Dimension::Pixels(600),
			direction: TreeDirection::Top,
			children_spacing: 50,
			sibling_spacing: 50,
			node_width: 120,
			node_height: 60,
			node_bg_color: "#FFFFFF".into(),
			node_bg_color_hover: "#FFFFFF".into(),
			border_width: 1,
			border_style: "solid".into(),
			border_radius: "5px".into(),
			border_color: "#BCBCBC".into(),
			border_color_hover: "#5C6BC0".into(),
			node_class_name: None,
			node_style: None,
			node_template: None,
			edge_width: 1,
			edge_color: "#BCBCBC".into(),
			edge_color_hover: "#BCBCBC".into(),
			font_size: "14px".into(),
			font_family: None,
			font_weight: "400".into(),
			font_color: "#000000".into(),
			highlight_on_hover: true,
			enable_toolbar: false,
			enable_expand_collapse: false,
			enable_tooltip: false,
			tooltip_id: "apextree-tooltip-container".into(),
			tooltip_max_width: 100,
			tooltip_border_color: "#BCBCBC".into(),
			tooltip_bg_color: "#FFFFFF".into(),
			tooltip_template: None,
			group_leaf_nodes: false,
			group_leaf_nodes_spacing: 10,
			container_class_name: "root".into(),
			canvas_style: None,
			content_key: "name".into(),
			view_port_width: None,
			view_port_height: None,
			extra: Map::new(),
		}
	}
}

impl TreeOptions {
	/// Flatten into the JSON object shape the engine consumes.
	pub fn to_configuration(&self) -> TreeConfiguration {
		match serde_json::to_value(self) {
			Ok(Value::Object(map)) => TreeConfiguration::from(map),
			// Every field serializes to plain JSON, so this arm is unreachable in practice.
			_ => TreeConfiguration::default(),
		}
	}
}

/// Flat, JSON-shaped engine configuration.
///
/// Field names are a stable contract with the engine; anything not
/// interpreted by the bridge passes through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeConfiguration(Map<String, Value>);

impl TreeConfiguration {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}
}

impl From<Map<String, Value>> for TreeConfiguration {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl From<&TreeOptions> for TreeConfiguration {
	fn from(options: &TreeOptions) -> Self {
		options.to_configuration()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("top", Some(TreeDirection::Top))]
	#[case("Right", Some(TreeDirection::Right))]
	#[case(" bottom ", Some(TreeDirection::Bottom))]
	#[case("LEFT", Some(TreeDirection::Left))]
	#[case("diagonal", None)]
	#[case("", None)]
	fn direction_parses_case_insensitively(#[case] text: &str, #[case] expected: Option<TreeDirection>) {
		assert_eq!(text.parse::<TreeDirection>().ok(), expected);
	}

	#[test]
	fn direction_round_trips_through_display() {
		for direction in TreeDirection::ALL {
			assert_eq!(direction.to_string().parse::<TreeDirection>(), Ok(direction));
			assert_eq!(serde_json::to_value(direction).unwrap(), json!(direction.as_str()));
		}
	}

	#[test]
	fn default_options_use_engine_field_names() {
		let config = TreeOptions::default().to_configuration();

		assert_eq!(config.get("nodeBGColor"), Some(&json!("#FFFFFF")));
		assert_eq!(config.get("tooltipBGColor"), Some(&json!("#FFFFFF")));
		assert_eq!(config.get("childrenSpacing"), Some(&json!(50)));
		assert_eq!(config.get("direction"), Some(&json!("top")));
		assert_eq!(config.get("width"), Some(&json!(800)));
		assert_eq!(config.get("contentKey"), Some(&json!("name")));
		assert!(config.get("nodeTemplate").is_none());
		assert!(config.get("viewPortWidth").is_none());
	}

	#[test]
	fn extra_fields_are_flattened() {
		let mut options = TreeOptions {
			width: "100%".into(),
			..TreeOptions::default()
		};
		options.extra.insert("customFlag".into(), json!(true));

		let config = options.to_configuration();
		assert_eq!(config.get("width"), Some(&json!("100%")));
		assert_eq!(config.get("customFlag"), Some(&json!(true)));
	}

	#[test]
	fn tree_node_serializes_without_empty_fields() {
		let tree = TreeNode::new("root", "R").with_child(TreeNode::new("c1", "C").with_options(
			NodeOptions {
				node_bg_color: Some("#eee".into()),
				..NodeOptions::default()
			},
		));

		let value = serde_json::to_value(&tree).unwrap();
		assert_eq!(
			value,
			json!({
				"id": "root",
				"name": "R",
				"children": [{ "id": "c1", "name": "C", "options": { "nodeBGColor": "#eee" } }]
			})
		);
		assert_eq!(tree.ids(), vec!["root", "c1"]);
		assert_eq!(tree.find("c1").map(|n| n.name.as_str()), Some("C"));
	}
}
