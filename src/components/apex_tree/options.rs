//! Translation of host configuration into the engine's runtime shape.

use log::error;
use serde_json::{Map, Value};

use super::template::{Template, TemplateLibrary};
use super::types::TreeConfiguration;

/// Configuration field holding the node content template.
pub const NODE_TEMPLATE_FIELD: &str = "nodeTemplate";
/// Configuration field holding the tooltip template.
pub const TOOLTIP_TEMPLATE_FIELD: &str = "tooltipTemplate";

/// Configuration ready to hand to the engine.
///
/// `fields` carries everything that passes through verbatim; successfully
/// compiled templates are lifted out into their own slots.
#[derive(Clone, Debug, Default)]
pub struct EffectiveConfig {
	pub fields: Map<String, Value>,
	pub node_template: Option<Template>,
	pub tooltip_template: Option<Template>,
}

impl EffectiveConfig {
	/// Compiled templates paired with the field name the engine expects.
	pub fn templates(&self) -> impl Iterator<Item = (&'static str, &Template)> {
		[
			(NODE_TEMPLATE_FIELD, self.node_template.as_ref()),
			(TOOLTIP_TEMPLATE_FIELD, self.tooltip_template.as_ref()),
		]
		.into_iter()
		.filter_map(|(field, template)| template.map(|t| (field, t)))
	}
}

/// Produce the effective engine configuration without touching `config`.
///
/// Null templates are dropped so the engine falls back to its own default.
/// Template text that fails to compile is logged and dropped as well. Values
/// of any other type are passed through unchanged.
pub fn translate(config: &TreeConfiguration, library: &TemplateLibrary) -> EffectiveConfig {
	let mut fields = config.as_map().clone();
	let node_template = take_template(&mut fields, NODE_TEMPLATE_FIELD, library);
	let tooltip_template = take_template(&mut fields, TOOLTIP_TEMPLATE_FIELD, library);

	EffectiveConfig {
		fields,
		node_template,
		tooltip_template,
	}
}

fn take_template(
	fields: &mut Map<String, Value>,
	field: &str,
	library: &TemplateLibrary,
) -> Option<Template> {
	if matches!(fields.get(field), Some(Value::Null)) {
		fields.remove(field);
		return None;
	}

	let source = match fields.get(field) {
		Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
		_ => return None,
	};
	fields.remove(field);

	match Template::compile(&source, library) {
		Ok(template) => Some(template),
		Err(e) => {
			error!("apex-tree: error converting {}: {}", field, e);
			None
		}
	}
}
