//! Node and tooltip templates.
//!
//! The engine accepts callbacks that turn a node's content into HTML. Hosts
//! describe those callbacks as text, which is compiled here into one of two
//! forms:
//!
//! - Interpolated markup with `{{ path }}` placeholders, e.g.
//!   `<div class="card">{{ name }} <small>{{ data.role }}</small></div>`.
//!   A path is `.` (the whole argument) or dot-separated object keys and
//!   array indices. Inserted values are HTML-escaped unless the placeholder
//!   ends in `| raw`.
//! - `@name`, referring to a callback registered in a [`TemplateLibrary`].
//!
//! Script text such as function expressions is rejected, never evaluated.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// A host-provided template callback.
pub type TemplateFn = Rc<dyn Fn(&Value) -> String>;

/// Reasons template text fails to compile.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
	#[error("unterminated placeholder starting at byte {offset}")]
	Unterminated { offset: usize },

	#[error("unmatched '}}}}' at byte {offset}")]
	StrayClose { offset: usize },

	#[error("empty placeholder at byte {offset}")]
	EmptyPlaceholder { offset: usize },

	#[error("invalid field path '{path}'")]
	InvalidPath { path: String },

	#[error("unknown filter '{filter}'")]
	UnknownFilter { filter: String },

	#[error("missing callback name after '@'")]
	EmptyCallbackName,

	#[error("no template callback registered as '{name}'")]
	UnknownCallback { name: String },

	#[error("script text is not a template, use placeholders or @name")]
	Executable,
}

/// Named template callbacks supplied by the host at configuration time.
#[derive(Clone, Default)]
pub struct TemplateLibrary {
	entries: HashMap<String, TemplateFn>,
}

impl TemplateLibrary {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `callback` under `name`, replacing any previous entry.
	pub fn register(
		&mut self,
		name: impl Into<String>,
		callback: impl Fn(&Value) -> String + 'static,
	) -> &mut Self {
		self.entries.insert(name.into(), Rc::new(callback));
		self
	}

	pub fn with(mut self, name: impl Into<String>, callback: impl Fn(&Value) -> String + 'static) -> Self {
		self.register(name, callback);
		self
	}

	pub fn get(&self, name: &str) -> Option<&TemplateFn> {
		self.entries.get(name)
	}
}

impl fmt::Debug for TemplateLibrary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.entries.keys().collect();
		names.sort();
		f.debug_struct("TemplateLibrary").field("names", &names).finish()
	}
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
	Text(String),
	Field { path: Vec<String>, raw: bool },
}

#[derive(Clone)]
enum Body {
	Markup(Vec<Segment>),
	Callback { name: String, callback: TemplateFn },
}

/// A compiled template, callable with the content the engine passes in.
#[derive(Clone)]
pub struct Template {
	source: String,
	body: Body,
}

impl Template {
	/// Compile template text, resolving `@name` references against `library`.
	pub fn compile(source: &str, library: &TemplateLibrary) -> Result<Self, TemplateError> {
		let trimmed = source.trim();
		let body = if let Some(name) = trimmed.strip_prefix('@') {
			let name = name.trim();
			if name.is_empty() {
				return Err(TemplateError::EmptyCallbackName);
			}
			let callback = library
				.get(name)
				.cloned()
				.ok_or_else(|| TemplateError::UnknownCallback {
					name: name.to_string(),
				})?;
			Body::Callback {
				name: name.to_string(),
				callback,
			}
		} else {
			let segments = parse(source)?;
			if looks_executable(trimmed, &segments) {
				return Err(TemplateError::Executable);
			}
			Body::Markup(segments)
		};

		Ok(Self {
			source: source.to_string(),
			body,
		})
	}

	/// Produce HTML for one node's content.
	pub fn render(&self, content: &Value) -> String {
		match &self.body {
			Body::Callback { callback, .. } => callback(content),
			Body::Markup(segments) => {
				let mut out = String::new();
				for segment in segments {
					match segment {
						Segment::Text(text) => out.push_str(text),
						Segment::Field { path, raw } => {
							let text = lookup(content, path).map(display).unwrap_or_default();
							if *raw {
								out.push_str(&text);
							} else {
								escape_into(&mut out, &text);
							}
						}
					}
				}
				out
			}
		}
	}
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Template");
		debug.field("source", &self.source);
		if let Body::Callback { name, .. } = &self.body {
			debug.field("callback", name);
		}
		debug.finish()
	}
}

fn parse(source: &str) -> Result<Vec<Segment>, TemplateError> {
	let mut segments = Vec::new();
	let (mut rest, mut offset) = (source, 0);

	loop {
		let open = rest.find("{{");
		let close = rest.find("}}");
		let open = match (open, close) {
			(None, None) => {
				if !rest.is_empty() {
					segments.push(Segment::Text(rest.to_string()));
				}
				return Ok(segments);
			}
			(None, Some(c)) => return Err(TemplateError::StrayClose { offset: offset + c }),
			(Some(o), Some(c)) if c < o => {
				return Err(TemplateError::StrayClose { offset: offset + c });
			}
			(Some(o), _) => o,
		};

		if open > 0 {
			segments.push(Segment::Text(rest[..open].to_string()));
		}
		let inner_start = open + 2;
		let inner_len = rest[inner_start..]
			.find("}}")
			.ok_or(TemplateError::Unterminated {
				offset: offset + open,
			})?;
		let inner = &rest[inner_start..inner_start + inner_len];
		segments.push(parse_placeholder(inner, offset + open)?);

		let consumed = inner_start + inner_len + 2;
		rest = &rest[consumed..];
		offset += consumed;
	}
}

/// Function expressions and template literals, i.e. text written for `eval`.
fn looks_executable(source: &str, segments: &[Segment]) -> bool {
	let function = source.strip_prefix("function").is_some_and(|rest| {
		rest.trim_start().starts_with('(') || rest.starts_with(char::is_whitespace)
	});
	function
		|| segments.iter().any(|segment| match segment {
			Segment::Text(text) => text.contains("=>") || text.contains("${"),
			Segment::Field { .. } => false,
		})
}

fn parse_placeholder(inner: &str, offset: usize) -> Result<Segment, TemplateError> {
	let mut parts = inner.split('|');
	let path = parts.next().unwrap_or_default().trim();
	if path.is_empty() {
		return Err(TemplateError::EmptyPlaceholder { offset });
	}

	let mut raw = false;
	for filter in parts {
		match filter.trim() {
			"raw" => raw = true,
			other => {
				return Err(TemplateError::UnknownFilter {
					filter: other.to_string(),
				});
			}
		}
	}

	if path == "." {
		return Ok(Segment::Field {
			path: Vec::new(),
			raw,
		});
	}

	let valid = |segment: &str| {
		!segment.is_empty()
			&& segment
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
	};
	let segments: Vec<&str> = path.split('.').collect();
	if !segments.iter().all(|s| valid(s)) {
		return Err(TemplateError::InvalidPath {
			path: path.to_string(),
		});
	}

	Ok(Segment::Field {
		path: segments.into_iter().map(str::to_string).collect(),
		raw,
	})
}

fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
	path.iter().try_fold(value, |current, key| match current {
		Value::Object(map) => map.get(key),
		Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	})
}

fn display(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn escape_into(out: &mut String, text: &str) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
}
