use crate::generators::css::StyleBlock;
use crate::generators::primitives::escape_html;

/// Result of evaluating a template expression.
///
/// The variant decides how the value is written out: text is HTML-escaped,
/// markup is trusted generator output and is injected verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Int(i64),
	Text(String),
	Markup(String),
	List(Vec<Value>),
	StyleBlock(StyleBlock),
}

impl Value {
	/// Short name used in type errors.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Int(_) => "int",
			Value::Text(_) => "text",
			Value::Markup(_) => "markup",
			Value::List(_) => "list",
			Value::StyleBlock(_) => "style block",
		}
	}

	/// Empty strings, empty lists and zero are false; everything else is true.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Int(i) => *i != 0,
			Value::Text(s) | Value::Markup(s) => !s.is_empty(),
			Value::List(items) => !items.is_empty(),
			Value::StyleBlock(_) => true,
		}
	}

	/// Looks up a dot field such as `.Style` on a style block.
	pub fn field(&self, name: &str) -> Option<Value> {
		match (self, name) {
			(Value::StyleBlock(block), "Style") => Some(Value::Markup(block.style.clone())),
			(Value::StyleBlock(block), "Class") => Some(Value::Text(block.class.clone())),
			_ => None,
		}
	}

	/// Appends the value to rendered output.
	///
	/// Lists render as their space-separated items in brackets.
	pub fn render_into(&self, out: &mut String) {
		match self {
			Value::Int(i) => out.push_str(&i.to_string()),
			Value::Text(s) => out.push_str(&escape_html(s)),
			Value::Markup(s) => out.push_str(s),
			Value::List(items) => {
				out.push('[');
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						out.push(' ');
					}
					item.render_into(out);
				}
				out.push(']');
			}
			Value::StyleBlock(block) => out.push_str(&block.style),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn text_is_escaped_markup_is_not() {
		let mut out = String::new();
		Value::Text("<b>".to_owned()).render_into(&mut out);
		Value::Markup("<b>".to_owned()).render_into(&mut out);
		assert_eq!(out, "&lt;b&gt;<b>");
	}

	#[test]
	fn lists_render_items() {
		let mut out = String::new();
		Value::List(vec![Value::Int(1), Value::Text("a&b".to_owned())]).render_into(&mut out);
		assert_eq!(out, "[1 a&amp;b]");
	}

	#[test]
	fn style_block_fields() {
		let block = Value::StyleBlock(StyleBlock {
			style: "<style></style>".to_owned(),
			class: "pabc".to_owned(),
		});
		assert_eq!(block.field("Class"), Some(Value::Text("pabc".to_owned())));
		assert_eq!(block.field("Style"), Some(Value::Markup("<style></style>".to_owned())));
		assert_eq!(block.field("Other"), None);
		assert!(Value::Int(1).field("Style").is_none());
	}

	#[test]
	fn truthiness() {
		assert!(!Value::Int(0).is_truthy());
		assert!(Value::Int(-1).is_truthy());
		assert!(!Value::Text(String::new()).is_truthy());
		assert!(!Value::List(Vec::new()).is_truthy());
	}
}
