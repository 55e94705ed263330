//! Every generator exposed under a fixed name and arity.
//!
//! Templates refer to generators by name. Names are resolved into the closed
//! [`Macro`] enumeration when a template is compiled, so an unknown name or a
//! wrong argument count never reaches a render.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore};
use thiserror::Error;

use crate::error::TarpitError;
use crate::generators::content::{self, LinkSettings};
use crate::generators::corpus::WordCorpus;
use crate::generators::css::{self, StyleBlockKind};
use crate::generators::primitives::{escape_html, random_hex_color, random_id, random_int};
use crate::generators::text::{self, ParagraphShape};
use crate::generators::{script, structure, svg};
use crate::model::MarkovChain;

/// Template compiler and renderer.
pub mod template;

/// Dynamically typed values flowing through templates.
pub mod value;

pub use template::{RenderData, Template, TemplateError};
pub use value::Value;

/// Number of arguments a macro accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	Exact(usize),
	AtLeast(usize),
}

impl Arity {
	pub fn accepts(self, count: usize) -> bool {
		match self {
			Arity::Exact(n) => count == n,
			Arity::AtLeast(n) => count >= n,
		}
	}
}

impl fmt::Display for Arity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Arity::Exact(n) => write!(f, "{n}"),
			Arity::AtLeast(n) => write!(f, "at least {n}"),
		}
	}
}

#[derive(Debug, Error)]
pub enum MacroError {
	#[error("unknown function {0:?}")]
	Unknown(String),

	#[error("{name} expects {expected} argument(s), got {got}")]
	Arity {
		name: &'static str,
		expected: Arity,
		got: usize,
	},

	#[error("{name}: argument {index} must be {expected}, got {got}")]
	ArgumentType {
		name: &'static str,
		index: usize,
		expected: &'static str,
		got: &'static str,
	},

	#[error("{name}: {source}")]
	Generation {
		name: &'static str,
		#[source]
		source: TarpitError,
	},
}

/// Shared resources a macro may draw from during one render.
pub struct MacroContext<'a> {
	pub rng: &'a mut dyn RngCore,
	pub corpus: &'a WordCorpus,
	/// Absent until a model has been trained or loaded.
	pub model: Option<&'a MarkovChain>,
	pub links: &'a LinkSettings,
}

macro_rules! macros {
	($($variant:ident => $name:literal, $arity:expr;)*) => {
		/// Closed set of template functions.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum Macro {
			$($variant,)*
		}

		impl Macro {
			pub const ALL: &'static [Macro] = &[$(Macro::$variant,)*];

			/// Name used in templates.
			pub fn name(self) -> &'static str {
				match self {
					$(Macro::$variant => $name,)*
				}
			}

			pub fn arity(self) -> Arity {
				match self {
					$(Macro::$variant => $arity,)*
				}
			}
		}

		impl FromStr for Macro {
			type Err = MacroError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($name => Ok(Macro::$variant),)*
					other => Err(MacroError::Unknown(other.to_owned())),
				}
			}
		}
	};
}

macros! {
	MarkovSentence => "markovSentence", Arity::Exact(1);
	MarkovParagraphs => "markovParagraphs", Arity::Exact(5);
	RandomParagraphs => "randomParagraphs", Arity::Exact(5);
	RandomSentence => "randomSentence", Arity::Exact(1);
	RandomWord => "randomWord", Arity::Exact(0);
	RandomString => "randomString", Arity::Exact(2);
	RandomDate => "randomDate", Arity::Exact(3);
	RandomForm => "randomForm", Arity::Exact(2);
	RandomDefinitionData => "randomDefinitionData", Arity::Exact(2);
	RandomColor => "randomColor", Arity::Exact(0);
	RandomId => "randomId", Arity::Exact(2);
	RandomClasses => "randomClasses", Arity::Exact(1);
	RandomInlineStyle => "randomInlineStyle", Arity::Exact(1);
	RandomCssStyle => "randomCSSStyle", Arity::Exact(1);
	RandomLink => "randomLink", Arity::Exact(0);
	RandomQueryLink => "randomQueryLink", Arity::Exact(1);
	RandomJson => "randomJSON", Arity::Exact(3);
	RandomInt => "randomInt", Arity::Exact(2);
	Add => "add", Arity::Exact(2);
	Sub => "sub", Arity::Exact(2);
	Div => "div", Arity::Exact(2);
	Mult => "mult", Arity::Exact(2);
	Max => "max", Arity::Exact(2);
	Min => "min", Arity::Exact(2);
	Repeat => "repeat", Arity::Exact(1);
	List => "list", Arity::AtLeast(0);
	RandomChoice => "randomChoice", Arity::Exact(1);
	NestDivs => "nestDivs", Arity::Exact(1);
	RandomComplexTable => "randomComplexTable", Arity::Exact(2);
	RandomStyleBlock => "randomStyleBlock", Arity::Exact(2);
	RandomSvg => "randomSVG", Arity::Exact(1);
	RandomCssVars => "randomCSSVars", Arity::Exact(1);
	JsInteractiveContent => "jsInteractiveContent", Arity::Exact(2);
}

/// Typed access to evaluated arguments.
struct Args<'v> {
	name: &'static str,
	values: &'v [Value],
}

impl<'v> Args<'v> {
	fn type_error(&self, index: usize, expected: &'static str) -> MacroError {
		MacroError::ArgumentType {
			name: self.name,
			index,
			expected,
			got: self.values[index].type_name(),
		}
	}

	fn int(&self, index: usize) -> Result<i64, MacroError> {
		match &self.values[index] {
			Value::Int(i) => Ok(*i),
			_ => Err(self.type_error(index, "an int")),
		}
	}

	fn text(&self, index: usize) -> Result<&'v str, MacroError> {
		match &self.values[index] {
			Value::Text(s) | Value::Markup(s) => Ok(s),
			_ => Err(self.type_error(index, "a string")),
		}
	}

	fn list(&self, index: usize) -> Result<&'v [Value], MacroError> {
		match &self.values[index] {
			Value::List(items) => Ok(items),
			_ => Err(self.type_error(index, "a list")),
		}
	}

	fn shape(&self) -> Result<ParagraphShape, MacroError> {
		Ok(ParagraphShape {
			count: self.int(0)?,
			min_sentences: self.int(1)?,
			max_sentences: self.int(2)?,
			min_words: self.int(3)?,
			max_words: self.int(4)?,
		})
	}
}

impl Macro {
	/// Checks an argument count against the macro's arity.
	pub fn check_arity(self, got: usize) -> Result<(), MacroError> {
		let expected = self.arity();
		if expected.accepts(got) {
			Ok(())
		} else {
			Err(MacroError::Arity { name: self.name(), expected, got })
		}
	}

	/// Invokes the generator behind this macro.
	pub fn call(self, ctx: &mut MacroContext<'_>, values: Vec<Value>) -> Result<Value, MacroError> {
		self.check_arity(values.len())?;
		let args = Args { name: self.name(), values: &values };
		let rng = &mut *ctx.rng;

		let value = match self {
			Macro::MarkovSentence => Value::Text(text::markov_sentence(rng, ctx.model, args.int(0)?)),
			Macro::MarkovParagraphs => Value::Text(text::markov_paragraphs(rng, ctx.model, args.shape()?)),
			Macro::RandomParagraphs => Value::Text(text::random_paragraphs(rng, ctx.corpus, args.shape()?)),
			Macro::RandomSentence => Value::Text(text::random_sentence(rng, ctx.corpus, args.int(0)?)),
			Macro::RandomWord => Value::Text(ctx.corpus.clean_word(rng)),
			Macro::RandomString => {
				Value::Text(content::random_string(rng, ctx.corpus, args.text(0)?, args.int(1)?))
			}
			Macro::RandomDate => {
				Value::Text(content::random_date(rng, args.text(0)?, args.text(1)?, args.text(2)?))
			}
			Macro::RandomForm => {
				Value::Markup(structure::random_form(rng, ctx.corpus, args.int(0)?, args.int(1)?))
			}
			Macro::RandomDefinitionData => Value::Markup(structure::random_definition_data(
				rng,
				ctx.corpus,
				args.int(0)?,
				args.int(1)?,
			)),
			Macro::RandomColor => Value::Text(random_hex_color(rng)),
			Macro::RandomId => {
				let len = args.int(1)?.max(0) as usize;
				Value::Text(random_id(rng, args.text(0)?, len))
			}
			Macro::RandomClasses => Value::Text(content::random_classes(rng, args.int(0)?)),
			Macro::RandomInlineStyle => Value::Markup(css::random_inline_style(rng, args.int(0)?)),
			Macro::RandomCssStyle => Value::Text(css::random_css_style(rng, args.int(0)?)),
			Macro::RandomLink => Value::Text(content::random_link(rng, ctx.corpus, ctx.links)),
			Macro::RandomQueryLink => {
				Value::Text(content::random_query_link(rng, ctx.corpus, ctx.links, args.int(0)?))
			}
			Macro::RandomJson => {
				let json = content::random_json(rng, args.int(0)?, args.int(1)?, args.int(2)?)
					.map_err(|source| MacroError::Generation { name: self.name(), source })?;
				Value::Text(json)
			}
			Macro::RandomInt => Value::Int(random_int(rng, args.int(0)?, args.int(1)?)),
			Macro::Add => Value::Int(args.int(0)?.wrapping_add(args.int(1)?)),
			Macro::Sub => Value::Int(args.int(0)?.wrapping_sub(args.int(1)?)),
			Macro::Div => Value::Int(args.int(0)?.checked_div(args.int(1)?).unwrap_or(0)),
			Macro::Mult => Value::Int(args.int(0)?.wrapping_mul(args.int(1)?)),
			Macro::Max => Value::Int(args.int(0)?.max(args.int(1)?)),
			Macro::Min => Value::Int(args.int(0)?.min(args.int(1)?)),
			Macro::Repeat => Value::List((0..args.int(0)?.max(0)).map(Value::Int).collect()),
			Macro::List => Value::List(values.clone()),
			Macro::RandomChoice => {
				let items = args.list(0)?;
				if items.is_empty() {
					Value::Text(String::new())
				} else {
					items[rng.random_range(0..items.len())].clone()
				}
			}
			Macro::NestDivs => Value::Markup(structure::nest_divs(rng, ctx.corpus, args.int(0)?)),
			Macro::RandomComplexTable => Value::Markup(structure::random_complex_table(
				rng,
				ctx.corpus,
				args.int(0)?,
				args.int(1)?,
			)),
			Macro::RandomStyleBlock => {
				let kind = args.text(0)?.parse::<StyleBlockKind>().ok();
				Value::StyleBlock(css::random_style_block(rng, ctx.corpus, kind, args.int(1)?))
			}
			Macro::RandomSvg => Value::Markup(svg::random_svg(rng, args.text(0)?)),
			Macro::RandomCssVars => Value::Markup(css::random_css_vars(rng, args.int(0)?)),
			Macro::JsInteractiveContent => {
				// Plain text must not turn into markup once assigned to innerHTML.
				let content = match &values[1] {
					Value::Markup(markup) => markup.clone(),
					Value::Text(text) => escape_html(text),
					_ => return Err(args.type_error(1, "a string")),
				};
				Value::Markup(script::js_interactive_content(rng, args.text(0)?, &content))
			}
		};

		Ok(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn call(function: Macro, args: Vec<Value>) -> Result<Value, MacroError> {
		let mut rng = StdRng::seed_from_u64(42);
		let corpus = WordCorpus::embedded();
		let links = LinkSettings::default();
		let mut ctx = MacroContext { rng: &mut rng, corpus: &corpus, model: None, links: &links };
		function.call(&mut ctx, args)
	}

	fn text(s: &str) -> Value {
		Value::Text(s.to_owned())
	}

	#[test]
	fn names_round_trip() {
		assert_eq!(Macro::ALL.len(), 33);
		for function in Macro::ALL {
			assert_eq!(function.name().parse::<Macro>().unwrap(), *function);
		}
		assert!(matches!("printf".parse::<Macro>(), Err(MacroError::Unknown(_))));
	}

	#[test]
	fn arity_is_checked() {
		assert!(matches!(
			call(Macro::Add, vec![Value::Int(1)]),
			Err(MacroError::Arity { name: "add", got: 1, .. })
		));
		assert!(Macro::List.check_arity(0).is_ok());
		assert!(Macro::List.check_arity(7).is_ok());
		assert!(Macro::RandomWord.check_arity(1).is_err());
	}

	#[test]
	fn argument_types_are_checked() {
		let err = call(Macro::NestDivs, vec![text("3")]).unwrap_err();
		assert!(matches!(err, MacroError::ArgumentType { index: 0, got: "text", .. }));
	}

	#[test]
	fn arithmetic() {
		assert_eq!(call(Macro::Add, vec![Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
		assert_eq!(call(Macro::Sub, vec![Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(-1));
		assert_eq!(call(Macro::Mult, vec![Value::Int(4), Value::Int(3)]).unwrap(), Value::Int(12));
		assert_eq!(call(Macro::Div, vec![Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(3));
		assert_eq!(call(Macro::Div, vec![Value::Int(7), Value::Int(0)]).unwrap(), Value::Int(0));
		assert_eq!(call(Macro::Max, vec![Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(7));
		assert_eq!(call(Macro::Min, vec![Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(2));
		assert_eq!(call(Macro::RandomInt, vec![Value::Int(5), Value::Int(5)]).unwrap(), Value::Int(5));
	}

	#[test]
	fn lists() {
		assert_eq!(
			call(Macro::Repeat, vec![Value::Int(3)]).unwrap(),
			Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
		);
		assert_eq!(call(Macro::Repeat, vec![Value::Int(-2)]).unwrap(), Value::List(Vec::new()));

		let choices = vec![text("a"), text("b")];
		let picked = call(Macro::RandomChoice, vec![Value::List(choices.clone())]).unwrap();
		assert!(choices.contains(&picked));
		assert_eq!(call(Macro::RandomChoice, vec![Value::List(Vec::new())]).unwrap(), text(""));
	}

	#[test]
	fn negative_json_depth_fails() {
		let err = call(Macro::RandomJson, vec![Value::Int(-1), Value::Int(2), Value::Int(3)]).unwrap_err();
		assert!(matches!(err, MacroError::Generation { name: "randomJSON", .. }));
	}

	#[test]
	fn markup_and_text_kinds() {
		assert!(matches!(call(Macro::NestDivs, vec![Value::Int(2)]).unwrap(), Value::Markup(_)));
		assert!(matches!(call(Macro::RandomWord, vec![]).unwrap(), Value::Text(_)));
		assert!(matches!(
			call(Macro::RandomStyleBlock, vec![text("nested"), Value::Int(2)]).unwrap(),
			Value::StyleBlock(_)
		));
		assert_eq!(call(Macro::MarkovSentence, vec![Value::Int(5)]).unwrap(), text(""));
	}

	#[test]
	fn interactive_content_escapes_text() {
		let value = call(Macro::JsInteractiveContent, vec![text("div"), text("<i>")]).unwrap();
		assert!(matches!(value, Value::Markup(html) if html.starts_with("<div id=\"ph")));
	}
}
