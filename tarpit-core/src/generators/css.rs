use std::fmt::Write as _;
use std::str::FromStr;

use rand::{Rng, RngCore};

use super::corpus::WordCorpus;
use super::primitives::{random_hex_color, random_keyword, random_string_from_charset, LOWER_ALPHABET_CHARS};

const DEFAULT_UNITS: &[&str] = &["px", "em", "%", "rem", "vh", "vw"];

/// Random length `value+unit` with `value` in `[min, max]`.
fn random_length(rng: &mut dyn RngCore, min: i32, max: i32, units: &[&str]) -> String {
	let units = if units.is_empty() { DEFAULT_UNITS } else { units };
	let value = rng.random_range(min..=max);
	format!("{value}{}", random_keyword(rng, units))
}

fn random_float(rng: &mut dyn RngCore, min: f64, max: f64) -> String {
	format!("{:.2}", rng.random_range(min..max))
}

/// Picks uniformly among `keywords` plus one generated alternative.
fn keyword_or(rng: &mut dyn RngCore, keywords: &[&str], alternative: impl FnOnce(&mut dyn RngCore) -> String) -> String {
	let index = rng.random_range(0..=keywords.len());
	match keywords.get(index) {
		Some(keyword) => (*keyword).to_owned(),
		None => alternative(rng),
	}
}

/// One to four lengths, as accepted by `margin` and `padding`.
fn random_shorthand_length(rng: &mut dyn RngCore) -> String {
	let count = rng.random_range(1..=4);
	(0..count)
		.map(|_| random_length(rng, 0, 50, &["px", "%", "em"]))
		.collect::<Vec<_>>()
		.join(" ")
}

fn random_shadow(rng: &mut dyn RngCore) -> String {
	let h_offset = random_length(rng, -10, 10, &["px"]);
	let v_offset = random_length(rng, -10, 10, &["px"]);
	let blur = random_length(rng, 0, 20, &["px"]);
	let mut spread = String::new();
	let mut inset = "";
	if rng.random_bool(0.5) {
		spread = format!(" {}", random_length(rng, 0, 15, &["px"]));
		if rng.random_range(0..3) == 0 {
			inset = " inset";
		}
	}
	let color = random_hex_color(rng);
	format!("{h_offset} {v_offset} {blur}{spread} {color}{inset}")
}

fn random_grid_template(rng: &mut dyn RngCore) -> String {
	let tracks = rng.random_range(1..=4);
	(0..tracks)
		.map(|_| match rng.random_range(0..3) {
			0 => random_length(rng, 20, 200, &["px", "em"]),
			1 => random_length(rng, 10, 100, &["%"]),
			_ => format!("{}fr", rng.random_range(1..=4)),
		})
		.collect::<Vec<_>>()
		.join(" ")
}

fn random_transition(rng: &mut dyn RngCore) -> String {
	let property = random_keyword(rng, &["all", "opacity", "transform", "background-color", "color"]);
	let duration = rng.random_range(0.1..2.0);
	let timing = random_keyword(rng, &["ease", "ease-in", "ease-out", "ease-in-out", "linear", "step-start"]);
	let delay = rng.random_range(0.0..0.5);
	format!("{property} {duration:.2}s {timing} {delay:.2}s")
}

fn random_clip_path(rng: &mut dyn RngCore) -> String {
	match rng.random_range(0..4) {
		0 => {
			let radius = random_length(rng, 25, 50, &["%"]);
			let x = random_length(rng, 25, 75, &["%"]);
			let y = random_length(rng, 25, 75, &["%"]);
			format!("circle({radius} at {x} {y})")
		}
		1 => {
			let rx = random_length(rng, 25, 50, &["%"]);
			let ry = random_length(rng, 25, 50, &["%"]);
			format!("ellipse({rx} {ry} at 50% 50%)")
		}
		2 => {
			let points: Vec<String> = (0..3)
				.map(|_| format!("{} {}", random_length(rng, 0, 100, &["%"]), random_length(rng, 0, 100, &["%"])))
				.collect();
			format!("polygon({})", points.join(", "))
		}
		_ => "inset(10% 20% 30% 40% round 10px)".to_owned(),
	}
}

/// Every CSS property the generator knows how to fill with a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssProperty {
	// Text & font
	Color,
	FontSize,
	FontFamily,
	FontStyle,
	FontWeight,
	FontVariant,
	TextAlign,
	TextDecoration,
	TextTransform,
	TextShadow,
	TextIndent,
	LineHeight,
	LetterSpacing,
	WordSpacing,
	WhiteSpace,
	WritingMode,
	// Box model
	Width,
	Height,
	Margin,
	Padding,
	Border,
	BorderRadius,
	BoxShadow,
	BoxSizing,
	// Positioning
	Position,
	Top,
	Right,
	Bottom,
	Left,
	Overflow,
	ZIndex,
	// Background
	BackgroundColor,
	BackgroundImage,
	BackgroundSize,
	BackgroundRepeat,
	BackgroundPosition,
	BackgroundBlendMode,
	BackgroundAttachment,
	// Flexbox
	Display,
	FlexDirection,
	JustifyContent,
	AlignItems,
	FlexWrap,
	FlexGrow,
	FlexShrink,
	Order,
	// Grid
	GridTemplateColumns,
	GridTemplateRows,
	GridGap,
	GridAutoFlow,
	GridColumn,
	GridRow,
	// Transitions
	Transition,
	// Visual effects
	Opacity,
	Cursor,
	Visibility,
	Transform,
	Filter,
	ClipPath,
	ObjectFit,
	Resize,
	ScrollBehavior,
	// SVG
	Fill,
	Stroke,
	StrokeWidth,
}

impl CssProperty {
	pub const ALL: [CssProperty; 65] = [
		CssProperty::Color,
		CssProperty::FontSize,
		CssProperty::FontFamily,
		CssProperty::FontStyle,
		CssProperty::FontWeight,
		CssProperty::FontVariant,
		CssProperty::TextAlign,
		CssProperty::TextDecoration,
		CssProperty::TextTransform,
		CssProperty::TextShadow,
		CssProperty::TextIndent,
		CssProperty::LineHeight,
		CssProperty::LetterSpacing,
		CssProperty::WordSpacing,
		CssProperty::WhiteSpace,
		CssProperty::WritingMode,
		CssProperty::Width,
		CssProperty::Height,
		CssProperty::Margin,
		CssProperty::Padding,
		CssProperty::Border,
		CssProperty::BorderRadius,
		CssProperty::BoxShadow,
		CssProperty::BoxSizing,
		CssProperty::Position,
		CssProperty::Top,
		CssProperty::Right,
		CssProperty::Bottom,
		CssProperty::Left,
		CssProperty::Overflow,
		CssProperty::ZIndex,
		CssProperty::BackgroundColor,
		CssProperty::BackgroundImage,
		CssProperty::BackgroundSize,
		CssProperty::BackgroundRepeat,
		CssProperty::BackgroundPosition,
		CssProperty::BackgroundBlendMode,
		CssProperty::BackgroundAttachment,
		CssProperty::Display,
		CssProperty::FlexDirection,
		CssProperty::JustifyContent,
		CssProperty::AlignItems,
		CssProperty::FlexWrap,
		CssProperty::FlexGrow,
		CssProperty::FlexShrink,
		CssProperty::Order,
		CssProperty::GridTemplateColumns,
		CssProperty::GridTemplateRows,
		CssProperty::GridGap,
		CssProperty::GridAutoFlow,
		CssProperty::GridColumn,
		CssProperty::GridRow,
		CssProperty::Transition,
		CssProperty::Opacity,
		CssProperty::Cursor,
		CssProperty::Visibility,
		CssProperty::Transform,
		CssProperty::Filter,
		CssProperty::ClipPath,
		CssProperty::ObjectFit,
		CssProperty::Resize,
		CssProperty::ScrollBehavior,
		CssProperty::Fill,
		CssProperty::Stroke,
		CssProperty::StrokeWidth,
	];

	pub fn name(self) -> &'static str {
		match self {
			CssProperty::Color => "color",
			CssProperty::FontSize => "font-size",
			CssProperty::FontFamily => "font-family",
			CssProperty::FontStyle => "font-style",
			CssProperty::FontWeight => "font-weight",
			CssProperty::FontVariant => "font-variant",
			CssProperty::TextAlign => "text-align",
			CssProperty::TextDecoration => "text-decoration",
			CssProperty::TextTransform => "text-transform",
			CssProperty::TextShadow => "text-shadow",
			CssProperty::TextIndent => "text-indent",
			CssProperty::LineHeight => "line-height",
			CssProperty::LetterSpacing => "letter-spacing",
			CssProperty::WordSpacing => "word-spacing",
			CssProperty::WhiteSpace => "white-space",
			CssProperty::WritingMode => "writing-mode",
			CssProperty::Width => "width",
			CssProperty::Height => "height",
			CssProperty::Margin => "margin",
			CssProperty::Padding => "padding",
			CssProperty::Border => "border",
			CssProperty::BorderRadius => "border-radius",
			CssProperty::BoxShadow => "box-shadow",
			CssProperty::BoxSizing => "box-sizing",
			CssProperty::Position => "position",
			CssProperty::Top => "top",
			CssProperty::Right => "right",
			CssProperty::Bottom => "bottom",
			CssProperty::Left => "left",
			CssProperty::Overflow => "overflow",
			CssProperty::ZIndex => "z-index",
			CssProperty::BackgroundColor => "background-color",
			CssProperty::BackgroundImage => "background-image",
			CssProperty::BackgroundSize => "background-size",
			CssProperty::BackgroundRepeat => "background-repeat",
			CssProperty::BackgroundPosition => "background-position",
			CssProperty::BackgroundBlendMode => "background-blend-mode",
			CssProperty::BackgroundAttachment => "background-attachment",
			CssProperty::Display => "display",
			CssProperty::FlexDirection => "flex-direction",
			CssProperty::JustifyContent => "justify-content",
			CssProperty::AlignItems => "align-items",
			CssProperty::FlexWrap => "flex-wrap",
			CssProperty::FlexGrow => "flex-grow",
			CssProperty::FlexShrink => "flex-shrink",
			CssProperty::Order => "order",
			CssProperty::GridTemplateColumns => "grid-template-columns",
			CssProperty::GridTemplateRows => "grid-template-rows",
			CssProperty::GridGap => "grid-gap",
			CssProperty::GridAutoFlow => "grid-auto-flow",
			CssProperty::GridColumn => "grid-column",
			CssProperty::GridRow => "grid-row",
			CssProperty::Transition => "transition",
			CssProperty::Opacity => "opacity",
			CssProperty::Cursor => "cursor",
			CssProperty::Visibility => "visibility",
			CssProperty::Transform => "transform",
			CssProperty::Filter => "filter",
			CssProperty::ClipPath => "clip-path",
			CssProperty::ObjectFit => "object-fit",
			CssProperty::Resize => "resize",
			CssProperty::ScrollBehavior => "scroll-behavior",
			CssProperty::Fill => "fill",
			CssProperty::Stroke => "stroke",
			CssProperty::StrokeWidth => "stroke-width",
		}
	}

	/// Generates a value matching this property's syntax.
	///
	/// Values never contain double quotes, so they are safe inside a
	/// `style="..."` attribute.
	pub fn random_value(self, rng: &mut dyn RngCore) -> String {
		let kw = |rng: &mut dyn RngCore, keywords: &[&str]| random_keyword(rng, keywords).to_owned();
		match self {
			CssProperty::Color => keyword_or(
				rng,
				&["red", "blue", "green", "purple", "orange", "pink", "brown", "black", "white"],
				random_hex_color,
			),
			CssProperty::FontSize => random_length(rng, 12, 48, &["px", "em", "rem"]),
			CssProperty::FontFamily => kw(
				rng,
				&[
					"'Arial', sans-serif",
					"'Georgia', serif",
					"'Courier New', monospace",
					"'Verdana', sans-serif",
					"'Times New Roman', serif",
				],
			),
			CssProperty::FontStyle => kw(rng, &["normal", "italic", "oblique"]),
			CssProperty::FontWeight => kw(rng, &["normal", "bold", "bolder", "lighter", "100", "400", "700", "900"]),
			CssProperty::FontVariant => kw(rng, &["normal", "small-caps"]),
			CssProperty::TextAlign => kw(rng, &["left", "right", "center", "justify"]),
			CssProperty::TextDecoration => {
				let line = random_keyword(rng, &["none", "underline", "overline", "line-through"]);
				let style = random_keyword(rng, &["solid", "wavy", "dotted"]);
				format!("{line} {style} {}", random_hex_color(rng))
			}
			CssProperty::TextTransform => kw(rng, &["none", "capitalize", "uppercase", "lowercase"]),
			CssProperty::TextShadow | CssProperty::BoxShadow => random_shadow(rng),
			CssProperty::TextIndent => random_length(rng, 0, 100, &["px", "%"]),
			CssProperty::LineHeight => random_float(rng, 1.0, 2.5),
			CssProperty::LetterSpacing => random_length(rng, -2, 10, &["px"]),
			CssProperty::WordSpacing => random_length(rng, 0, 15, &["px", "em"]),
			CssProperty::WhiteSpace => kw(rng, &["normal", "nowrap", "pre", "pre-wrap"]),
			CssProperty::WritingMode => kw(rng, &["horizontal-tb", "vertical-rl", "vertical-lr"]),
			CssProperty::Width => keyword_or(rng, &["auto"], |rng| random_length(rng, 20, 100, &["%", "px", "vw"])),
			CssProperty::Height => keyword_or(rng, &["auto"], |rng| random_length(rng, 20, 100, &["%", "px", "vh"])),
			CssProperty::Margin | CssProperty::Padding => random_shorthand_length(rng),
			CssProperty::Border => {
				let width = random_length(rng, 1, 12, &["px"]);
				let style = random_keyword(rng, &["solid", "dotted", "dashed", "double"]);
				format!("{width} {style} {}", random_hex_color(rng))
			}
			CssProperty::BorderRadius => random_length(rng, 0, 50, &["%", "px"]),
			CssProperty::BoxSizing => kw(rng, &["content-box", "border-box"]),
			CssProperty::Position => kw(rng, &["static", "relative", "absolute", "fixed", "sticky"]),
			CssProperty::Top | CssProperty::Right | CssProperty::Bottom | CssProperty::Left => {
				random_length(rng, -50, 100, &["px", "%"])
			}
			CssProperty::Overflow => kw(rng, &["visible", "hidden", "scroll", "auto"]),
			CssProperty::ZIndex => rng.random_range(-500..500).to_string(),
			CssProperty::BackgroundColor | CssProperty::Fill | CssProperty::Stroke => random_hex_color(rng),
			CssProperty::BackgroundImage => {
				let angle = rng.random_range(0..=360);
				let from = random_hex_color(rng);
				let to = random_hex_color(rng);
				format!("linear-gradient({angle}deg, {from}, {to})")
			}
			CssProperty::BackgroundSize => kw(rng, &["auto", "cover", "contain"]),
			CssProperty::BackgroundRepeat => kw(rng, &["repeat", "no-repeat", "repeat-x", "repeat-y"]),
			CssProperty::BackgroundPosition => {
				let x = random_length(rng, 0, 100, &["%"]);
				let y = random_length(rng, 0, 100, &["%"]);
				format!("{x} {y}")
			}
			CssProperty::BackgroundBlendMode => kw(
				rng,
				&["normal", "multiply", "screen", "overlay", "darken", "lighten", "color-dodge"],
			),
			CssProperty::BackgroundAttachment => kw(rng, &["scroll", "fixed", "local"]),
			CssProperty::Display => kw(rng, &["block", "inline", "inline-block", "flex", "grid", "none"]),
			CssProperty::FlexDirection => kw(rng, &["row", "row-reverse", "column", "column-reverse"]),
			CssProperty::JustifyContent => kw(
				rng,
				&["flex-start", "flex-end", "center", "space-between", "space-around", "space-evenly"],
			),
			CssProperty::AlignItems => kw(rng, &["stretch", "flex-start", "flex-end", "center", "baseline"]),
			CssProperty::FlexWrap => kw(rng, &["nowrap", "wrap", "wrap-reverse"]),
			CssProperty::FlexGrow | CssProperty::FlexShrink => rng.random_range(0..5).to_string(),
			CssProperty::Order => rng.random_range(-5..5).to_string(),
			CssProperty::GridTemplateColumns | CssProperty::GridTemplateRows => random_grid_template(rng),
			CssProperty::GridGap => random_length(rng, 0, 50, &["px", "em"]),
			CssProperty::GridAutoFlow => kw(rng, &["row", "column", "dense"]),
			CssProperty::GridColumn | CssProperty::GridRow => format!("span {}", rng.random_range(1..=3)),
			CssProperty::Transition => random_transition(rng),
			CssProperty::Opacity => random_float(rng, 0.1, 1.0),
			CssProperty::Cursor => kw(rng, &["pointer", "default", "wait", "text", "move", "help", "crosshair"]),
			CssProperty::Visibility => kw(rng, &["visible", "hidden", "collapse"]),
			CssProperty::Transform => {
				let rotate = rng.random_range(-180..=180);
				let scale = rng.random_range(0.5..2.0);
				let skew = rng.random_range(-45..=45);
				let translate = random_length(rng, -100, 100, &["px"]);
				format!("rotate({rotate}deg) scale({scale:.2}) skewX({skew}deg) translateX({translate})")
			}
			CssProperty::Filter => {
				let blur = rng.random_range(0..10);
				let brightness = rng.random_range(0.5..2.0);
				let saturate = rng.random_range(0..=200);
				format!("blur({blur}px) brightness({brightness:.1}) saturate({saturate}%)")
			}
			CssProperty::ClipPath => random_clip_path(rng),
			CssProperty::ObjectFit => kw(rng, &["fill", "contain", "cover", "none", "scale-down"]),
			CssProperty::Resize => kw(rng, &["none", "both", "horizontal", "vertical"]),
			CssProperty::ScrollBehavior => kw(rng, &["auto", "smooth"]),
			CssProperty::StrokeWidth => rng.random_range(1..=10).to_string(),
		}
	}
}

/// One random `property: value;` declaration.
pub fn generate_random_inline_css(rng: &mut dyn RngCore) -> String {
	let property = CssProperty::ALL[rng.random_range(0..CssProperty::ALL.len())];
	let value = property.random_value(rng);
	format!("{}: {};", property.name(), value)
}

/// `count` concatenated declarations. Non-positive counts yield `""`.
pub fn random_css_style(rng: &mut dyn RngCore, count: i64) -> String {
	(0..count.max(0)).map(|_| generate_random_inline_css(rng)).collect()
}

/// A complete `style="..."` attribute with `count` declarations.
pub fn random_inline_style(rng: &mut dyn RngCore, count: i64) -> String {
	format!("style=\"{}\"", random_css_style(rng, count))
}

/// Composition strategy for [`random_style_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleBlockKind {
	/// Flat single-purpose classes scoped under the parent.
	Utility,
	/// Deep `> div` chains with `:nth-child` and sibling combinators.
	Nested,
	/// Attribute selectors, pseudo-classes and pseudo-elements.
	Complex,
}

impl FromStr for StyleBlockKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"utility" => Ok(StyleBlockKind::Utility),
			"nested" => Ok(StyleBlockKind::Nested),
			"complex" => Ok(StyleBlockKind::Complex),
			other => Err(format!("unknown style block kind: {other}")),
		}
	}
}

/// A `<style>` element and the parent class its rules are scoped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
	pub style: String,
	pub class: String,
}

fn rule_body(rng: &mut dyn RngCore) -> String {
	let count = rng.random_range(3..=10);
	random_css_style(rng, count)
}

/// Builds `count` rules under a freshly generated parent class.
///
/// `None` (an unrecognized kind) yields a block with no rules.
pub fn random_style_block(
	rng: &mut dyn RngCore,
	corpus: &WordCorpus,
	kind: Option<StyleBlockKind>,
	count: i64,
) -> StyleBlock {
	let parent = format!("p{}", random_string_from_charset(rng, 12, LOWER_ALPHABET_CHARS));
	let mut style = String::from("<style>\n");

	for _ in 0..count.max(0) {
		match kind {
			Some(StyleBlockKind::Utility) => {
				let class = format!("u{}", random_string_from_charset(rng, 10, LOWER_ALPHABET_CHARS));
				let body = rule_body(rng);
				let _ = writeln!(style, ".{parent} .{class} {{ {body} }}");
			}
			Some(StyleBlockKind::Nested) => {
				let mut selector = format!(".{parent}");
				for _ in 0..rng.random_range(3..=10) {
					selector.push_str(" > div");
					if rng.random_bool(0.5) {
						let _ = write!(selector, ":nth-child({})", rng.random_range(1..=10));
					}
					if rng.random_bool(0.3) {
						selector.push_str(" + span");
					}
				}
				let body = rule_body(rng);
				let _ = writeln!(style, "{selector} {{ {body} }}");
			}
			Some(StyleBlockKind::Complex) => {
				let attr = format!("[data-{}=\"{}\"]", corpus.clean_word(rng), corpus.clean_word(rng));
				let pseudo = random_keyword(
					rng,
					&[
						"hover",
						"active",
						"focus",
						"nth-child(2)",
						"not(:last-child)",
						"first-of-type",
						"last-of-type",
						"nth-of-type(odd)",
						"nth-of-type(even)",
					],
				);
				let pseudo_element = if rng.random_bool(0.5) {
					format!("::{}", random_keyword(rng, &["before", "after", "marker", "selection"]))
				} else {
					String::new()
				};
				let combinator = if rng.random_bool(0.5) {
					format!(" > {}", random_keyword(rng, &["span", "b", "i", "u"]))
				} else {
					String::new()
				};
				let body = rule_body(rng);
				let _ = writeln!(style, ".{parent} {attr}:{pseudo}{pseudo_element}{combinator} {{ {body} }}");
			}
			None => break,
		}
	}

	style.push_str("</style>\n");
	StyleBlock { style, class: parent }
}

/// A `:root` block of chained custom properties.
///
/// `--v1` and `--v2` are fixed pixel values; every later variable is a
/// `calc()` over one to three earlier ones. Counts below 3 are raised to 3.
/// Chains longer than five may close a cycle from `--v1` back to the last
/// variable, which a resolver must detect.
pub fn random_css_vars(rng: &mut dyn RngCore, count: i64) -> String {
	let count = count.max(3);
	let mut out = String::from("<style>\n:root {\n");
	let _ = writeln!(out, "  --v1: {}px;", rng.random_range(1..=100));
	let _ = writeln!(out, "  --v2: {}px;", rng.random_range(1..=100));

	for i in 3..=count {
		let refs: Vec<String> = (0..rng.random_range(1..=3))
			.map(|_| format!("var(--v{})", rng.random_range(1..i)))
			.collect();
		let op = random_keyword(rng, &["+", "-", "*", "/", "min", "max"]);
		let constant = rng.random_range(1..=100);
		let expr = if op == "min" || op == "max" {
			format!("{op}({}, {constant}px)", refs.join(", "))
		} else {
			let mut expr = refs.join(format!(" {op} ").as_str());
			let _ = write!(expr, " {op} {constant}px");
			expr
		};
		let _ = writeln!(out, "  --v{i}: calc({expr});");
	}

	if count > 5 && rng.random_bool(0.1) {
		let _ = writeln!(out, "  --v1: calc(var(--v{count}) + 1px);");
	}

	out.push_str("}\n</style>");
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn inline_css_has_known_property_and_shape() {
		let names: Vec<&str> = CssProperty::ALL.iter().map(|p| p.name()).collect();
		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..500 {
			let decl = generate_random_inline_css(&mut rng);
			assert!(decl.ends_with(';'), "{decl}");
			let (property, value) = decl.split_once(": ").expect("declaration has a colon");
			assert!(names.contains(&property), "unknown property {property}");
			assert!(!value.trim_end_matches(';').is_empty());
			assert!(!decl.contains('"'), "{decl}");
		}
	}

	#[test]
	fn property_table_names_are_unique() {
		let mut names: Vec<&str> = CssProperty::ALL.iter().map(|p| p.name()).collect();
		names.sort();
		names.dedup();
		assert_eq!(names.len(), CssProperty::ALL.len());
	}

	#[test]
	fn every_property_generates_a_value() {
		let mut rng = StdRng::seed_from_u64(9);
		for property in CssProperty::ALL {
			for _ in 0..20 {
				assert!(!property.random_value(&mut rng).is_empty(), "{}", property.name());
			}
		}
	}

	#[test]
	fn inline_style_wraps_declarations() {
		let mut rng = StdRng::seed_from_u64(5);
		let style = random_inline_style(&mut rng, 4);
		assert!(style.starts_with("style=\""));
		assert!(style.ends_with('"'));
		assert_eq!(style.matches(';').count(), 4);
		assert_eq!(random_inline_style(&mut rng, -2), "style=\"\"");
	}

	#[test]
	fn style_blocks_scope_rules_under_parent() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(11);
		for kind in [StyleBlockKind::Utility, StyleBlockKind::Nested, StyleBlockKind::Complex] {
			let block = random_style_block(&mut rng, &corpus, Some(kind), 6);
			assert!(block.class.starts_with('p'));
			assert_eq!(block.class.len(), 13);
			let rules: Vec<&str> = block.style.lines().filter(|l| l.contains('{')).collect();
			assert_eq!(rules.len(), 6, "{:?}", kind);
			assert!(rules.iter().all(|r| r.starts_with(&format!(".{}", block.class))));
		}
	}

	#[test]
	fn nested_selectors_have_three_to_ten_levels() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(12);
		let block = random_style_block(&mut rng, &corpus, Some(StyleBlockKind::Nested), 30);
		for rule in block.style.lines().filter(|l| l.contains('{')) {
			let levels = rule.matches("> div").count();
			assert!((3..=10).contains(&levels), "{rule}");
		}
	}

	#[test]
	fn unknown_style_block_kind_is_empty() {
		assert!("sparkly".parse::<StyleBlockKind>().is_err());
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(1);
		let block = random_style_block(&mut rng, &corpus, None, 5);
		assert_eq!(block.style, "<style>\n</style>\n");
	}

	#[test]
	fn css_vars_with_three_entries() {
		let mut rng = StdRng::seed_from_u64(77);
		let out = random_css_vars(&mut rng, 3);
		let vars: Vec<&str> = out.lines().filter(|l| l.trim_start().starts_with("--v")).collect();
		assert_eq!(vars.len(), 3);

		for fixed in &vars[..2] {
			let value = fixed.split_once(": ").unwrap().1;
			let px = value.strip_suffix("px;").expect("fixed pixel value");
			assert!(px.parse::<u32>().is_ok(), "{fixed}");
		}

		let third = vars[2].trim();
		assert!(third.starts_with("--v3: calc("), "{third}");
		let referenced: Vec<&str> = third.match_indices("var(--v").map(|(i, _)| &third[i + 7..i + 8]).collect();
		assert!(!referenced.is_empty());
		assert!(referenced.iter().all(|r| *r == "1" || *r == "2"), "{third}");
	}

	#[test]
	fn css_vars_only_reference_earlier_variables() {
		let mut rng = StdRng::seed_from_u64(78);
		for _ in 0..20 {
			let out = random_css_vars(&mut rng, 12);
			for line in out.lines().map(str::trim).filter(|l| l.starts_with("--v")) {
				let (name, value) = line.split_once(": ").unwrap();
				let index: i64 = name[3..].parse().unwrap();
				for (pos, _) in value.match_indices("var(--v") {
					let digits: String = value[pos + 7..].chars().take_while(|c| c.is_ascii_digit()).collect();
					let target: i64 = digits.parse().unwrap();
					if index == 1 {
						assert_eq!(target, 12);
					} else {
						assert!(target < index, "{line}");
					}
				}
			}
		}
	}
}
