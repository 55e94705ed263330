use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::{Rng, RngCore};

use super::primitives::{LOWER_ALPHABET_CHARS, random_keyword, random_string_from_charset, reverse_string};

const UNARY_OPS: [&str; 20] = [
	"Math.sin(%s)", "Math.cos(%s)", "Math.tan(%s)", "Math.sqrt(%s)", "Math.log(%s)",
	"Math.abs(%s)", "Math.exp(%s)", "Math.sinh(%s)", "Math.cosh(%s)", "Math.tanh(%s)",
	"Math.asin(%s)", "Math.acos(%s)", "Math.atan(%s)", "Math.floor(%s)", "Math.ceil(%s)",
	"Math.round(%s)", "Math.trunc(%s)", "Math.fround(%s)", "Math.sign(%s)", "Math.cbrt(%s)",
];

const BINARY_OPS: [&str; 11] = [
	"(%s + %s)", "(%s - %s)", "(%s * %s)", "(%s / (%s+1))", "(%s % (%s+1))",
	"Math.pow(%s, %s)", "Math.max(%s, %s)", "Math.min(%s, %s)", "Math.atan2(%s, %s)",
	"Math.imul(%s, %s)", "Math.hypot(%s, %s)",
];

/// Leaves of the expression tree; all are in scope inside the waste loop.
pub const TERMINALS: [&str; 10] = ["i", "j", "waste", "i+j", "i-j", "i*j", "i/j", "j+1", "i%10", "j%10"];

/// A random JavaScript arithmetic expression of at most `depth` operator levels.
pub fn random_js_expr(rng: &mut dyn RngCore, depth: i32) -> String {
	if depth <= 0 || rng.random_bool(0.3) {
		return random_keyword(rng, &TERMINALS).to_owned();
	}

	if rng.random_bool(0.5) {
		let op = random_keyword(rng, &UNARY_OPS);
		let inner = random_js_expr(rng, depth - 1);
		fill_placeholders(op, &[inner])
	} else {
		let op = random_keyword(rng, &BINARY_OPS);
		let left = random_js_expr(rng, depth - 1);
		let right = random_js_expr(rng, depth - 1);
		fill_placeholders(op, &[left, right])
	}
}

/// Substitutes `%s` placeholders in order; any placeholder left over becomes `1`.
fn fill_placeholders(template: &str, operands: &[String]) -> String {
	let mut parts = template.split("%s");
	let mut out = String::from(parts.next().unwrap_or_default());
	for (i, part) in parts.enumerate() {
		match operands.get(i) {
			Some(operand) if !operand.trim().is_empty() => out.push_str(operand),
			_ => out.push('1'),
		}
		out.push_str(part);
	}
	out
}

/// Nested loop burning roughly 10^7 iterations of random arithmetic.
pub fn cpu_waste_script(rng: &mut dyn RngCore) -> String {
	let count = rng.random_range(3..=6);
	let statements: Vec<String> = (0..count)
		.map(|_| format!("waste+={};", random_js_expr(rng, 3)))
		.collect();

	format!(
		"let waste=0;\nfor(let i=0;i<1e5;i++){{\n  for(let j=0;j<100;j++){{\n    {}\n  }}\n}}\n",
		statements.join("\n    ")
	)
}

/// Converts the binary string `b` into `data` as UTF-8 text.
const UTF8_DECODE_JS: &str = "let data=new TextDecoder().decode(Uint8Array.from(b,c=>c.charCodeAt(0)));";

/// Reversible encodings hiding a payload from static extraction.
///
/// Every strategy produces ASCII safe to embed in a single-quoted JS string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObfuscationStrategy {
	Base64,
	ReversedBase64,
	Hex,
	DoubleBase64,
	/// Bytes XOR-ed with `key`, then base64. The key ships with the script.
	XorBase64 { key: u8 },
}

impl ObfuscationStrategy {
	/// Uniformly picks a strategy; the XOR key is drawn from 1..=255.
	pub fn random(rng: &mut dyn RngCore) -> Self {
		match rng.random_range(0..5) {
			0 => ObfuscationStrategy::Base64,
			1 => ObfuscationStrategy::ReversedBase64,
			2 => ObfuscationStrategy::Hex,
			3 => ObfuscationStrategy::DoubleBase64,
			_ => ObfuscationStrategy::XorBase64 { key: rng.random_range(1..=255) },
		}
	}

	pub fn encode(&self, content: &str) -> String {
		match self {
			ObfuscationStrategy::Base64 => STANDARD.encode(content),
			ObfuscationStrategy::ReversedBase64 => reverse_string(&STANDARD.encode(content)),
			ObfuscationStrategy::Hex => hex::encode(content),
			ObfuscationStrategy::DoubleBase64 => STANDARD.encode(STANDARD.encode(content)),
			ObfuscationStrategy::XorBase64 { key } => {
				let bytes: Vec<u8> = content.bytes().map(|b| b ^ key).collect();
				STANDARD.encode(bytes)
			}
		}
	}

	/// JavaScript reading `obf` and defining `data` as the decoded text.
	pub fn decode_script(&self) -> String {
		match self {
			ObfuscationStrategy::Base64 => format!("let b=atob(obf);\n{UTF8_DECODE_JS}"),
			ObfuscationStrategy::ReversedBase64 => {
				format!("let b=atob(obf.split('').reverse().join(''));\n{UTF8_DECODE_JS}")
			}
			ObfuscationStrategy::Hex => "let bytes=new Uint8Array(obf.length/2);\n\
				for(let i=0;i<obf.length;i+=2){bytes[i/2]=parseInt(obf.substr(i,2),16);}\n\
				let data=new TextDecoder().decode(bytes);"
				.to_owned(),
			ObfuscationStrategy::DoubleBase64 => format!("let b=atob(atob(obf));\n{UTF8_DECODE_JS}"),
			ObfuscationStrategy::XorBase64 { key } => format!(
				"let b=atob(obf);\n\
				let bytes=Uint8Array.from(b,c=>c.charCodeAt(0)^{key});\n\
				let data=new TextDecoder().decode(bytes);"
			),
		}
	}

	/// Mirror of [`decode_script`](Self::decode_script) in Rust.
	///
	/// Returns `None` if `encoded` is not a valid output of [`encode`](Self::encode).
	pub fn decode(&self, encoded: &str) -> Option<String> {
		let bytes = match self {
			ObfuscationStrategy::Base64 => STANDARD.decode(encoded).ok()?,
			ObfuscationStrategy::ReversedBase64 => STANDARD.decode(reverse_string(encoded)).ok()?,
			ObfuscationStrategy::Hex => hex::decode(encoded).ok()?,
			ObfuscationStrategy::DoubleBase64 => {
				let once = STANDARD.decode(encoded).ok()?;
				STANDARD.decode(once).ok()?
			}
			ObfuscationStrategy::XorBase64 { key } => STANDARD
				.decode(encoded)
				.ok()?
				.into_iter()
				.map(|b| b ^ key)
				.collect(),
		};
		String::from_utf8(bytes).ok()
	}
}

/// Keeps the tag name to ASCII alphanumerics, falling back to `div`.
fn sanitize_tag(tag: &str) -> String {
	let tag: String = tag.chars().filter(char::is_ascii_alphanumeric).collect();
	if tag.is_empty() { "div".to_owned() } else { tag }
}

/// An empty `<tag>` placeholder plus a script that burns CPU, decodes the
/// obfuscated `content` and injects it into the placeholder.
pub fn js_interactive_content(rng: &mut dyn RngCore, tag: &str, content: &str) -> String {
	let tag = sanitize_tag(tag);
	let placeholder = format!("ph{}", random_string_from_charset(rng, 12, LOWER_ALPHABET_CHARS));
	let waste = cpu_waste_script(rng);
	let strategy = ObfuscationStrategy::random(rng);

	format!(
		"<{tag} id=\"{placeholder}\"></{tag}>\n<script>(function(){{\n{waste}\nlet obf='{}';\n{}\ndocument.getElementById('{placeholder}').innerHTML=data;\n}})();</script>",
		strategy.encode(content),
		strategy.decode_script(),
	)
}
