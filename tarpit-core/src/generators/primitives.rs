use rand::{Rng, RngCore};

pub const UPPER_HEX_CHARS: &str = "0123456789ABCDEF";
pub const LOWER_HEX_CHARS: &str = "0123456789abcdef";
pub const UPPER_ALPHABET_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWER_ALPHABET_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
pub const ALPHABET_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
pub const NUMERIC_CHARS: &str = "0123456789";
pub const MIXED_DIGIT_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Builds a string of `length` characters drawn uniformly from `charset`.
///
/// An empty charset yields an empty string.
pub fn random_string_from_charset(rng: &mut dyn RngCore, length: usize, charset: &str) -> String {
	let chars: Vec<char> = charset.chars().collect();
	if chars.is_empty() {
		return String::new();
	}
	(0..length)
		.map(|_| chars[rng.random_range(0..chars.len())])
		.collect()
}

/// Picks one keyword uniformly. Returns `""` for an empty slice.
pub fn random_keyword<'a>(rng: &mut dyn RngCore, keywords: &[&'a str]) -> &'a str {
	if keywords.is_empty() {
		return "";
	}
	keywords[rng.random_range(0..keywords.len())]
}

/// Random `#rrggbb` color.
pub fn random_hex_color(rng: &mut dyn RngCore) -> String {
	format!("#{:06x}", rng.random_range(0..0xFF_FFFF_u32))
}

/// Random element identifier: `prefix-` followed by `length` alphanumerics.
///
/// Uniqueness is local and probabilistic; nothing tracks issued ids.
pub fn random_id(rng: &mut dyn RngCore, prefix: &str, length: usize) -> String {
	format!("{prefix}-{}", random_string_from_charset(rng, length, MIXED_DIGIT_CHARS))
}

/// Uniform integer in `[min, max)`; `min` when the range is empty.
pub fn random_int(rng: &mut dyn RngCore, min: i64, max: i64) -> i64 {
	if max <= min {
		return min;
	}
	rng.random_range(min..max)
}

/// Reverses a string by characters.
pub fn reverse_string(s: &str) -> String {
	s.chars().rev().collect()
}

/// Upper-cases the first character.
pub fn capitalize(s: &str) -> String {
	let mut c = s.chars();
	match c.next() {
		None => String::new(),
		Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
	}
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}
