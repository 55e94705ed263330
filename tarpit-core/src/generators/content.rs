use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use super::corpus::WordCorpus;
use super::primitives::{
	ALPHABET_CHARS, LOWER_HEX_CHARS, MIXED_DIGIT_CHARS, UPPER_HEX_CHARS, random_int,
	random_keyword, random_string_from_charset,
};
use crate::error::TarpitError;

/// Utility classes mixed into elements to look like a real CSS framework.
const CLASS_NAMES: [&str; 11] = [
	"mx-auto", "flex", "max-w-sm", "items-center", "gap-x-4", "rounded-xl", "bg-white", "p-6",
	"shadow-lg", "outline", "outline-black",
];

/// Attempts at drawing a first path segment outside the whitelist.
const WHITELIST_ATTEMPTS: usize = 32;

/// A typed random string.
///
/// Kinds: `username`, `email`, `uuid`, `hex` and `alphanum`. Only the last
/// two use `len`. Unknown kinds yield `""`.
pub fn random_string(rng: &mut dyn RngCore, corpus: &WordCorpus, kind: &str, len: i64) -> String {
	let len = len.max(0) as usize;
	match kind {
		"username" => format!("{}{}", corpus.clean_word(rng), corpus.clean_word(rng)),
		"email" => format!("{}{}@gmail.com", corpus.clean_word(rng), corpus.clean_word(rng)),
		"uuid" => [8, 4, 4, 4, 12]
			.iter()
			.map(|n| random_string_from_charset(rng, *n, LOWER_HEX_CHARS))
			.collect::<Vec<_>>()
			.join("-"),
		"hex" => random_string_from_charset(rng, len, UPPER_HEX_CHARS),
		"alphanum" => random_string_from_charset(rng, len, MIXED_DIGIT_CHARS),
		_ => String::new(),
	}
}

/// Parses a date or date-time; date-only formats are taken at midnight.
fn parse_date(value: &str, format: &str) -> Option<NaiveDateTime> {
	NaiveDateTime::parse_from_str(value, format)
		.ok()
		.or_else(|| NaiveDate::parse_from_str(value, format).ok()?.and_hms_opt(0, 0, 0))
}

/// A random instant between `start` and `end`, both parsed and rendered
/// with the strftime-style `format`.
///
/// Unparseable bounds or `start > end` yield `""`.
pub fn random_date(rng: &mut dyn RngCore, format: &str, start: &str, end: &str) -> String {
	let (Some(start), Some(end)) = (parse_date(start, format), parse_date(end, format)) else {
		return String::new();
	};
	if start > end {
		return String::new();
	}

	let delta = (end - start).num_seconds();
	let instant = if delta > 0 {
		start + chrono::Duration::seconds(rng.random_range(0..delta))
	} else {
		start
	};

	let mut out = String::new();
	match write!(out, "{}", instant.format(format)) {
		Ok(()) => out,
		Err(_) => String::new(),
	}
}

fn random_json_value(rng: &mut dyn RngCore, depth: i64, max_elements: usize, max_string_len: usize) -> Value {
	if depth <= 0 {
		return match rng.random_range(0..3) {
			0 => {
				let len = rng.random_range(1..=max_string_len);
				Value::String(random_string_from_charset(rng, len, MIXED_DIGIT_CHARS))
			}
			1 => Value::from(rng.random_range(0..100_i64)),
			_ => Value::Bool(rng.random_bool(0.5)),
		};
	}

	let count = rng.random_range(1..=max_elements);
	if rng.random_bool(0.5) {
		let mut object = Map::new();
		for _ in 0..count {
			let key = random_string_from_charset(rng, 5, MIXED_DIGIT_CHARS);
			object.insert(key, random_json_value(rng, depth - 1, max_elements, max_string_len));
		}
		Value::Object(object)
	} else {
		Value::Array(
			(0..count)
				.map(|_| random_json_value(rng, depth - 1, max_elements, max_string_len))
				.collect(),
		)
	}
}

/// A pretty-printed random JSON document nested `depth` levels deep.
///
/// Containers hold `1..=max_elements` children, strings are
/// `1..=max_string_len` characters long.
///
/// # Errors
/// Returns [`TarpitError::NegativeDepth`] if `depth < 0`.
pub fn random_json(
	rng: &mut dyn RngCore,
	depth: i64,
	max_elements: i64,
	max_string_len: i64,
) -> Result<String, TarpitError> {
	if depth < 0 {
		return Err(TarpitError::NegativeDepth(depth));
	}

	let value = random_json_value(
		rng,
		depth,
		max_elements.max(1) as usize,
		max_string_len.max(1) as usize,
	);
	Ok(serde_json::to_string_pretty(&value)?)
}

/// Where generated links point and which paths they must avoid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
	/// Scheme and authority prefixed to every link, without trailing slash.
	pub hostname: String,
	/// Paths served by something else; generated links never start with one.
	pub path_whitelist: Vec<String>,
	pub min_subpaths: i64,
	pub max_subpaths: i64,
}

impl Default for LinkSettings {
	fn default() -> Self {
		Self {
			hostname: "http://localhost:8080".to_owned(),
			path_whitelist: Vec::new(),
			min_subpaths: 1,
			max_subpaths: 5,
		}
	}
}

fn first_segment(rng: &mut dyn RngCore, corpus: &WordCorpus, settings: &LinkSettings) -> String {
	for _ in 0..WHITELIST_ATTEMPTS {
		let word = corpus.clean_word(rng);
		let path = format!("/{word}");
		if !word.is_empty() && !settings.path_whitelist.contains(&path) {
			return word;
		}
	}
	// Every sampled word was taken; a random token cannot collide in practice.
	random_string_from_charset(rng, 12, ALPHABET_CHARS)
}

/// A link back into the tarpit: `hostname/word/[word/...]`.
///
/// The path has between `min_subpaths` and `max_subpaths - 1` segments,
/// and never less than one.
pub fn random_link(rng: &mut dyn RngCore, corpus: &WordCorpus, settings: &LinkSettings) -> String {
	let mut link = format!("{}/{}/", settings.hostname, first_segment(rng, corpus, settings));

	let segments = random_int(rng, settings.min_subpaths, settings.max_subpaths);
	for _ in 1..segments.max(1) {
		link.push_str(&corpus.clean_word(rng));
		link.push('/');
	}
	link
}

/// A [`random_link`] followed by `key_count` random query parameters.
pub fn random_query_link(
	rng: &mut dyn RngCore,
	corpus: &WordCorpus,
	settings: &LinkSettings,
	key_count: i64,
) -> String {
	let mut link = random_link(rng, corpus, settings);
	link.push('?');
	for i in 0..key_count.max(0) {
		if i > 0 {
			link.push('&');
		}
		let value_len = rng.random_range(5..=20);
		let _ = write!(
			link,
			"{}={}",
			corpus.clean_word(rng),
			random_string_from_charset(rng, value_len, ALPHABET_CHARS)
		);
	}
	link
}

/// `count` space-separated framework-looking class names.
pub fn random_classes(rng: &mut dyn RngCore, count: i64) -> String {
	(0..count.max(0))
		.map(|_| random_keyword(rng, &CLASS_NAMES))
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn string_kinds() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(0);

		let uuid = random_string(&mut rng, &corpus, "uuid", 0);
		let groups: Vec<usize> = uuid.split('-').map(str::len).collect();
		assert_eq!(groups, vec![8, 4, 4, 4, 12]);

		let hex = random_string(&mut rng, &corpus, "hex", 10);
		assert_eq!(hex.len(), 10);
		assert!(hex.chars().all(|c| UPPER_HEX_CHARS.contains(c)));

		assert!(random_string(&mut rng, &corpus, "email", 0).ends_with("@gmail.com"));
		assert_eq!(random_string(&mut rng, &corpus, "alphanum", 7).len(), 7);
		assert_eq!(random_string(&mut rng, &corpus, "nope", 7), "");
	}

	#[test]
	fn dates_stay_in_range() {
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..50 {
			let date = random_date(&mut rng, "%Y-%m-%d", "2020-01-01", "2020-12-31");
			assert!(date.as_str() >= "2020-01-01" && date.as_str() <= "2020-12-31", "{date}");
		}
		assert_eq!(random_date(&mut rng, "%Y-%m-%d", "2020-01-01", "2020-01-01"), "2020-01-01");
	}

	#[test]
	fn invalid_dates_are_empty() {
		let mut rng = StdRng::seed_from_u64(2);
		assert_eq!(random_date(&mut rng, "%Y-%m-%d", "garbage", "2020-01-01"), "");
		assert_eq!(random_date(&mut rng, "%Y-%m-%d", "2021-01-01", "2020-01-01"), "");
	}

	#[test]
	fn json_depth() {
		let mut rng = StdRng::seed_from_u64(3);
		assert!(matches!(random_json(&mut rng, -1, 3, 5), Err(TarpitError::NegativeDepth(-1))));

		let leaf: Value = serde_json::from_str(&random_json(&mut rng, 0, 3, 5).unwrap()).unwrap();
		assert!(!leaf.is_object() && !leaf.is_array());

		let nested: Value = serde_json::from_str(&random_json(&mut rng, 2, 3, 5).unwrap()).unwrap();
		assert!(nested.is_object() || nested.is_array());
	}

	#[test]
	fn links_avoid_whitelisted_paths() {
		let corpus = WordCorpus::from_lines(["admin", "blog"]);
		let settings = LinkSettings {
			hostname: "https://example.org".to_owned(),
			path_whitelist: vec!["/admin".to_owned()],
			min_subpaths: 2,
			max_subpaths: 4,
		};
		let mut rng = StdRng::seed_from_u64(4);
		for _ in 0..20 {
			let link = random_link(&mut rng, &corpus, &settings);
			assert!(link.starts_with("https://example.org/blog/"), "{link}");
			let segments = link.trim_end_matches('/').split('/').count() - 3;
			assert!((2..4).contains(&segments), "{link}");
		}
	}

	#[test]
	fn fully_whitelisted_corpus_still_links() {
		let corpus = WordCorpus::from_lines(["admin"]);
		let settings = LinkSettings {
			path_whitelist: vec!["/admin".to_owned()],
			..LinkSettings::default()
		};
		let mut rng = StdRng::seed_from_u64(5);
		let link = random_link(&mut rng, &corpus, &settings);
		assert!(!link.starts_with("http://localhost:8080/admin/"));
	}

	#[test]
	fn query_link_keys() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(6);
		let link = random_query_link(&mut rng, &corpus, &LinkSettings::default(), 3);
		let query = link.split_once('?').unwrap().1;
		assert_eq!(query.split('&').count(), 3);
	}

	#[test]
	fn classes_count() {
		let mut rng = StdRng::seed_from_u64(7);
		assert_eq!(random_classes(&mut rng, 4).split(' ').count(), 4);
		assert_eq!(random_classes(&mut rng, 0), "");
	}
}
