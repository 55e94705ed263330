use std::path::Path;

use rand::{Rng, RngCore};

use crate::error::TarpitError;
use crate::io::read_file;

/// Word list compiled into the binary, one word per line.
const EMBEDDED_WORDS: &str = include_str!("../../data/words.txt");

/// Immutable ordered list of words, loaded once and sampled uniformly.
///
/// # Invariants
/// - Never mutated after construction
/// - Blank lines are dropped, surrounding whitespace is trimmed
#[derive(Debug, Clone)]
pub struct WordCorpus {
	words: Vec<String>,
	avg_word_len: usize,
}

impl WordCorpus {
	/// Builds a corpus from arbitrary lines.
	pub fn from_lines<I, S>(lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let words: Vec<String> = lines
			.into_iter()
			.map(|line| line.as_ref().trim().to_owned())
			.filter(|line| !line.is_empty())
			.collect();
		let total: usize = words.iter().map(String::len).sum();
		let avg_word_len = if words.is_empty() { 0 } else { total / words.len() };
		Self { words, avg_word_len }
	}

	/// The word list shipped with the crate.
	pub fn embedded() -> Self {
		Self::from_lines(EMBEDDED_WORDS.lines())
	}

	/// Loads a word list from a text file, one word per line.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TarpitError> {
		let corpus = Self::from_lines(read_file(&path)?);
		log::info!("Loaded {} words from {}", corpus.len(), path.as_ref().display());
		Ok(corpus)
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	/// Average word length in bytes, used to pre-size output buffers.
	pub fn avg_word_len(&self) -> usize {
		self.avg_word_len
	}

	/// A uniformly sampled word, exactly as stored. `""` if the corpus is empty.
	pub fn random_word(&self, rng: &mut dyn RngCore) -> &str {
		if self.words.is_empty() {
			return "";
		}
		&self.words[rng.random_range(0..self.words.len())]
	}

	/// A uniformly sampled word reduced to ASCII alphanumerics.
	///
	/// Safe to embed in attribute names, attribute values and URL paths.
	pub fn clean_word(&self, rng: &mut dyn RngCore) -> String {
		clean_string(self.random_word(rng))
	}
}

impl Default for WordCorpus {
	fn default() -> Self {
		Self::embedded()
	}
}

/// Keeps ASCII letters, digits and spaces.
pub fn clean_string(s: &str) -> String {
	s.chars()
		.filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
		.collect()
}
