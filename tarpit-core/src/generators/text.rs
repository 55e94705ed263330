use rand::RngCore;

use super::corpus::WordCorpus;
use super::primitives::{capitalize, random_int};
use crate::model::MarkovChain;

/// How many paragraphs to produce and how long their parts are.
///
/// Bounds are half-open like [`random_int`]: a paragraph holds
/// `min_sentences..max_sentences` sentences, a sentence holds
/// `min_words..max_words` words. Empty ranges collapse onto their minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphShape {
	pub count: i64,
	pub min_sentences: i64,
	pub max_sentences: i64,
	pub min_words: i64,
	pub max_words: i64,
}

/// One Markov sentence of at most `max_words` words.
///
/// Without a model, or with a non-positive cap, the result is empty.
pub fn markov_sentence(rng: &mut dyn RngCore, model: Option<&MarkovChain>, max_words: i64) -> String {
	match model {
		Some(chain) if max_words > 0 => chain.generate_sentence(rng, max_words as usize),
		_ => String::new(),
	}
}

/// Paragraphs of Markov sentences. Paragraphs left without any sentence
/// are dropped, so a missing model yields `""`.
pub fn markov_paragraphs(rng: &mut dyn RngCore, model: Option<&MarkovChain>, shape: ParagraphShape) -> String {
	paragraphs(rng, shape, |rng, words| markov_sentence(rng, model, words))
}

/// A sentence of `len` uniformly sampled words, capitalized and period-terminated.
pub fn random_sentence(rng: &mut dyn RngCore, corpus: &WordCorpus, len: i64) -> String {
	if len <= 0 || corpus.is_empty() {
		return String::new();
	}

	let len = len as usize;
	let mut sentence = String::with_capacity(len * (corpus.avg_word_len() + 1));
	for i in 0..len {
		let word = corpus.random_word(rng);
		if i == 0 {
			sentence.push_str(&capitalize(word));
		} else {
			sentence.push(' ');
			sentence.push_str(word);
		}
	}
	sentence.push('.');
	sentence
}

/// Paragraphs of word-sampled sentences; works without any trained model.
pub fn random_paragraphs(rng: &mut dyn RngCore, corpus: &WordCorpus, shape: ParagraphShape) -> String {
	paragraphs(rng, shape, |rng, words| random_sentence(rng, corpus, words))
}

fn paragraphs<F>(rng: &mut dyn RngCore, shape: ParagraphShape, mut sentence: F) -> String
where
	F: FnMut(&mut dyn RngCore, i64) -> String,
{
	let mut out: Vec<String> = Vec::new();
	for _ in 0..shape.count.max(0) {
		let sentences = random_int(rng, shape.min_sentences, shape.max_sentences);
		let mut parts: Vec<String> = Vec::new();
		for _ in 0..sentences.max(0) {
			let words = random_int(rng, shape.min_words, shape.max_words);
			let s = sentence(rng, words);
			if !s.is_empty() {
				parts.push(s);
			}
		}
		if !parts.is_empty() {
			out.push(parts.join(" "));
		}
	}
	out.join("\n\n")
}
