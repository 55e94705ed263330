use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::TarpitError;

/// Corpora with fewer sentences than this are trained on the calling thread.
const PARALLEL_THRESHOLD: usize = 512;

/// A single element of a training sequence.
///
/// Sentences are framed by sentinels so generation knows where a sentence
/// may begin and where it is allowed to stop. Keeping the sentinels out of
/// the word alphabet means no corpus text can ever collide with them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
	Start,
	Word(String),
	End,
}

/// Parameters steering how a chain is built from raw text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingOptions {
	/// Highest order considered by the automatic order selection.
	pub max_order: usize,
	/// Minimum average number of samples per distinct state for an order
	/// to be kept.
	pub min_samples_per_state: f64,
}

impl Default for TrainingOptions {
	fn default() -> Self {
		Self {
			max_order: 5,
			min_samples_per_state: 2.0,
		}
	}
}

/// Word-level Markov chain.
///
/// # Invariants
/// - `order` is always >= 1
/// - Every key in `states` has exactly `order` tokens
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MarkovChain {
	order: usize,
	states: HashMap<Vec<Token>, State>,
}

impl MarkovChain {
	/// Creates an empty chain. An order of zero is raised to one.
	pub fn new(order: usize) -> Self {
		Self {
			order: order.max(1),
			states: HashMap::new(),
		}
	}

	/// Builds a chain from `corpus`, picking the order automatically.
	pub fn train(corpus: &str, options: &TrainingOptions) -> Self {
		let order = Self::select_order(corpus, options.max_order, options.min_samples_per_state);
		info!("Training Markov chain of order {order}");

		let mut chain = Self::new(order);
		chain.add_corpus(corpus);
		chain
	}

	/// Picks the highest order whose n-grams are still observed on average
	/// at least `min_samples` times.
	///
	/// Tokens are the whitespace-separated words of the whole corpus.
	/// Defaults to 1 when no order qualifies.
	pub fn select_order(corpus: &str, max_order: usize, min_samples: f64) -> usize {
		let tokens: Vec<&str> = corpus.split_whitespace().collect();
		let mut best = 1;

		for order in 1..=max_order {
			if tokens.len() < order {
				break;
			}
			let distinct: HashSet<&[&str]> = tokens.windows(order).collect();
			if distinct.is_empty() {
				break;
			}
			let average = (tokens.len() - order + 1) as f64 / distinct.len() as f64;
			debug!("order {order}: {} distinct states, {average:.2} samples each", distinct.len());
			if average < min_samples {
				break;
			}
			best = order;
		}

		best
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct states learned so far.
	pub fn state_count(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Adds every sentence of `corpus` to the chain, keeping the current order.
	///
	/// Sentences are delimited by periods. Large corpora are split in chunks
	/// learned on worker threads, then merged back.
	pub fn add_corpus(&mut self, corpus: &str) {
		let sentences: Vec<&str> = sentences(corpus).collect();
		if sentences.len() < PARALLEL_THRESHOLD {
			for sentence in sentences {
				self.add_sentence(sentence);
			}
			return;
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = sentences.len().div_ceil(chunks);
		let order = self.order;

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for chunk in sentences.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial = MarkovChain::new(order);
					for sentence in chunk {
						partial.add_sentence(sentence);
					}
					// The receiver outlives the scope.
					let _ = tx.send(partial);
				});
			}
		});
		drop(tx);

		for partial in rx.iter() {
			// Partial chains share our order, so merging cannot fail.
			let _ = self.merge(&partial);
		}
	}

	/// Learns a single sentence. Empty sentences are ignored.
	pub fn add_sentence(&mut self, sentence: &str) {
		let words = sentence.split_whitespace().map(|w| Token::Word(w.to_owned()));
		let mut sequence: Vec<Token> = vec![Token::Start; self.order];
		sequence.extend(words);
		if sequence.len() == self.order {
			return;
		}
		sequence.push(Token::End);

		for window in sequence.windows(self.order + 1) {
			let (key, next) = window.split_at(self.order);
			self.states
				.entry(key.to_vec())
				.or_insert_with(|| State::new(key))
				.add_transition(next[0].clone());
		}
	}

	/// Merges another chain of the same order into this one.
	///
	/// # Errors
	/// Returns an error if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), TarpitError> {
		if self.order != other.order {
			return Err(TarpitError::ModelMismatch(format!(
				"order {} cannot absorb order {}",
				self.order, other.order
			)));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}

	/// Samples the token following `window`, or `None` if the window was never observed.
	pub fn next_token(&self, window: &[Token], rng: &mut dyn RngCore) -> Option<&Token> {
		self.states.get(window)?.predict(rng)
	}

	/// Generates one sentence of at most `max_words` words, ending with a period.
	///
	/// Generation stops early on the end sentinel or on an unknown window.
	/// Returns an empty string if no word could be produced.
	pub fn generate_sentence(&self, rng: &mut dyn RngCore, max_words: usize) -> String {
		let mut window = vec![Token::Start; self.order];
		let mut words: Vec<String> = Vec::new();

		while words.len() < max_words {
			let Some(Token::Word(word)) = self.next_token(&window, rng) else {
				break;
			};
			words.push(word.clone());
			window.remove(0);
			window.push(Token::Word(word.clone()));
		}

		if words.is_empty() {
			return String::new();
		}
		let mut sentence = words.join(" ");
		sentence.push('.');
		sentence
	}

	/// Loads a chain serialized with [`MarkovChain::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TarpitError> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Persists the chain in a compact binary form.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TarpitError> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}
}

/// Splits a corpus into trimmed, non-empty sentences.
fn sentences(corpus: &str) -> impl Iterator<Item = &str> {
	corpus.split('.').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn single_sentence_replays_exactly() {
		let mut chain = MarkovChain::new(1);
		chain.add_corpus("a b c.");
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(chain.generate_sentence(&mut rng, 100), "a b c.");
	}

	#[test]
	fn generation_respects_word_cap() {
		let mut chain = MarkovChain::new(1);
		chain.add_corpus("one two three four five six seven eight.");
		let mut rng = StdRng::seed_from_u64(2);
		let sentence = chain.generate_sentence(&mut rng, 3);
		assert_eq!(sentence, "one two three.");
		assert_eq!(chain.generate_sentence(&mut rng, 0), "");
	}

	#[test]
	fn empty_chain_generates_nothing() {
		let chain = MarkovChain::new(2);
		let mut rng = StdRng::seed_from_u64(3);
		assert_eq!(chain.generate_sentence(&mut rng, 10), "");
	}

	#[test]
	fn sentences_are_split_on_periods() {
		let mut chain = MarkovChain::new(1);
		chain.add_corpus("  . first one . . second .");
		// [Start] plus one state per word.
		assert_eq!(chain.state_count(), 4);
	}

	#[test]
	fn order_selection() {
		assert_eq!(MarkovChain::select_order("", 5, 2.0), 1);
		// Every word distinct: even order 1 averages one sample per state.
		assert_eq!(MarkovChain::select_order("a b c d e", 5, 2.0), 1);
		let repetitive = "the cat sat ".repeat(50);
		assert_eq!(MarkovChain::select_order(&repetitive, 3, 2.0), 3);
		assert_eq!(MarkovChain::select_order(&repetitive, 0, 2.0), 1);
	}

	#[test]
	fn trained_tiny_corpus_uses_order_one() {
		let options = TrainingOptions { max_order: 5, min_samples_per_state: 100.0 };
		let chain = MarkovChain::train("a b c.", &options);
		assert_eq!(chain.order(), 1);

		let mut rng = StdRng::seed_from_u64(8);
		for _ in 0..20 {
			let sentence = chain.generate_sentence(&mut rng, 10);
			let words = sentence.trim_end_matches('.');
			assert!(!words.is_empty());
			for word in words.split_whitespace() {
				assert!(["a", "b", "c"].contains(&word), "{sentence}");
			}
		}
	}

	#[test]
	fn zero_order_is_raised() {
		assert_eq!(MarkovChain::new(0).order(), 1);
	}

	#[test]
	fn parallel_training_matches_sequential() {
		let corpus = "alpha beta gamma. beta gamma delta. ".repeat(PARALLEL_THRESHOLD);
		let mut parallel = MarkovChain::new(2);
		parallel.add_corpus(&corpus);

		let mut sequential = MarkovChain::new(2);
		for sentence in sentences(&corpus) {
			sequential.add_sentence(sentence);
		}

		assert_eq!(parallel.state_count(), sequential.state_count());
		let key = vec![Token::Start, Token::Start];
		assert_eq!(
			parallel.states[&key].total(),
			sequential.states[&key].total()
		);
	}

	#[test]
	fn merge_rejects_order_mismatch() {
		let mut a = MarkovChain::new(1);
		let b = MarkovChain::new(2);
		assert!(a.merge(&b).is_err());
	}

	#[test]
	fn save_and_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		let mut chain = MarkovChain::new(1);
		chain.add_corpus("hello there.");
		chain.save(&path).unwrap();

		let loaded = MarkovChain::load(&path).unwrap();
		let mut rng = StdRng::seed_from_u64(5);
		assert_eq!(loaded.generate_sentence(&mut rng, 10), "hello there.");
	}
}
