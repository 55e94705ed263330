use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use serde::{Deserialize, Serialize};

use crate::error::TarpitError;
use super::chain::Token;

/// Represents a state in a word-level Markov chain.
///
/// A `State` corresponds to a fixed window of the last *order* tokens (`key`)
/// and stores all observed transitions from this window to the next token.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Sample the next token using weighted random sampling
/// - Merge with another state having the same key (parallel learning support)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct State {
	/// Identifier of the state (the last `order` tokens).
	key: Vec<Token>,
	/// Outgoing transitions indexed by the next token.
	/// Ordered so a seeded random source replays the same choices.
	transitions: BTreeMap<Token, usize>,
}

impl State {
	/// Creates a new empty state for the given window.
	pub fn new(key: &[Token]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: BTreeMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: Token) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	/// Total number of observations leaving this state.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Samples the next token; the probability of a token is proportional
	/// to its occurrence count.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict(&self, rng: &mut dyn RngCore) -> Option<&Token> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		for (next, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next);
			}
			r -= occurrence;
		}

		// Unreachable while counts sum to `total`.
		self.transitions.keys().next_back()
	}

	/// Merges another state into this one, summing occurrence counts.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), TarpitError> {
		if self.key != other.key {
			return Err(TarpitError::ModelMismatch("state key mismatch".to_owned()));
		}

		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(next.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
