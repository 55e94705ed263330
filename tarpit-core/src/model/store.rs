use std::path::Path;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use log::{info, warn};

use super::chain::{MarkovChain, TrainingOptions};

/// Shared holder of the current Markov chain.
///
/// Readers take a cheap snapshot with [`ModelStore::current`] and keep using
/// it for the whole render, even if a retrain swaps the model meanwhile.
/// Writers are serialized so that two concurrent retrains cannot lose each
/// other's sentences.
pub struct ModelStore {
	current: ArcSwapOption<MarkovChain>,
	writer: Mutex<()>,
}

impl Default for ModelStore {
	fn default() -> Self {
		Self::empty()
	}
}

impl ModelStore {
	/// A store without any trained model.
	pub fn empty() -> Self {
		Self {
			current: ArcSwapOption::empty(),
			writer: Mutex::new(()),
		}
	}

	pub fn new(chain: MarkovChain) -> Self {
		Self {
			current: ArcSwapOption::from_pointee(chain),
			writer: Mutex::new(()),
		}
	}

	/// Loads a persisted chain if `path` exists.
	///
	/// A missing or unreadable model is not fatal: the store starts empty
	/// and Markov macros render nothing until the next training.
	pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
		let path = path.as_ref();
		if !path.exists() {
			info!("No Markov model at {}, starting untrained", path.display());
			return Self::empty();
		}

		match MarkovChain::load(path) {
			Ok(chain) => {
				info!(
					"Loaded Markov model from {} (order {}, {} states)",
					path.display(),
					chain.order(),
					chain.state_count()
				);
				Self::new(chain)
			}
			Err(e) => {
				warn!("Failed to load Markov model {}: {e}", path.display());
				Self::empty()
			}
		}
	}

	/// Snapshot of the current model.
	pub fn current(&self) -> Option<Arc<MarkovChain>> {
		self.current.load_full()
	}

	pub fn replace(&self, chain: MarkovChain) {
		let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
		self.current.store(Some(Arc::new(chain)));
	}

	/// Adds `corpus` to the current model, or trains a fresh one if none exists.
	///
	/// The updated chain is published atomically and returned.
	pub fn retrain(&self, corpus: &str, options: &TrainingOptions) -> Arc<MarkovChain> {
		let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

		let chain = match self.current.load_full() {
			Some(existing) => {
				let mut chain = (*existing).clone();
				chain.add_corpus(corpus);
				chain
			}
			None => MarkovChain::train(corpus, options),
		};
		info!("Markov model now has {} states", chain.state_count());

		let chain = Arc::new(chain);
		self.current.store(Some(Arc::clone(&chain)));
		chain
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_store_has_no_model() {
		assert!(ModelStore::empty().current().is_none());
	}

	#[test]
	fn retrain_extends_existing_model() {
		let store = ModelStore::empty();
		let first = store.retrain("a b.", &TrainingOptions::default());
		let states = first.state_count();

		store.retrain("c d.", &TrainingOptions::default());
		let current = store.current().unwrap();
		assert!(current.state_count() > states);
		// The old snapshot is untouched.
		assert_eq!(first.state_count(), states);
	}

	#[test]
	fn missing_file_starts_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = ModelStore::load_or_empty(dir.path().join("absent.bin"));
		assert!(store.current().is_none());
	}

	#[test]
	fn corrupt_file_starts_empty() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
		assert!(ModelStore::load_or_empty(&path).current().is_none());
	}
}
