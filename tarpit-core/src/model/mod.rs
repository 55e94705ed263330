//! Word-level Markov text model.
//!
//! - Sentinel-framed tokens (`Token`)
//! - Internal state management (`State`)
//! - The chain itself, with automatic order selection (`MarkovChain`)
//! - An atomically swappable holder for the live model (`ModelStore`)

/// Word-level chain: training, merging, generation and persistence.
pub mod chain;

/// Internal representation of a single chain state.
///
/// Tracks outgoing transitions and supports weighted random sampling.
/// This module is not exposed publicly.
mod state;

/// Shared, hot-swappable model holder.
pub mod store;

pub use chain::{MarkovChain, Token, TrainingOptions};
pub use store::ModelStore;
