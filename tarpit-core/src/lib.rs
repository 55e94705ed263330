//! Adversarial content-generation library for scraper tarpits.
//!
//! This crate synthesizes markup that is cheap for a browser to display but
//! expensive for a crawler to fetch, parse or mine:
//! - Recursive HTML structure (nested containers, tables, forms)
//! - Randomized CSS values, style blocks and self-referencing variable chains
//! - SVG fractals and shuffled filter chains
//! - CPU-burning scripts that reveal obfuscated content only when executed
//! - Synthetic text from an order-selecting Markov chain or a word corpus
//!
//! Every generator takes an explicit random source, so a caller decides
//! whether output is reproducible (seeded) or not. The core has no knowledge
//! of clients, persistence or networking.

/// Error types shared by the generators and the text model.
pub mod error;

/// Markup, style, graphics, script and text generators.
pub mod generators;

/// Named macro registry and the template compiler/renderer built on it.
pub mod macros;

/// Markov chain text model and its atomically swappable store.
pub mod model;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::TarpitError;
