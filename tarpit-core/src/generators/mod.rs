//! Content generators.
//!
//! Every function takes an explicit `&mut dyn RngCore`. A render owns one
//! independent generator, so concurrent requests never share random state.

/// Charsets, random strings, colors, identifiers and keyword picks.
pub mod primitives;

/// Immutable word list sampled by the text and markup generators.
pub mod corpus;

/// CSS property table, inline declarations, style blocks and variable chains.
pub mod css;

/// Recursive container, table, form and definition-list builders.
pub mod structure;

/// Fractal paths and shuffled SVG filter chains.
pub mod svg;

/// CPU-waste expressions and reversible payload obfuscation.
pub mod script;

/// Markov and word-sampled sentences and paragraphs.
pub mod text;

/// Typed strings, dates, JSON documents and links.
pub mod content;
