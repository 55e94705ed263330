use thiserror::Error;

/// Errors surfaced by the core library.
///
/// Generators degrade silently on degenerate parameters, so most variants
/// come from loading and persisting data rather than from generation itself.
#[derive(Debug, Error)]
pub enum TarpitError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("model serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Two chains (or states) with different shapes cannot be merged.
	#[error("model mismatch: {0}")]
	ModelMismatch(String),

	/// Nested JSON has no safe empty structure, so a negative depth is rejected.
	#[error("depth cannot be negative, got {0}")]
	NegativeDepth(i64),
}
