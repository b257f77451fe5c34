//! Errors raised while building or reading query trees.

use thiserror::Error;

/// Errors produced by the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
	/// An operation node was constructed with an empty name.
	#[error("operation name must not be empty")]
	EmptyOperation,

	/// A response level had zero or several keys where a single-key chain was expected.
	///
	/// `path` is the dotted list of keys descended before the ambiguous level
	/// (empty when the root itself was ambiguous).
	#[error("too many nested objects inside graphql response at `{}` ({keys} keys)", display_path(.path))]
	TooManyNestedObjects { path: String, keys: usize },
}

/// Alias used where only the flattening failure is relevant.
pub type FlattenError = ProtocolError;

impl ProtocolError {
	/// Returns `true` for the flattening ambiguity error.
	pub fn is_too_many_nested_objects(&self) -> bool {
		matches!(self, ProtocolError::TooManyNestedObjects { .. })
	}
}

fn display_path(path: &str) -> &str {
	if path.is_empty() { "<root>" } else { path }
}
