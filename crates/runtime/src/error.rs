//! Error taxonomy for sessions, provisioning, and query execution.

use dagger_protocol::{GraphQlError, ProtocolError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the runtime.
///
/// None of these are retried here. Retry policy, if any, belongs to the
/// engine behind the transport.
#[derive(Debug, Error)]
pub enum Error {
	/// Invalid or incomplete session configuration. Raised before any
	/// transport is created.
	#[error("configuration error: {0}")]
	Config(String),

	/// The response could not be reduced to a single value.
	#[error(transparent)]
	Flatten(ProtocolError),

	/// The engine CLI binary could not be located.
	#[error("engine session binary unavailable: {0}")]
	EngineSessionBinary(String),

	/// Starting the engine session failed.
	#[error("failed to provision engine session: {0}")]
	Provision(String),

	/// Network failure or unexpected HTTP status talking to the engine.
	#[error("transport error: {0}")]
	Transport(String),

	/// The engine rejected or failed to resolve the document.
	#[error("engine returned {} error(s): {}", .0.len(), join_messages(.0))]
	GraphQl(Vec<GraphQlError>),

	/// The engine answered with a body that is not a GraphQL response.
	#[error("invalid engine response: {0}")]
	InvalidResponse(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	pub fn is_config(&self) -> bool {
		matches!(self, Error::Config(_))
	}

	pub fn is_flatten(&self) -> bool {
		matches!(self, Error::Flatten(e) if e.is_too_many_nested_objects())
	}

	/// Returns `true` for failures obtaining or starting the engine.
	pub fn is_provision(&self) -> bool {
		matches!(self, Error::Provision(_) | Error::EngineSessionBinary(_))
	}

	/// Returns `true` for failures during `execute`, including engine-reported errors.
	pub fn is_transport(&self) -> bool {
		matches!(self, Error::Transport(_) | Error::GraphQl(_) | Error::InvalidResponse(_))
	}

	/// Engine-reported errors, when this is [`Error::GraphQl`].
	pub fn graphql_errors(&self) -> &[GraphQlError] {
		match self {
			Error::GraphQl(errors) => errors,
			_ => &[],
		}
	}
}

/// Ambiguous responses become [`Error::Flatten`]; malformed operations are
/// caller configuration mistakes.
impl From<ProtocolError> for Error {
	fn from(err: ProtocolError) -> Self {
		match err {
			ProtocolError::TooManyNestedObjects { .. } => Error::Flatten(err),
			ProtocolError::EmptyOperation => Error::Config(err.to_string()),
		}
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Transport(err.to_string())
	}
}

fn join_messages(errors: &[GraphQlError]) -> String {
	errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn graphql_errors_are_joined_in_message() {
		let err = Error::GraphQl(vec![GraphQlError::new("first"), GraphQlError::new("second")]);
		assert_eq!(err.to_string(), "engine returned 2 error(s): first; second");
		assert!(err.is_transport());
		assert_eq!(err.graphql_errors().len(), 2);
	}

	#[test]
	fn classification_helpers() {
		assert!(Error::Config("x".into()).is_config());
		assert!(Error::EngineSessionBinary("x".into()).is_provision());
		assert!(Error::Provision("x".into()).is_provision());
		assert!(!Error::Provision("x".into()).is_transport());

		let flatten: Error = ProtocolError::TooManyNestedObjects {
			path: String::new(),
			keys: 2,
		}
		.into();
		assert!(flatten.is_flatten());
		assert!(!Error::from(ProtocolError::EmptyOperation).is_flatten());
	}

	#[test]
	fn empty_operation_is_config_error() {
		let err = Error::from(ProtocolError::EmptyOperation);
		assert!(matches!(err, Error::Config(_)), "{err:?}");
		assert!(err.is_config());
	}
}
