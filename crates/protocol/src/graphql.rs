//! GraphQL-over-HTTP envelope types.
//!
//! Request body sent to the engine:
//! ```json
//! { "query": "{ container { from (address: \"alpine\") { stdout } } }" }
//! ```
//!
//! Response body:
//! ```json
//! { "data": { "container": { "from": { "stdout": "..." } } } }
//! ```
//!
//! Or, when the engine rejects the document:
//! ```json
//! {
//!   "data": null,
//!   "errors": [
//!     { "message": "exit code 1", "path": ["container", "from", "withExec"] }
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a GraphQL POST request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlRequest {
	pub query: String,
	#[serde(skip_serializing_if = "Option::is_none", rename = "operationName")]
	pub operation_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub variables: Option<Value>,
}

impl GraphQlRequest {
	/// Request carrying only a document.
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			operation_name: None,
			variables: None,
		}
	}
}

/// Body of a GraphQL response.
///
/// `data` and `errors` may both be present when the engine resolved part of
/// the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
	#[serde(default)]
	pub data: Option<Value>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}
}

/// Error entry reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
	pub message: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub locations: Vec<GraphQlLocation>,
	/// Response path; entries are field names or list indices.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub path: Vec<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<Value>,
}

impl GraphQlError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			locations: Vec::new(),
			path: Vec::new(),
			extensions: None,
		}
	}
}

impl fmt::Display for GraphQlError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.path.is_empty() {
			return f.write_str(&self.message);
		}
		let path: Vec<String> = self
			.path
			.iter()
			.map(|segment| match segment {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			})
			.collect();
		write!(f, "{} (at {})", self.message, path.join("."))
	}
}

/// Source position of an error within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlLocation {
	pub line: u32,
	pub column: u32,
}
