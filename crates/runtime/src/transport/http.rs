//! GraphQL over HTTP.

use dagger_protocol::{GraphQlRequest, GraphQlResponse};
use serde_json::Value;
use tracing::{debug, trace};

use super::{ConnectParams, ExecuteFuture, Transport};
use crate::error::{Error, Result};

/// Posts documents to `http://{host}/query`, authenticating with the
/// session token as the basic-auth user name and an empty password.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	params: ConnectParams,
	url: String,
}

impl HttpTransport {
	/// Builds a transport for `params`.
	pub fn new(params: ConnectParams) -> Result<Self> {
		Ok(Self::with_client(Self::build_client()?, params))
	}

	/// The HTTP client `new` would use, for callers that must not fail once params exist.
	pub fn build_client() -> Result<reqwest::Client> {
		reqwest::Client::builder()
			.build()
			.map_err(|e| Error::Transport(format!("failed to create HTTP client: {e}")))
	}

	/// Builds a transport reusing an existing HTTP client.
	pub fn with_client(client: reqwest::Client, params: ConnectParams) -> Self {
		let url = params.query_url();
		Self { client, params, url }
	}

	pub fn params(&self) -> &ConnectParams {
		&self.params
	}

	async fn post(&self, query: &str) -> Result<Value> {
		debug!(target = "dagger.transport", url = %self.url, "executing query");
		trace!(target = "dagger.transport", %query, "query document");

		let response = self
			.client
			.post(&self.url)
			.basic_auth(&self.params.session_token, Some(""))
			.json(&GraphQlRequest::new(query))
			.send()
			.await
			.map_err(|e| Error::Transport(format!("request to {} failed: {e}", self.url)))?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| Error::Transport(format!("failed to read response from {}: {e}", self.url)))?;

		let envelope: GraphQlResponse = match serde_json::from_slice(&body) {
			Ok(envelope) => envelope,
			Err(_) if !status.is_success() => {
				return Err(Error::Transport(format!(
					"engine responded with status {status}: {}",
					String::from_utf8_lossy(&body).trim()
				)));
			}
			Err(e) => return Err(Error::InvalidResponse(format!("body is not a GraphQL response: {e}"))),
		};

		if envelope.has_errors() {
			debug!(target = "dagger.transport", count = envelope.errors.len(), "engine reported errors");
			return Err(Error::GraphQl(envelope.errors));
		}

		envelope
			.data
			.ok_or_else(|| Error::InvalidResponse(format!("response without data (status {status})")))
	}
}

impl Transport for HttpTransport {
	fn execute<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a> {
		Box::pin(self.post(query))
	}
}
