//! Transports that carry serialized documents to a running engine.
//!
//! A [`Transport`] takes a complete GraphQL document and returns the `data`
//! member of the engine's answer. Engine-reported errors and network
//! failures come back as [`Error`](crate::Error) values and are never retried
//! at this layer.
//!
//! Implementations:
//! * [`HttpTransport`]: GraphQL over HTTP with session-token basic auth
//! * [`LazyTransport`]: resolves an external session from the environment on first use
//! * [`FakeTransport`]: in-memory, for tests

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::Result;

mod fake;
mod http;
mod lazy;

pub use fake::{FakeTransport, FakeTransportController};
pub use http::HttpTransport;
pub use lazy::LazyTransport;

/// Boxed future returned by [`Transport::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Shared handle to a transport. Every client handle derived from one
/// session holds a clone of the same `Arc`.
pub type SharedTransport = Arc<dyn Transport>;

/// Executes serialized GraphQL documents against an engine.
///
/// Implementations are shared across tasks and must not require mutable
/// access; concurrent calls are neither ordered nor serialized here.
pub trait Transport: Send + Sync {
	/// Sends `query` and resolves with the response `data`.
	fn execute<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
	fn execute<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a> {
		(**self).execute(query)
	}
}

/// Connection parameters for a running engine session.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
	/// `host[:port]` of the engine's GraphQL listener.
	pub host: String,
	pub session_token: String,
}

impl ConnectParams {
	pub fn new(host: impl Into<String>, session_token: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			session_token: session_token.into(),
		}
	}

	/// GraphQL endpoint URL for this session.
	pub fn query_url(&self) -> String {
		format!("http://{}/query", self.host)
	}
}

impl std::fmt::Debug for ConnectParams {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectParams")
			.field("host", &self.host)
			.field("session_token", &"<redacted>")
			.finish()
	}
}
