//! Fake transport for exercising the query layer without an engine.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransport::new();
//! controller.respond(json!({"container": {"from": {"stdout": "hi\n"}}}));
//!
//! let data = transport.execute("{ container { from (address: \"alpine\") { stdout } } }").await?;
//! assert_eq!(controller.sent(), ["{ container { from (address: \"alpine\") { stdout } } }"]);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::{ExecuteFuture, Transport};
use crate::error::{Error, Result};

#[derive(Default)]
struct FakeState {
	replies: VecDeque<Result<Value>>,
	sent: Vec<String>,
}

/// In-memory transport answering from a queue of canned replies.
///
/// Executing with an empty queue fails with [`Error::Transport`].
#[derive(Clone, Default)]
pub struct FakeTransport {
	state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
	/// Creates a transport and the controller used to script it.
	pub fn new() -> (Self, FakeTransportController) {
		let transport = Self::default();
		let controller = FakeTransportController {
			state: Arc::clone(&transport.state),
		};
		(transport, controller)
	}
}

impl Transport for FakeTransport {
	fn execute<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a> {
		let reply = {
			let mut state = self.state.lock();
			state.sent.push(query.to_string());
			state.replies.pop_front()
		};
		Box::pin(async move { reply.unwrap_or_else(|| Err(Error::Transport("fake transport has no queued reply".to_string()))) })
	}
}

/// Scripts replies and inspects documents sent through a [`FakeTransport`].
#[derive(Clone)]
pub struct FakeTransportController {
	state: Arc<Mutex<FakeState>>,
}

impl FakeTransportController {
	/// Queues a successful reply carrying `data`.
	pub fn respond(&self, data: Value) {
		self.state.lock().replies.push_back(Ok(data));
	}

	/// Queues a failing reply.
	pub fn fail(&self, error: Error) {
		self.state.lock().replies.push_back(Err(error));
	}

	/// Documents sent so far, oldest first.
	pub fn sent(&self) -> Vec<String> {
		self.state.lock().sent.clone()
	}

	/// Takes all sent documents, clearing the buffer.
	pub fn take_sent(&self) -> Vec<String> {
		std::mem::take(&mut self.state.lock().sent)
	}

	/// Number of replies not yet consumed.
	pub fn pending(&self) -> usize {
		self.state.lock().replies.len()
	}
}
