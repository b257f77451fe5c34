//! Engine provisioning.
//!
//! A provisioner turns a [`ConnectConfig`] into a running engine session
//! and hands back its connection parameters together with the action that
//! tears it down.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::Result;
use crate::config::ConnectConfig;
use crate::transport::ConnectParams;

mod cli;

pub use cli::{CliProvisioner, CliProvisionerOptions, ENGINE_BINARY_NAME};

/// Boxed future returned by [`EngineProvisioner::provision`].
pub type ProvisionFuture<'a> = Pin<Box<dyn Future<Output = Result<ProvisionedSession>> + Send + 'a>>;

type CloseFn = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Obtains a running engine endpoint.
pub trait EngineProvisioner: Send {
	fn provision<'a>(&'a mut self, config: &'a ConnectConfig) -> ProvisionFuture<'a>;
}

/// A running engine session owned by the caller.
pub struct ProvisionedSession {
	pub params: ConnectParams,
	pub closer: SessionCloser,
}

impl fmt::Debug for ProvisionedSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProvisionedSession").field("params", &self.params).finish_non_exhaustive()
	}
}

/// Teardown action for a provisioned session.
///
/// [`SessionCloser::close`] consumes the closer, so the action runs at most
/// once.
pub struct SessionCloser {
	close: Option<CloseFn>,
}

impl SessionCloser {
	/// Wraps an async teardown action.
	pub fn new<F, Fut>(close: F) -> Self
	where
		F: FnOnce() -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		Self {
			close: Some(Box::new(move || Box::pin(close()))),
		}
	}

	/// A closer with nothing to tear down.
	pub fn noop() -> Self {
		Self { close: None }
	}

	pub fn is_noop(&self) -> bool {
		self.close.is_none()
	}

	/// Runs the teardown action.
	pub async fn close(mut self) {
		if let Some(close) = self.close.take() {
			close().await;
		}
	}
}

impl fmt::Debug for SessionCloser {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionCloser").field("noop", &self.is_noop()).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[tokio::test]
	async fn close_runs_action_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let closer = SessionCloser::new(move || async move {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		assert!(!closer.is_noop());
		closer.close().await;
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn noop_closer_does_nothing() {
		let closer = SessionCloser::noop();
		assert!(closer.is_noop());
		closer.close().await;
	}
}
