//! Default transport for clients created outside a session.

use tokio::sync::OnceCell;
use tracing::debug;

use super::{ExecuteFuture, HttpTransport, Transport};
use crate::config::{ENV_SESSION_TOKEN, ENV_SESSION_URL, SessionEnv};
use crate::error::{Error, Result};

/// Resolves an external session on first use and reuses it afterwards.
///
/// Only the external-session variables are consulted; provisioning an
/// engine requires `connect`, which owns the process lifetime.
#[derive(Debug, Default)]
pub struct LazyTransport {
	env: Option<SessionEnv>,
	resolved: OnceCell<HttpTransport>,
}

impl LazyTransport {
	/// Reads the process environment when first used.
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves from a fixed environment snapshot instead of the process environment.
	pub fn with_env(env: SessionEnv) -> Self {
		Self {
			env: Some(env),
			resolved: OnceCell::new(),
		}
	}

	pub fn is_resolved(&self) -> bool {
		self.resolved.initialized()
	}

	async fn resolve(&self) -> Result<&HttpTransport> {
		self.resolved
			.get_or_try_init(|| async {
				let env = self.env.clone().unwrap_or_else(SessionEnv::from_process);
				match env.external_session()? {
					Some(params) => {
						debug!(target = "dagger.transport", host = %params.host, "using session from environment");
						HttpTransport::new(params)
					}
					None => Err(Error::Config(format!(
						"no engine session available: set {ENV_SESSION_URL} and {ENV_SESSION_TOKEN} or run inside connect()"
					))),
				}
			})
			.await
	}
}

impl Transport for LazyTransport {
	fn execute<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a> {
		Box::pin(async move { self.resolve().await?.execute(query).await })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn missing_session_is_config_error() {
		let transport = LazyTransport::with_env(SessionEnv::default());
		let err = transport.execute("{ container { id } }").await.unwrap_err();
		assert!(err.is_config());
		assert!(!transport.is_resolved());
	}

	#[tokio::test]
	async fn url_without_token_is_config_error() {
		let transport = LazyTransport::with_env(SessionEnv {
			session_url: Some("http://127.0.0.1:1".to_string()),
			..SessionEnv::default()
		});
		assert!(transport.execute("{ x }").await.unwrap_err().is_config());
	}
}
