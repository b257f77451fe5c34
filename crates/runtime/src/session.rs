//! Session acquisition and scoped teardown.
//!
//! Two mutually exclusive strategies, checked in order:
//!
//! 1. **External session**: `DAGGER_SESSION_URL` (plus its mandatory token)
//!    points at an engine someone else owns. Nothing is closed afterwards.
//! 2. **Provisioned session**: an [`EngineProvisioner`] starts an engine and
//!    returns the action that tears it down.
//!
//! [`ActiveSession::scope`] runs the caller's work and then closes the
//! session on every exit path, including errors and panics.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, info};

use crate::config::{ConnectOpts, SessionEnv};
use crate::error::{Error, Result};
use crate::provision::{CliProvisioner, EngineProvisioner, SessionCloser};
use crate::transport::{HttpTransport, SharedTransport};

/// Where the session's engine came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
	/// Reused from `DAGGER_SESSION_URL`/`DAGGER_SESSION_TOKEN`.
	External,
	/// Started by the provisioner for this session only.
	Provisioned,
}

impl fmt::Display for SessionSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SessionSource::External => "external",
			SessionSource::Provisioned => "provisioned",
		})
	}
}

/// Chooses and creates the transport for one `connect` invocation.
///
/// A manager is consumed by [`SessionManager::run`]; sessions are never
/// cached or shared between invocations.
pub struct SessionManager<P = CliProvisioner> {
	env: SessionEnv,
	provisioner: P,
}

impl SessionManager<CliProvisioner> {
	/// Snapshots the process environment and provisions through the engine CLI.
	pub fn from_env() -> Self {
		let env = SessionEnv::from_process();
		let provisioner = CliProvisioner::new(env.cli_bin.clone());
		Self { env, provisioner }
	}
}

impl<P: EngineProvisioner> SessionManager<P> {
	pub fn new(env: SessionEnv, provisioner: P) -> Self {
		Self { env, provisioner }
	}

	pub fn env(&self) -> &SessionEnv {
		&self.env
	}

	/// Acquires a transport, provisioning an engine when no external session is configured.
	pub async fn acquire(&mut self, opts: ConnectOpts) -> Result<ActiveSession> {
		if let Some(params) = self.env.external_session()? {
			info!(target = "dagger.session", host = %params.host, "reusing external engine session");
			let transport = HttpTransport::new(params)?;
			return Ok(ActiveSession::new(Arc::new(transport), SessionCloser::noop(), SessionSource::External));
		}

		let config = self.env.resolve(opts)?;
		// Nothing after `provision` may fail: its closer must reach the caller.
		let client = HttpTransport::build_client()?;
		debug!(
			target = "dagger.session",
			workdir = %config.workdir.display(),
			config = %config.config_path.display(),
			"provisioning engine session"
		);
		let provisioned = self.provisioner.provision(&config).await?;
		info!(target = "dagger.session", host = %provisioned.params.host, "engine session provisioned");

		let transport = HttpTransport::with_client(client, provisioned.params);
		Ok(ActiveSession::new(Arc::new(transport), provisioned.closer, SessionSource::Provisioned))
	}

	/// Acquires a session, runs `callback` with its transport, then closes it.
	///
	/// Configuration and provisioning failures are returned before the
	/// callback runs. Otherwise the callback's result is returned after the
	/// close action completes.
	pub async fn run<F, Fut, T, E>(mut self, opts: ConnectOpts, callback: F) -> std::result::Result<T, E>
	where
		F: FnOnce(SharedTransport) -> Fut,
		Fut: Future<Output = std::result::Result<T, E>>,
		E: From<Error>,
	{
		let session = self.acquire(opts).await.map_err(E::from)?;
		session.scope(callback).await
	}
}

/// A transport plus the close action owed when the caller is done with it.
pub struct ActiveSession {
	transport: SharedTransport,
	closer: SessionCloser,
	source: SessionSource,
}

impl ActiveSession {
	pub fn new(transport: SharedTransport, closer: SessionCloser, source: SessionSource) -> Self {
		Self { transport, closer, source }
	}

	pub fn source(&self) -> SessionSource {
		self.source
	}

	pub fn transport(&self) -> &SharedTransport {
		&self.transport
	}

	/// Runs `work` and then the close action exactly once.
	///
	/// Panics raised by `work`, whether while creating its future or while
	/// polling it, are resumed after the session is closed.
	pub async fn scope<F, Fut, T, E>(self, work: F) -> std::result::Result<T, E>
	where
		F: FnOnce(SharedTransport) -> Fut,
		Fut: Future<Output = std::result::Result<T, E>>,
	{
		let Self { transport, closer, source } = self;
		let outcome = AssertUnwindSafe(async move { work(transport).await }).catch_unwind().await;

		debug!(target = "dagger.session", %source, failed = !matches!(outcome, Ok(Ok(_))), "closing session");
		closer.close().await;

		match outcome {
			Ok(result) => result,
			Err(panic) => std::panic::resume_unwind(panic),
		}
	}
}

impl fmt::Debug for ActiveSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActiveSession")
			.field("source", &self.source)
			.field("closer", &self.closer)
			.finish_non_exhaustive()
	}
}
