//! Client for the Dagger engine's GraphQL API.
//!
//! Handles such as [`Client`] and [`Container`] build a query lazily: every
//! chaining call returns a new immutable handle, and only `async` terminal
//! methods (`stdout`, `id`, `entries`, ...) talk to the engine.
//!
//! ```ignore
//! dagger::connect(|client| async move {
//!     let out = client
//!         .container()
//!         .from("alpine")
//!         .with_exec(["apk", "add", "curl"])
//!         .stdout()
//!         .await?;
//!     println!("{out}");
//!     Ok::<_, dagger::Error>(())
//! })
//! .await?;
//! ```

pub mod api;
mod selection;

use std::future::Future;

pub use api::{
	CacheVolume, CacheVolumeId, Client, Container, ContainerId, ContainerOpts, ContainerWithExecOpts, Directory, DirectoryId, GitOpts, GitRef,
	GitRepository, ObjectRef,
};
pub use dagger_protocol::{Argument, Arguments, OperationNode, ProtocolError, QueryTree, build_batch_query, build_query, query_flatten};
pub use dagger_runtime::{
	CliProvisioner, ConnectOpts, EngineProvisioner, Error, FakeTransport, FakeTransportController, LazyTransport, LogOutput, Result, SessionEnv,
	SessionManager, SharedTransport, Transport,
};
pub use selection::Selection;

/// Runs `callback` with a client bound to an engine session, then closes the session.
///
/// Reuses `DAGGER_SESSION_URL`/`DAGGER_SESSION_TOKEN` when set; otherwise
/// starts `dagger session` for the duration of the callback.
pub async fn connect<F, Fut, T, E>(callback: F) -> std::result::Result<T, E>
where
	F: FnOnce(Client) -> Fut,
	Fut: Future<Output = std::result::Result<T, E>>,
	E: From<Error>,
{
	connect_with_opts(ConnectOpts::default(), callback).await
}

/// [`connect`] with explicit workdir, config path or log sink.
pub async fn connect_with_opts<F, Fut, T, E>(opts: ConnectOpts, callback: F) -> std::result::Result<T, E>
where
	F: FnOnce(Client) -> Fut,
	Fut: Future<Output = std::result::Result<T, E>>,
	E: From<Error>,
{
	connect_with(SessionManager::from_env(), opts, callback).await
}

/// [`connect`] through a caller-supplied session manager.
pub async fn connect_with<P, F, Fut, T, E>(manager: SessionManager<P>, opts: ConnectOpts, callback: F) -> std::result::Result<T, E>
where
	P: EngineProvisioner,
	F: FnOnce(Client) -> Fut,
	Fut: Future<Output = std::result::Result<T, E>>,
	E: From<Error>,
{
	manager.run(opts, |transport| callback(Client::with_transport(transport))).await
}
