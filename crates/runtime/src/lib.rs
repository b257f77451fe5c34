//! Engine session lifecycle for the GraphQL query layer.
//!
//! * [`SessionManager`] picks between an externally supplied session and a
//!   provisioned one, and guarantees teardown around the caller's work.
//! * [`Transport`] implementations carry serialized documents to the engine.
//! * [`EngineProvisioner`] / [`CliProvisioner`] start engine sessions.
//! * [`SessionEnv`] / [`ConnectOpts`] resolve configuration once per session.

pub mod config;
pub mod error;
pub mod provision;
pub mod session;
pub mod transport;

pub use config::{ConnectConfig, ConnectOpts, DEFAULT_CONFIG_PATH, LogOutput, SessionEnv};
pub use error::{Error, Result};
pub use provision::{CliProvisioner, CliProvisionerOptions, EngineProvisioner, ProvisionFuture, ProvisionedSession, SessionCloser};
pub use session::{ActiveSession, SessionManager, SessionSource};
pub use transport::{ConnectParams, ExecuteFuture, FakeTransport, FakeTransportController, HttpTransport, LazyTransport, SharedTransport, Transport};
