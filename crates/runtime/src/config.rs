//! Connection options and environment resolution.
//!
//! Values are merged once when a session starts: explicit [`ConnectOpts`]
//! win over the environment, which wins over the built-in defaults.

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::transport::ConnectParams;

/// Overrides the engine working directory.
pub const ENV_WORKDIR: &str = "DAGGER_WORKDIR";
/// Overrides the project configuration path.
pub const ENV_CONFIG: &str = "DAGGER_CONFIG";
/// URL of an already running session to reuse.
pub const ENV_SESSION_URL: &str = "DAGGER_SESSION_URL";
/// Token for the session named by [`ENV_SESSION_URL`].
pub const ENV_SESSION_TOKEN: &str = "DAGGER_SESSION_TOKEN";
/// Explicit engine CLI binary used for self-provisioned sessions.
pub const ENV_CLI_BIN: &str = "_EXPERIMENTAL_DAGGER_CLI_BIN";

/// Project configuration path used when nothing overrides it.
pub const DEFAULT_CONFIG_PATH: &str = "./dagger.json";

/// Sink receiving the engine's log output.
///
/// Writes are blocking. The CLI provisioner issues them from the blocking
/// thread pool, so a slow writer delays log delivery but not the runtime.
#[derive(Clone)]
pub struct LogOutput {
	inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LogOutput {
	pub fn new(writer: impl Write + Send + 'static) -> Self {
		Self {
			inner: Arc::new(Mutex::new(Box::new(writer))),
		}
	}

	/// Forwards engine log output to this process's stderr.
	pub fn stderr() -> Self {
		Self::new(std::io::stderr())
	}

	/// Writes one line, appending a newline. Blocks until the writer accepts it.
	pub fn write_line(&self, line: &str) -> std::io::Result<()> {
		let mut writer = self.inner.lock();
		writer.write_all(line.as_bytes())?;
		writer.write_all(b"\n")?;
		writer.flush()
	}
}

impl fmt::Debug for LogOutput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("LogOutput")
	}
}

/// Caller-supplied connection overrides.
#[derive(Debug, Clone, Default)]
pub struct ConnectOpts {
	pub workdir: Option<PathBuf>,
	pub config_path: Option<PathBuf>,
	pub log_output: Option<LogOutput>,
}

impl ConnectOpts {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
		self.workdir = Some(workdir.into());
		self
	}

	pub fn config_path(mut self, config_path: impl Into<PathBuf>) -> Self {
		self.config_path = Some(config_path.into());
		self
	}

	pub fn log_output(mut self, log_output: LogOutput) -> Self {
		self.log_output = Some(log_output);
		self
	}
}

/// Fully resolved connection settings. Not re-resolved mid-session.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
	pub workdir: PathBuf,
	pub config_path: PathBuf,
	pub log_output: Option<LogOutput>,
}

/// Snapshot of the environment variables a session consults.
///
/// Empty values are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
	pub workdir: Option<PathBuf>,
	pub config_path: Option<PathBuf>,
	pub session_url: Option<String>,
	pub session_token: Option<String>,
	pub cli_bin: Option<PathBuf>,
}

impl SessionEnv {
	/// Reads the current process environment.
	pub fn from_process() -> Self {
		Self::from_lookup(|key| std::env::var_os(key))
	}

	/// Builds a snapshot from an arbitrary variable lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
		let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
		Self {
			workdir: get(ENV_WORKDIR).map(PathBuf::from),
			config_path: get(ENV_CONFIG).map(PathBuf::from),
			session_url: get(ENV_SESSION_URL).map(|v| v.to_string_lossy().into_owned()),
			session_token: get(ENV_SESSION_TOKEN).map(|v| v.to_string_lossy().into_owned()),
			cli_bin: get(ENV_CLI_BIN).map(PathBuf::from),
		}
	}

	/// Merges `opts` over this environment and the defaults.
	pub fn resolve(&self, opts: ConnectOpts) -> Result<ConnectConfig> {
		let workdir = match opts.workdir.or_else(|| self.workdir.clone()) {
			Some(workdir) => workdir,
			None => std::env::current_dir().map_err(|e| Error::Config(format!("cannot determine current directory: {e}")))?,
		};
		let config_path = opts
			.config_path
			.or_else(|| self.config_path.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

		Ok(ConnectConfig {
			workdir,
			config_path,
			log_output: opts.log_output,
		})
	}

	/// Parameters of an externally created session, if one is configured.
	///
	/// Fails when the session URL is set without its token or cannot be parsed.
	pub fn external_session(&self) -> Result<Option<ConnectParams>> {
		let Some(raw_url) = self.session_url.as_deref() else {
			return Ok(None);
		};
		let Some(token) = self.session_token.as_deref() else {
			return Err(Error::Config(format!("{ENV_SESSION_TOKEN} must be set when using {ENV_SESSION_URL}")));
		};

		let url = url::Url::parse(raw_url).map_err(|e| Error::Config(format!("invalid {ENV_SESSION_URL} `{raw_url}`: {e}")))?;
		let host = url
			.host_str()
			.ok_or_else(|| Error::Config(format!("{ENV_SESSION_URL} `{raw_url}` has no host")))?;
		let host = match url.port() {
			Some(port) => format!("{host}:{port}"),
			None => host.to_string(),
		};

		Ok(Some(ConnectParams::new(host, token)))
	}
}
