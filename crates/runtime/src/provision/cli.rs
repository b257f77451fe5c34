//! Engine sessions started through the engine CLI.
//!
//! Runs `<bin> session --workdir <dir> --project <config>` and waits for
//! the first stdout line, a JSON object `{"port": .., "session_token": ..}`.
//! The session lives until its stdin is closed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, trace, warn};

use super::{EngineProvisioner, ProvisionFuture, ProvisionedSession, SessionCloser};
use crate::config::{ConnectConfig, ENV_CLI_BIN, LogOutput};
use crate::error::{Error, Result};
use crate::transport::ConnectParams;

/// Engine CLI looked up on `PATH` when no explicit binary is configured.
pub const ENGINE_BINARY_NAME: &str = "dagger";

const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(10);

/// Timing knobs for [`CliProvisioner`].
#[derive(Debug, Clone, Copy)]
pub struct CliProvisionerOptions {
	/// How long to wait for the session to report its connect params.
	pub ready_timeout: Duration,
	/// How long to wait for a clean exit after closing stdin before killing.
	pub close_grace: Duration,
}

impl Default for CliProvisionerOptions {
	fn default() -> Self {
		Self {
			ready_timeout: DEFAULT_READY_TIMEOUT,
			close_grace: DEFAULT_CLOSE_GRACE,
		}
	}
}

#[derive(Debug, Deserialize)]
struct SessionInfo {
	port: u16,
	session_token: String,
}

/// Provisions sessions by spawning the engine CLI.
#[derive(Debug, Clone, Default)]
pub struct CliProvisioner {
	bin: Option<PathBuf>,
	options: CliProvisionerOptions,
}

impl CliProvisioner {
	/// Uses `bin` when given, otherwise looks up [`ENGINE_BINARY_NAME`] on `PATH`.
	pub fn new(bin: Option<PathBuf>) -> Self {
		Self {
			bin,
			options: CliProvisionerOptions::default(),
		}
	}

	pub fn with_options(mut self, options: CliProvisionerOptions) -> Self {
		self.options = options;
		self
	}

	/// Locates the engine CLI binary.
	pub fn resolve_binary(&self) -> Result<PathBuf> {
		match &self.bin {
			Some(bin) => which::which(bin)
				.map_err(|e| Error::EngineSessionBinary(format!("{} from {ENV_CLI_BIN} is not an executable: {e}", bin.display()))),
			None => which::which(ENGINE_BINARY_NAME).map_err(|e| {
				Error::EngineSessionBinary(format!(
					"`{ENGINE_BINARY_NAME}` not found on PATH ({e}); install the engine CLI or set {ENV_CLI_BIN}"
				))
			}),
		}
	}

	async fn start(&self, config: &ConnectConfig) -> Result<ProvisionedSession> {
		let bin = self.resolve_binary()?;
		let mut child = spawn_session(&bin, config)?;

		let stdin = child.stdin.take();
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::Provision("engine session stdout was not captured".to_string()))?;
		if let Some(stderr) = child.stderr.take() {
			tokio::spawn(forward_logs(stderr, config.log_output.clone()));
		}

		let mut stdout = BufReader::new(stdout);
		let mut buf = Vec::new();
		let first_line = match tokio::time::timeout(self.options.ready_timeout, read_line_lossy(&mut stdout, &mut buf)).await {
			Ok(Ok(Some(line))) => line,
			Ok(Ok(None)) => {
				let status = match tokio::time::timeout(self.options.close_grace, child.wait()).await {
					Ok(Ok(status)) => status.to_string(),
					Ok(Err(e)) => e.to_string(),
					Err(_) => {
						abort(child).await;
						"stdout closed while still running".to_string()
					}
				};
				return Err(Error::Provision(format!(
					"engine session exited before reporting connect params ({status})"
				)));
			}
			Ok(Err(e)) => {
				abort(child).await;
				return Err(Error::Provision(format!("failed to read engine session output: {e}")));
			}
			Err(_) => {
				abort(child).await;
				return Err(Error::Provision(format!(
					"engine session did not report connect params within {:?}",
					self.options.ready_timeout
				)));
			}
		};

		let info: SessionInfo = match serde_json::from_str(first_line.trim()) {
			Ok(info) => info,
			Err(e) => {
				abort(child).await;
				return Err(Error::Provision(format!("unexpected engine session output `{}`: {e}", first_line.trim())));
			}
		};

		tokio::spawn(drain_stdout(stdout));

		let params = ConnectParams::new(format!("127.0.0.1:{}", info.port), info.session_token);
		info!(target = "dagger.engine", host = %params.host, pid = child.id(), "engine session ready");

		let grace = self.options.close_grace;
		Ok(ProvisionedSession {
			params,
			closer: SessionCloser::new(move || shutdown(child, stdin, grace)),
		})
	}
}

impl EngineProvisioner for CliProvisioner {
	fn provision<'a>(&'a mut self, config: &'a ConnectConfig) -> ProvisionFuture<'a> {
		Box::pin(self.start(config))
	}
}

fn spawn_session(bin: &Path, config: &ConnectConfig) -> Result<Child> {
	debug!(
		target = "dagger.engine",
		bin = %bin.display(),
		workdir = %config.workdir.display(),
		config = %config.config_path.display(),
		"starting engine session"
	);

	let mut cmd = Command::new(bin);
	cmd.arg("session")
		.arg("--workdir")
		.arg(&config.workdir)
		.arg("--project")
		.arg(&config.config_path)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);

	cmd.spawn()
		.map_err(|e| Error::Provision(format!("failed to start engine session with {}: {e}", bin.display())))
}

/// Reads one `\n`-terminated line, replacing invalid UTF-8. `None` at EOF.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
	R: AsyncBufRead + Unpin,
{
	buf.clear();
	if reader.read_until(b'\n', buf).await? == 0 {
		return Ok(None);
	}
	let line = String::from_utf8_lossy(&buf[..]);
	Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Keeps the pipe empty after a read failure so the engine never blocks or
/// takes `SIGPIPE` on a write.
async fn discard<R>(mut reader: R)
where
	R: AsyncBufRead + Unpin,
{
	if let Err(e) = tokio::io::copy_buf(&mut reader, &mut tokio::io::sink()).await {
		debug!(target = "dagger.engine", error = %e, "engine output pipe closed");
	}
}

async fn forward_logs(stderr: ChildStderr, sink: Option<LogOutput>) {
	let mut reader = BufReader::new(stderr);
	let mut buf = Vec::new();
	loop {
		match read_line_lossy(&mut reader, &mut buf).await {
			Ok(Some(line)) => {
				debug!(target = "dagger.engine", "{line}");
				if let Some(sink) = &sink {
					write_to_sink(sink, line).await;
				}
			}
			Ok(None) => return,
			Err(e) => {
				warn!(target = "dagger.engine", error = %e, "failed to read engine log output; discarding the rest");
				return discard(reader).await;
			}
		}
	}
}

/// Sink writes are blocking I/O, so they run off the async workers.
async fn write_to_sink(sink: &LogOutput, line: String) {
	let sink = sink.clone();
	match tokio::task::spawn_blocking(move || sink.write_line(&line)).await {
		Ok(Ok(())) => {}
		Ok(Err(e)) => warn!(target = "dagger.engine", error = %e, "failed to write engine log output"),
		Err(e) => warn!(target = "dagger.engine", error = %e, "engine log writer panicked"),
	}
}

async fn drain_stdout(mut stdout: BufReader<ChildStdout>) {
	let mut buf = Vec::new();
	loop {
		match read_line_lossy(&mut stdout, &mut buf).await {
			Ok(Some(line)) => trace!(target = "dagger.engine", %line, "engine session stdout"),
			Ok(None) => return,
			Err(_) => return discard(stdout).await,
		}
	}
}

async fn abort(mut child: Child) {
	if let Err(e) = child.kill().await {
		warn!(target = "dagger.engine", error = %e, "failed to kill engine session");
	}
}

async fn shutdown(mut child: Child, stdin: Option<ChildStdin>, grace: Duration) {
	drop(stdin);
	match tokio::time::timeout(grace, child.wait()).await {
		Ok(Ok(status)) => info!(target = "dagger.engine", %status, "engine session exited"),
		Ok(Err(e)) => warn!(target = "dagger.engine", error = %e, "failed waiting for engine session"),
		Err(_) => {
			warn!(target = "dagger.engine", grace = ?grace, "engine session still running after stdin closed; killing");
			abort(child).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_override_is_binary_error() {
		let provisioner = CliProvisioner::new(Some(PathBuf::from("/nonexistent/engine-cli")));
		let err = provisioner.resolve_binary().unwrap_err();
		assert!(matches!(err, Error::EngineSessionBinary(_)));
		assert!(err.is_provision());
	}

	#[test]
	fn session_info_parses_connect_line() {
		let info: SessionInfo = serde_json::from_str(r#"{"port": 41234, "session_token": "abc"}"#).unwrap();
		assert_eq!(info.port, 41234);
		assert_eq!(info.session_token, "abc");
	}

	#[tokio::test]
	async fn lossy_lines_survive_invalid_utf8() {
		let mut reader: &[u8] = b"bad \xff byte\r\nnext\nlast";
		let mut buf = Vec::new();
		assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap().as_deref(), Some("bad \u{fffd} byte"));
		assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap().as_deref(), Some("next"));
		assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap().as_deref(), Some("last"));
		assert_eq!(read_line_lossy(&mut reader, &mut buf).await.unwrap(), None);
	}

	#[test]
	fn default_options() {
		let options = CliProvisionerOptions::default();
		assert_eq!(options.ready_timeout, Duration::from_secs(300));
		assert_eq!(options.close_grace, Duration::from_secs(10));
	}
}
