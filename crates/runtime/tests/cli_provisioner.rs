//! CliProvisioner against scripted stand-ins for the engine CLI.
#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dagger_runtime::{CliProvisioner, CliProvisionerOptions, ConnectOpts, EngineProvisioner, Error, LogOutput, SessionEnv};
use parking_lot::Mutex;
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
	let path = dir.join(name);
	std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
	path
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		self.0.lock().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl CapturedLog {
	async fn wait_for(&self, needle: &str) -> String {
		for _ in 0..100 {
			let text = String::from_utf8_lossy(&self.0.lock()).into_owned();
			if text.contains(needle) {
				return text;
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
		}
		panic!("log never contained {needle:?}");
	}
}

fn fast_options() -> CliProvisionerOptions {
	CliProvisionerOptions {
		ready_timeout: Duration::from_secs(5),
		close_grace: Duration::from_secs(2),
	}
}

#[tokio::test]
async fn reads_connect_params_and_forwards_logs() {
	let tmp = TempDir::new().unwrap();
	let marker = tmp.path().join("exited");
	let bin = write_script(
		tmp.path(),
		"engine",
		&format!(
			"echo \"args: $*\" >&2\necho '{{\"port\": 4321, \"session_token\": \"tok-1\"}}'\ncat > /dev/null\ntouch {}",
			marker.display()
		),
	);

	let log = CapturedLog::default();
	let config = SessionEnv::default()
		.resolve(
			ConnectOpts::new()
				.workdir("/srv/app")
				.config_path("/srv/app/dagger.json")
				.log_output(LogOutput::new(log.clone())),
		)
		.unwrap();

	let mut provisioner = CliProvisioner::new(Some(bin)).with_options(fast_options());
	let session = provisioner.provision(&config).await.unwrap();

	assert_eq!(session.params.host, "127.0.0.1:4321");
	assert_eq!(session.params.session_token, "tok-1");

	let text = log.wait_for("args:").await;
	assert!(text.contains("args: session --workdir /srv/app --project /srv/app/dagger.json"), "log: {text}");

	assert!(!marker.exists());
	session.closer.close().await;
	assert!(marker.exists(), "session should exit cleanly once stdin is closed");
}

#[tokio::test]
async fn invalid_utf8_on_stderr_keeps_session_alive() {
	let tmp = TempDir::new().unwrap();
	let died = tmp.path().join("died");
	let marker = tmp.path().join("exited");
	let bin = write_script(
		tmp.path(),
		"engine",
		&format!(
			"trap 'touch {died}' PIPE\necho '{{\"port\": 4321, \"session_token\": \"tok-1\"}}'\nprintf 'bad \\377 byte\\n' >&2\nsleep 0.3\necho 'after bad byte' >&2 || touch {died}\ncat > /dev/null\ntouch {marker}",
			died = died.display(),
			marker = marker.display()
		),
	);

	let log = CapturedLog::default();
	let config = SessionEnv::default()
		.resolve(ConnectOpts::new().workdir(tmp.path()).log_output(LogOutput::new(log.clone())))
		.unwrap();

	let session = CliProvisioner::new(Some(bin))
		.with_options(fast_options())
		.provision(&config)
		.await
		.unwrap();

	let text = log.wait_for("after bad byte").await;
	assert!(text.contains("bad \u{fffd} byte"), "log: {text}");
	assert!(!died.exists(), "engine must not see a closed stderr pipe");

	session.closer.close().await;
	assert!(marker.exists());
	assert!(!died.exists());
}

#[tokio::test]
async fn early_exit_is_provision_error() {
	let tmp = TempDir::new().unwrap();
	let bin = write_script(tmp.path(), "engine", "echo 'cannot reach engine' >&2\nexit 3");
	let config = SessionEnv::default().resolve(ConnectOpts::new().workdir(tmp.path())).unwrap();

	let err = CliProvisioner::new(Some(bin))
		.with_options(fast_options())
		.provision(&config)
		.await
		.unwrap_err();

	assert!(matches!(err, Error::Provision(_)));
	assert!(err.to_string().contains("exited before reporting connect params"), "{err}");
}

#[tokio::test]
async fn garbage_first_line_is_provision_error() {
	let tmp = TempDir::new().unwrap();
	let bin = write_script(tmp.path(), "engine", "echo 'starting engine'\ncat > /dev/null");
	let config = SessionEnv::default().resolve(ConnectOpts::new().workdir(tmp.path())).unwrap();

	let err = CliProvisioner::new(Some(bin))
		.with_options(fast_options())
		.provision(&config)
		.await
		.unwrap_err();

	assert!(err.is_provision());
	assert!(err.to_string().contains("starting engine"), "{err}");
}

#[tokio::test]
async fn slow_session_times_out() {
	let tmp = TempDir::new().unwrap();
	let bin = write_script(tmp.path(), "engine", "sleep 30");
	let config = SessionEnv::default().resolve(ConnectOpts::new().workdir(tmp.path())).unwrap();

	let err = CliProvisioner::new(Some(bin))
		.with_options(CliProvisionerOptions {
			ready_timeout: Duration::from_millis(200),
			close_grace: Duration::from_millis(200),
		})
		.provision(&config)
		.await
		.unwrap_err();

	assert!(err.to_string().contains("did not report connect params"), "{err}");
}

#[tokio::test]
async fn missing_binary_is_reported() {
	let tmp = TempDir::new().unwrap();
	let config = SessionEnv::default().resolve(ConnectOpts::new().workdir(tmp.path())).unwrap();

	let err = CliProvisioner::new(Some(tmp.path().join("missing")))
		.provision(&config)
		.await
		.unwrap_err();

	assert!(matches!(err, Error::EngineSessionBinary(_)));
}
