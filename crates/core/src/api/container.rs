use dagger_protocol::Arguments;
use dagger_runtime::Result;

use super::{CacheVolumeId, ContainerId, DirectoryId, ObjectRef};
use crate::selection::Selection;

/// A container state in the pipeline.
#[derive(Debug, Clone)]
pub struct Container {
	pub(super) selection: Selection,
}

/// Optional arguments for [`Container::with_exec_opts`].
#[derive(Debug, Clone, Default)]
pub struct ContainerWithExecOpts {
	/// Content written to the command's standard input.
	pub stdin: Option<String>,
	pub redirect_stdout: Option<String>,
	pub redirect_stderr: Option<String>,
	pub experimental_privileged_nesting: Option<bool>,
}

impl Container {
	/// Initializes the container from an image reference.
	pub fn from(&self, address: impl Into<String>) -> Container {
		let args = Arguments::new().arg("address", address.into());
		Self::from_selection(self.selection.select_with("from", args))
	}

	pub fn with_exec<I, S>(&self, args: I) -> Container
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.with_exec_opts(args, ContainerWithExecOpts::default())
	}

	pub fn with_exec_opts<I, S>(&self, args: I, opts: ContainerWithExecOpts) -> Container
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let exec: Vec<String> = args.into_iter().map(Into::into).collect();
		let args = Arguments::new()
			.arg("args", exec)
			.arg("stdin", opts.stdin)
			.arg("redirectStdout", opts.redirect_stdout)
			.arg("redirectStderr", opts.redirect_stderr)
			.arg("experimentalPrivilegedNesting", opts.experimental_privileged_nesting);
		Self::from_selection(self.selection.select_with("withExec", args))
	}

	pub fn with_env_variable(&self, name: impl Into<String>, value: impl Into<String>) -> Container {
		let args = Arguments::new().arg("name", name.into()).arg("value", value.into());
		Self::from_selection(self.selection.select_with("withEnvVariable", args))
	}

	pub fn with_workdir(&self, path: impl Into<String>) -> Container {
		let args = Arguments::new().arg("path", path.into());
		Self::from_selection(self.selection.select_with("withWorkdir", args))
	}

	/// Mounts a cache volume, given by ID or by handle.
	pub fn with_mounted_cache(&self, path: impl Into<String>, cache: impl Into<ObjectRef<CacheVolumeId>>) -> Container {
		let cache = cache.into();
		let args = Arguments::new().arg("path", path.into()).arg("cache", cache.argument());
		Self::from_selection(self.selection.select_deferred("withMountedCache", args, cache.deferred("cache")))
	}

	pub fn with_mounted_directory(&self, path: impl Into<String>, source: impl Into<ObjectRef<DirectoryId>>) -> Container {
		let source = source.into();
		let args = Arguments::new().arg("path", path.into()).arg("source", source.argument());
		Self::from_selection(self.selection.select_deferred("withMountedDirectory", args, source.deferred("source")))
	}

	pub async fn stdout(&self) -> Result<String> {
		self.selection.select("stdout").execute().await
	}

	pub async fn stderr(&self) -> Result<String> {
		self.selection.select("stderr").execute().await
	}

	pub async fn exit_code(&self) -> Result<i64> {
		self.selection.select("exitCode").execute().await
	}

	pub async fn id(&self) -> Result<ContainerId> {
		self.selection.select("id").execute().await
	}
}
