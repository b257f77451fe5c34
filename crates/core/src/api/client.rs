use dagger_protocol::Arguments;
use dagger_runtime::{Result, SharedTransport};
use serde_json::Value;

use super::{CacheVolume, Container, ContainerId, Directory, GitRepository, ObjectRef};
use crate::selection::Selection;

/// Root of the query graph.
#[derive(Debug, Clone)]
pub struct Client {
	pub(super) selection: Selection,
}

/// Optional arguments for [`Client::container_opts`].
#[derive(Debug, Clone, Default)]
pub struct ContainerOpts {
	/// Resume from a container state, by ID or from another container handle.
	pub id: Option<ObjectRef<ContainerId>>,
	/// Target platform such as `linux/arm64`.
	pub platform: Option<String>,
}

/// Optional arguments for [`Client::git_opts`].
#[derive(Debug, Clone, Default)]
pub struct GitOpts {
	pub keep_git_dir: Option<bool>,
}

impl Default for Client {
	fn default() -> Self {
		Self::new()
	}
}

impl Client {
	/// Client that picks up an external session from the environment when first executed.
	///
	/// Query building never touches the environment, so this is also the
	/// cheapest way to render documents offline.
	pub fn new() -> Self {
		Self::from_selection(Selection::lazy())
	}

	pub fn with_transport(transport: SharedTransport) -> Self {
		Self::from_selection(Selection::root(transport))
	}

	pub fn container(&self) -> Container {
		Container::from_selection(self.selection.select("container"))
	}

	pub fn container_opts(&self, opts: ContainerOpts) -> Container {
		let args = Arguments::new()
			.arg("id", opts.id.as_ref().map(ObjectRef::argument))
			.arg("platform", opts.platform);
		let deferred = opts.id.and_then(|id| id.deferred("id"));
		Container::from_selection(self.selection.select_deferred("container", args, deferred))
	}

	pub fn git(&self, url: impl Into<String>) -> GitRepository {
		self.git_opts(url, GitOpts::default())
	}

	pub fn git_opts(&self, url: impl Into<String>, opts: GitOpts) -> GitRepository {
		let args = Arguments::new().arg("url", url.into()).arg("keepGitDir", opts.keep_git_dir);
		GitRepository::from_selection(self.selection.select_with("git", args))
	}

	pub fn cache_volume(&self, key: impl Into<String>) -> CacheVolume {
		let args = Arguments::new().arg("key", key.into());
		CacheVolume::from_selection(self.selection.select_with("cacheVolume", args))
	}

	/// Directory on the machine running the session.
	pub fn host_directory(&self, path: impl Into<String>) -> Directory {
		let args = Arguments::new().arg("path", path.into());
		Directory::from_selection(self.selection.select("host").select_with("directory", args))
	}

	pub async fn default_platform(&self) -> Result<String> {
		self.selection.select("defaultPlatform").execute().await
	}

	/// Renders every selection into one document and returns the engine's `data` unflattened.
	pub async fn execute_batch(&self, selections: &[Selection]) -> Result<Value> {
		self.selection.execute_batch(selections).await
	}
}
