use dagger_protocol::Arguments;
use dagger_runtime::Result;

use super::DirectoryId;
use crate::selection::Selection;

#[derive(Debug, Clone)]
pub struct Directory {
	pub(super) selection: Selection,
}

impl Directory {
	/// Names of the entries at the directory root.
	pub async fn entries(&self) -> Result<Vec<String>> {
		self.selection.select("entries").execute().await
	}

	/// Names of the entries under `path`, relative to this directory.
	pub async fn entries_at(&self, path: impl Into<String>) -> Result<Vec<String>> {
		let args = Arguments::new().arg("path", path.into());
		self.selection.select_with("entries", args).execute().await
	}

	pub async fn id(&self) -> Result<DirectoryId> {
		self.selection.select("id").execute().await
	}
}
