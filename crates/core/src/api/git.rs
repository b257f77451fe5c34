use dagger_protocol::Arguments;
use dagger_runtime::Result;

use super::Directory;
use crate::selection::Selection;

/// A remote git repository.
#[derive(Debug, Clone)]
pub struct GitRepository {
	pub(super) selection: Selection,
}

/// A branch or tag within a [`GitRepository`].
#[derive(Debug, Clone)]
pub struct GitRef {
	pub(super) selection: Selection,
}

impl GitRepository {
	pub fn branch(&self, name: impl Into<String>) -> GitRef {
		let args = Arguments::new().arg("name", name.into());
		GitRef::from_selection(self.selection.select_with("branch", args))
	}

	pub fn tag(&self, name: impl Into<String>) -> GitRef {
		let args = Arguments::new().arg("name", name.into());
		GitRef::from_selection(self.selection.select_with("tag", args))
	}
}

impl GitRef {
	/// Filesystem tree at this ref.
	pub fn tree(&self) -> Directory {
		Directory::from_selection(self.selection.select("tree"))
	}

	pub async fn commit(&self) -> Result<String> {
		self.selection.select("commit").execute().await
	}
}
