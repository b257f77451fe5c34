use dagger_runtime::Result;

use super::CacheVolumeId;
use crate::selection::Selection;

/// Persistent cache shared between pipeline runs.
#[derive(Debug, Clone)]
pub struct CacheVolume {
	pub(super) selection: Selection,
}

impl CacheVolume {
	pub async fn id(&self) -> Result<CacheVolumeId> {
		self.selection.select("id").execute().await
	}
}
