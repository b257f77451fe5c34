use std::fmt;

use dagger_protocol::Argument;
use serde::{Deserialize, Serialize};

use super::{CacheVolume, Container, Directory};
use crate::selection::Selection;

/// An object passed as an argument: a known ID or a handle whose ID is
/// fetched when the query that uses it is executed.
#[derive(Debug, Clone)]
pub enum ObjectRef<Id> {
	Id(Id),
	Handle(Selection),
}

impl<Id: Clone + Into<Argument>> ObjectRef<Id> {
	/// Literal value for the argument slot; absent until a handle is resolved.
	pub(crate) fn argument(&self) -> Argument {
		match self {
			ObjectRef::Id(id) => id.clone().into(),
			ObjectRef::Handle(_) => Argument::Absent,
		}
	}

	pub(crate) fn deferred(self, key: &'static str) -> Option<(&'static str, Selection)> {
		match self {
			ObjectRef::Id(_) => None,
			ObjectRef::Handle(selection) => Some((key, selection)),
		}
	}
}

macro_rules! object_id {
	($(#[$meta:meta])* $name:ident for $handle:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}

			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<$name> for Argument {
			fn from(id: $name) -> Self {
				Argument::String(id.0)
			}
		}

		impl From<&$name> for Argument {
			fn from(id: &$name) -> Self {
				Argument::String(id.0.clone())
			}
		}

		impl From<$name> for ObjectRef<$name> {
			fn from(id: $name) -> Self {
				ObjectRef::Id(id)
			}
		}

		impl From<&$name> for ObjectRef<$name> {
			fn from(id: &$name) -> Self {
				ObjectRef::Id(id.clone())
			}
		}

		impl From<$handle> for ObjectRef<$name> {
			fn from(handle: $handle) -> Self {
				ObjectRef::Handle(handle.selection)
			}
		}

		impl From<&$handle> for ObjectRef<$name> {
			fn from(handle: &$handle) -> Self {
				ObjectRef::Handle(handle.selection.clone())
			}
		}
	};
}

object_id!(
	/// Opaque engine identifier for a container state.
	ContainerId for Container
);
object_id!(
	/// Opaque engine identifier for a cache volume.
	CacheVolumeId for CacheVolume
);
object_id!(
	/// Opaque engine identifier for a directory snapshot.
	DirectoryId for Directory
);
