//! Typed handles over the engine's object graph.
//!
//! Each handle wraps a [`Selection`](crate::Selection). Chaining methods are
//! synchronous and return a new handle; terminal methods are `async` and
//! perform exactly one round trip.

use dagger_protocol::QueryTree;

use crate::selection::Selection;

/// Accessors every handle shares: construction from a selection plus inspection.
macro_rules! handle {
	($($ty:ident),* $(,)?) => {
		$(
			impl $ty {
				pub(crate) fn from_selection(selection: Selection) -> Self {
					Self { selection }
				}

				pub fn selection(&self) -> &Selection {
					&self.selection
				}

				pub fn query_tree(&self) -> &QueryTree {
					self.selection.query_tree()
				}

				/// GraphQL document this handle would send.
				pub fn query(&self) -> String {
					self.selection.query()
				}
			}
		)*
	};
}

mod cache_volume;
mod client;
mod container;
mod directory;
mod git;
mod ids;

pub use cache_volume::CacheVolume;
pub use client::{Client, ContainerOpts, GitOpts};
pub use container::{Container, ContainerWithExecOpts};
pub use directory::Directory;
pub use git::{GitRef, GitRepository};
pub use ids::{CacheVolumeId, ContainerId, DirectoryId, ObjectRef};

handle!(Client, Container, CacheVolume, Directory, GitRepository, GitRef);
