//! Query tree plus the transport it will eventually run on.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dagger_protocol::{Arguments, OperationNode, QueryTree, build_batch_query, build_query, query_flatten};
use dagger_runtime::{LazyTransport, Result, SharedTransport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

/// An immutable position in the query graph.
///
/// Every chaining call returns a new `Selection` that shares its prefix with
/// the one it came from; nothing is sent until a terminal method runs.
///
/// A selection may carry deferred ID arguments: handles passed where an
/// object ID is expected. Their `id` is fetched, each with its own round
/// trip, right before this selection's query is sent.
#[derive(Clone)]
pub struct Selection {
	tree: QueryTree,
	transport: SharedTransport,
	deferred: Vec<DeferredId>,
}

/// An argument of node `index` whose value is `source`'s `id`.
#[derive(Clone)]
struct DeferredId {
	index: usize,
	key: &'static str,
	source: Selection,
}

type IdFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

fn fetch_id(source: Selection) -> IdFuture {
	Box::pin(async move { source.select("id").execute::<String>().await })
}

impl Selection {
	/// Root selection over `transport`.
	pub fn root(transport: SharedTransport) -> Self {
		Self {
			tree: QueryTree::new(),
			transport,
			deferred: Vec::new(),
		}
	}

	/// Root selection that resolves its session from the environment on first use.
	pub fn lazy() -> Self {
		Self::root(Arc::new(LazyTransport::new()))
	}

	/// Appends a field without arguments.
	pub fn select(&self, field: &'static str) -> Self {
		self.select_with(field, Arguments::new())
	}

	/// Appends a field with arguments. Absent arguments are dropped when rendering.
	pub fn select_with(&self, field: &'static str, args: Arguments) -> Self {
		self.select_deferred(field, args, std::iter::empty())
	}

	/// Appends a field whose `ids` arguments are filled from other selections at execution.
	///
	/// `args` should already hold a placeholder (usually absent) for each key
	/// so the resolved value keeps its position.
	pub fn select_deferred(&self, field: &'static str, args: Arguments, ids: impl IntoIterator<Item = (&'static str, Selection)>) -> Self {
		let index = self.tree.len();
		let mut deferred = self.deferred.clone();
		deferred.extend(ids.into_iter().map(|(key, source)| DeferredId { index, key, source }));
		Self {
			tree: self.tree.push(OperationNode::from_static(field, args)),
			transport: Arc::clone(&self.transport),
			deferred,
		}
	}

	/// Returns `true` when some ID arguments are only known after execution starts.
	///
	/// [`Selection::query`] renders those arguments as absent.
	pub fn has_deferred_ids(&self) -> bool {
		!self.deferred.is_empty()
	}

	/// The tree with every deferred ID fetched and filled in.
	pub async fn resolved_tree(&self) -> Result<QueryTree> {
		if self.deferred.is_empty() {
			return Ok(self.tree.clone());
		}

		let mut nodes: Vec<OperationNode> = self.tree.nodes().into_iter().cloned().collect();
		for deferred in &self.deferred {
			let id = fetch_id(deferred.source.clone()).await?;
			debug!(target = "dagger.query", key = deferred.key, "resolved deferred id");
			let node = &nodes[deferred.index];
			let mut args = node.args().clone();
			args.insert(deferred.key, id);
			nodes[deferred.index] = OperationNode::new(node.operation(), args)?;
		}
		Ok(nodes.into_iter().collect())
	}

	pub fn query_tree(&self) -> &QueryTree {
		&self.tree
	}

	pub fn transport(&self) -> &SharedTransport {
		&self.transport
	}

	/// GraphQL document for this selection, without resolving deferred IDs.
	pub fn query(&self) -> String {
		build_query(&self.tree)
	}

	/// Sends the query and returns the unflattened `data` object.
	pub async fn execute_raw(&self) -> Result<Value> {
		let query = build_query(&self.resolved_tree().await?);
		debug!(target = "dagger.query", depth = self.tree.len(), "executing query");
		trace!(target = "dagger.query", %query);
		self.transport.execute(&query).await
	}

	/// Sends the query, flattens the response to its single leaf and decodes it.
	pub async fn execute<T: DeserializeOwned>(&self) -> Result<T> {
		let data = self.execute_raw().await?;
		let leaf = query_flatten(data)?;
		Ok(serde_json::from_value(leaf)?)
	}

	/// Sends several selections as one document and returns the raw `data` object.
	///
	/// Selections are rendered in order; the transport of `self` is used for all of them.
	pub async fn execute_batch(&self, selections: &[Selection]) -> Result<Value> {
		let mut trees = Vec::with_capacity(selections.len());
		for selection in selections {
			trees.push(selection.resolved_tree().await?);
		}
		let query = build_batch_query(&trees);
		debug!(target = "dagger.query", selections = trees.len(), "executing batch query");
		trace!(target = "dagger.query", %query);
		self.transport.execute(&query).await
	}
}

impl fmt::Debug for Selection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Selection")
			.field("query", &self.query())
			.field("deferred_ids", &self.deferred.len())
			.finish_non_exhaustive()
	}
}
