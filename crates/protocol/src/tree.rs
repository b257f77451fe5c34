//! Persistent query trees.
//!
//! A [`QueryTree`] is an append-only chain of [`OperationNode`]s stored as an
//! `Arc`-linked list from the innermost node back to the root. Appending
//! allocates one link and shares the whole prefix, so handles derived from
//! a common ancestor are cheap and can never observe each other's nodes.

use std::sync::Arc;

use crate::argument::Arguments;
use crate::error::ProtocolError;

/// One named operation plus its keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationNode {
	operation: String,
	args: Arguments,
}

impl OperationNode {
	/// Creates a node, rejecting empty operation names.
	pub fn new(operation: impl Into<String>, args: Arguments) -> Result<Self, ProtocolError> {
		let operation = operation.into();
		if operation.is_empty() {
			return Err(ProtocolError::EmptyOperation);
		}
		Ok(Self { operation, args })
	}

	/// Creates a node for a schema field known at compile time.
	///
	/// Generated operation methods pass literal field names only, so the
	/// non-empty invariant is checked in debug builds.
	pub fn from_static(operation: &'static str, args: Arguments) -> Self {
		debug_assert!(!operation.is_empty(), "operation name must not be empty");
		Self {
			operation: operation.to_string(),
			args,
		}
	}

	/// Creates a node without arguments.
	pub fn field(operation: impl Into<String>) -> Result<Self, ProtocolError> {
		Self::new(operation, Arguments::new())
	}

	pub fn operation(&self) -> &str {
		&self.operation
	}

	pub fn args(&self) -> &Arguments {
		&self.args
	}
}

#[derive(Debug)]
struct Link {
	node: OperationNode,
	parent: Option<Arc<Link>>,
}

/// Immutable ordered sequence of operation nodes, outermost first.
#[derive(Debug, Clone, Default)]
pub struct QueryTree {
	tail: Option<Arc<Link>>,
	len: usize,
}

impl QueryTree {
	/// Creates an empty tree.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a new tree equal to `self` with `node` appended.
	#[must_use]
	pub fn push(&self, node: OperationNode) -> Self {
		Self {
			tail: Some(Arc::new(Link {
				node,
				parent: self.tail.clone(),
			})),
			len: self.len + 1,
		}
	}

	/// Appends `operation(args)`, rejecting empty names.
	pub fn select(&self, operation: impl Into<String>, args: Arguments) -> Result<Self, ProtocolError> {
		Ok(self.push(OperationNode::new(operation, args)?))
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Innermost node, if any.
	pub fn last(&self) -> Option<&OperationNode> {
		self.tail.as_deref().map(|link| &link.node)
	}

	/// Nodes in order, outermost first.
	pub fn nodes(&self) -> Vec<&OperationNode> {
		let mut nodes = Vec::with_capacity(self.len);
		let mut cursor = self.tail.as_deref();
		while let Some(link) = cursor {
			nodes.push(&link.node);
			cursor = link.parent.as_deref();
		}
		nodes.reverse();
		nodes
	}

	/// Returns `true` when `prefix` is this tree or one of its ancestors.
	pub fn starts_with(&self, prefix: &QueryTree) -> bool {
		if prefix.len > self.len {
			return false;
		}
		let mut cursor = self.tail.as_ref();
		for _ in 0..(self.len - prefix.len) {
			cursor = cursor.and_then(|link| link.parent.as_ref());
		}
		let mut right = prefix.tail.as_ref();
		loop {
			match (cursor, right) {
				(None, None) => return true,
				(Some(l), Some(r)) if Arc::ptr_eq(l, r) => return true,
				(Some(l), Some(r)) if l.node == r.node => {
					cursor = l.parent.as_ref();
					right = r.parent.as_ref();
				}
				_ => return false,
			}
		}
	}
}

impl PartialEq for QueryTree {
	fn eq(&self, other: &Self) -> bool {
		self.len == other.len && self.starts_with(other)
	}
}

impl FromIterator<OperationNode> for QueryTree {
	fn from_iter<I: IntoIterator<Item = OperationNode>>(iter: I) -> Self {
		iter.into_iter().fold(QueryTree::new(), |tree, node| tree.push(node))
	}
}
