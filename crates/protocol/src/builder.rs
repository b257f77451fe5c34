//! Query tree to GraphQL document serialization.
//!
//! A chain `[container][from(address: "alpine")][withExec(args: [..])]`
//! renders as:
//!
//! ```text
//! { container { from (address: "alpine") { withExec (args: ["apk","add","curl"]) }} }
//! ```
//!
//! Every node except the innermost opens a selection set; the innermost
//! closes all of them at once. Arguments keep insertion order and absent
//! values are dropped together with their key.

use crate::tree::{OperationNode, QueryTree};

/// Serializes a single linear chain into a GraphQL document.
pub fn build_query(tree: &QueryTree) -> String {
	build_batch_query(std::slice::from_ref(tree))
}

/// Serializes several independent chains as sibling top-level selections.
///
/// `[[a(x: 1)], [b]]` renders as `{ a (x: 1) b }`. Empty trees are skipped.
pub fn build_batch_query(trees: &[QueryTree]) -> String {
	let mut out = String::from("{");
	for tree in trees.iter().filter(|tree| !tree.is_empty()) {
		out.push(' ');
		write_chain(&mut out, &tree.nodes());
	}
	out.push_str(" }");
	out
}

fn write_chain(out: &mut String, nodes: &[&OperationNode]) {
	let Some((last, outer)) = nodes.split_last() else {
		return;
	};
	for node in outer {
		write_node(out, node);
		out.push_str(" { ");
	}
	write_node(out, last);
	if !outer.is_empty() {
		out.push(' ');
		out.push_str(&"}".repeat(outer.len()));
	}
}

fn write_node(out: &mut String, node: &OperationNode) {
	out.push_str(node.operation());
	if node.args().has_present() {
		out.push_str(" (");
		node.args().write_fields(out);
		out.push(')');
	}
}
