//! Offline document rendering from `name:key=value,...` field specs.
//!
//! Values are read as JSON when they parse (`true`, `3`, `["a","b"]`,
//! `{"k":1}`) and as plain strings otherwise, so `from:address=alpine`
//! needs no quoting. `null` leaves the argument out.

use anyhow::{Context, Result, bail};
use dagger::{Argument, Arguments, OperationNode, QueryTree, build_query};
use serde_json::Value;

pub fn build_document(ops: &[String]) -> Result<String> {
	let mut tree = QueryTree::new();
	for op in ops {
		tree = tree.push(parse_op(op).with_context(|| format!("invalid field `{op}`"))?);
	}
	Ok(build_query(&tree))
}

pub fn parse_op(spec: &str) -> Result<OperationNode> {
	let (name, rest) = match spec.split_once(':') {
		Some((name, rest)) => (name, Some(rest)),
		None => (spec, None),
	};

	let mut args = Arguments::new();
	for pair in rest.map(split_top_level).unwrap_or_default() {
		let Some((key, value)) = pair.split_once('=') else {
			bail!("argument `{pair}` is not key=value");
		};
		let key = key.trim();
		if key.is_empty() {
			bail!("argument `{pair}` has an empty name");
		}
		args.insert(key, parse_value(value));
	}

	Ok(OperationNode::new(name.trim(), args)?)
}

fn parse_value(raw: &str) -> Argument {
	match serde_json::from_str::<Value>(raw) {
		Ok(value) => to_argument(value),
		Err(_) => Argument::String(raw.to_string()),
	}
}

fn to_argument(value: Value) -> Argument {
	match value {
		Value::Null => Argument::Absent,
		Value::Bool(b) => Argument::Boolean(b),
		Value::Number(n) => Argument::Number(n),
		Value::String(s) => Argument::String(s),
		Value::Array(items) => Argument::Sequence(items.into_iter().map(to_argument).collect()),
		Value::Object(map) => Argument::Object(map.into_iter().map(|(k, v)| (k, to_argument(v))).collect()),
	}
}

/// Splits on commas that sit outside brackets, braces and string literals.
fn split_top_level(input: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut depth = 0usize;
	let mut in_string = false;
	let mut escaped = false;
	let mut start = 0;

	for (i, c) in input.char_indices() {
		if in_string {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => {}
			}
			continue;
		}
		match c {
			'"' => in_string = true,
			'[' | '{' => depth += 1,
			']' | '}' => depth = depth.saturating_sub(1),
			',' if depth == 0 => {
				parts.push(&input[start..i]);
				start = i + 1;
			}
			_ => {}
		}
	}
	parts.push(&input[start..]);
	parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}
