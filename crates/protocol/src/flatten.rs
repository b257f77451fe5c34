//! Response flattening.
//!
//! The engine answers a linear selection chain with a chain of single-key
//! objects, e.g. `{"container": {"from": {"stdout": "hi"}}}`. Flattening
//! walks that chain and returns the leaf. A level with zero or several keys
//! means the document asked for more than one result, which has no single
//! answer.

use serde_json::Value;

use crate::error::FlattenError;

/// Reduces a single-key object chain to its terminal value.
///
/// Scalars, arrays and `null` are returned unchanged, including at the root.
pub fn query_flatten(response: Value) -> Result<Value, FlattenError> {
	let mut current = response;
	let mut path: Vec<String> = Vec::new();
	loop {
		match current {
			Value::Object(map) => {
				let keys = map.len();
				match (keys, map.into_iter().next()) {
					(1, Some((key, value))) => {
						path.push(key);
						current = value;
					}
					_ => {
						return Err(FlattenError::TooManyNestedObjects { path: path.join("."), keys });
					}
				}
			}
			leaf => return Ok(leaf),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn returns_leaf_of_single_key_chain() {
		let tree = json!({
			"container": {
				"from": {
					"exec": {
						"stdout": "fetch https://dl-cdn.alpinelinux.org/alpine/v3.16/main/aarch64/APKINDEX.tar.gz"
					}
				}
			}
		});
		assert_eq!(
			query_flatten(tree).unwrap(),
			json!("fetch https://dl-cdn.alpinelinux.org/alpine/v3.16/main/aarch64/APKINDEX.tar.gz")
		);
	}

	#[test]
	fn sibling_keys_at_root_are_ambiguous() {
		let tree = json!({
			"container": { "from": "from" },
			"host": { "directory": "directory" }
		});
		let err = query_flatten(tree).unwrap_err();
		assert_eq!(
			err,
			FlattenError::TooManyNestedObjects {
				path: String::new(),
				keys: 2
			}
		);
	}

	#[test]
	fn ambiguity_below_root_reports_path() {
		let tree = json!({ "container": { "from": { "a": 1, "b": 2 } } });
		match query_flatten(tree).unwrap_err() {
			FlattenError::TooManyNestedObjects { path, keys } => {
				assert_eq!(path, "container.from");
				assert_eq!(keys, 2);
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn empty_object_is_ambiguous() {
		assert!(query_flatten(json!({})).unwrap_err().is_too_many_nested_objects());
		assert!(query_flatten(json!({ "container": {} })).is_err());
	}

	#[test]
	fn non_objects_are_terminal() {
		assert_eq!(query_flatten(json!(0)).unwrap(), json!(0));
		assert_eq!(query_flatten(json!(null)).unwrap(), Value::Null);
		assert_eq!(query_flatten(json!({ "directory": { "entries": ["a", "b"] } })).unwrap(), json!(["a", "b"]));
		assert_eq!(
			query_flatten(json!({ "list": [{ "a": 1 }, { "b": 2 }] })).unwrap(),
			json!([{ "a": 1 }, { "b": 2 }])
		);
	}
}
