//! Operation arguments and their GraphQL literal forms.

use std::fmt::{self, Write as _};

use serde_json::Number;

/// A single argument value attached to an operation.
///
/// The set of variants is closed so rendering is an exhaustive match.
/// [`Argument::Absent`] is dropped from the rendered document entirely,
/// which is different from sending `null` or an empty value.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
	String(String),
	Number(Number),
	Boolean(bool),
	Sequence(Vec<Argument>),
	Object(Arguments),
	Absent,
}

impl Argument {
	/// Builds a numeric argument from a float; `None` for NaN or infinities.
	pub fn from_f64(value: f64) -> Option<Self> {
		Number::from_f64(value).map(Argument::Number)
	}

	/// Returns `true` when this argument is omitted from serialization.
	pub fn is_absent(&self) -> bool {
		matches!(self, Argument::Absent)
	}

	/// Appends the GraphQL literal for this argument to `out`.
	///
	/// Absent values write nothing; callers that own a key must check
	/// [`Argument::is_absent`] first so the key is dropped too.
	pub fn write_literal(&self, out: &mut String) {
		match self {
			Argument::String(s) => write_string(out, s),
			Argument::Number(n) => {
				let _ = write!(out, "{n}");
			}
			Argument::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
			Argument::Sequence(items) => {
				out.push('[');
				let mut first = true;
				for item in items.iter().filter(|item| !item.is_absent()) {
					if !first {
						out.push(',');
					}
					first = false;
					item.write_literal(out);
				}
				out.push(']');
			}
			Argument::Object(fields) => {
				out.push('{');
				fields.write_fields(out);
				out.push('}');
			}
			Argument::Absent => {}
		}
	}

	/// Renders the GraphQL literal for this argument.
	pub fn to_literal(&self) -> String {
		let mut out = String::new();
		self.write_literal(&mut out);
		out
	}
}

impl fmt::Display for Argument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_literal())
	}
}

// JSON string escaping is a subset of GraphQL's string escapes.
fn write_string(out: &mut String, value: &str) {
	match serde_json::to_string(value) {
		Ok(quoted) => out.push_str(&quoted),
		Err(_) => {
			out.push('"');
			out.push_str(value);
			out.push('"');
		}
	}
}

/// Insertion-ordered argument map with unique keys.
///
/// Re-inserting an existing key replaces its value and keeps its position,
/// so the rendered order is always the order keys were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
	entries: Vec<(String, Argument)>,
}

impl Arguments {
	/// Creates an empty argument map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn arg(mut self, key: impl Into<String>, value: impl Into<Argument>) -> Self {
		self.insert(key, value);
		self
	}

	/// Inserts or replaces `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Argument>) {
		let key = key.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
			Some((_, slot)) => *slot = value,
			None => self.entries.push((key, value)),
		}
	}

	pub fn get(&self, key: &str) -> Option<&Argument> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Number of keys, including absent ones.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns `true` when at least one value would be rendered.
	pub fn has_present(&self) -> bool {
		self.entries.iter().any(|(_, v)| !v.is_absent())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Writes `k1: v1,k2: v2` for every present entry.
	pub fn write_fields(&self, out: &mut String) {
		let mut first = true;
		for (key, value) in self.entries.iter().filter(|(_, v)| !v.is_absent()) {
			if !first {
				out.push(',');
			}
			first = false;
			out.push_str(key);
			out.push_str(": ");
			value.write_literal(out);
		}
	}
}

impl<K: Into<String>, V: Into<Argument>> FromIterator<(K, V)> for Arguments {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut args = Arguments::new();
		for (k, v) in iter {
			args.insert(k, v);
		}
		args
	}
}

impl From<&str> for Argument {
	fn from(value: &str) -> Self {
		Argument::String(value.to_string())
	}
}

impl From<String> for Argument {
	fn from(value: String) -> Self {
		Argument::String(value)
	}
}

impl From<&String> for Argument {
	fn from(value: &String) -> Self {
		Argument::String(value.clone())
	}
}

impl From<bool> for Argument {
	fn from(value: bool) -> Self {
		Argument::Boolean(value)
	}
}

macro_rules! impl_from_integer {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Argument {
				fn from(value: $ty) -> Self {
					Argument::Number(Number::from(value))
				}
			}
		)*
	};
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<Number> for Argument {
	fn from(value: Number) -> Self {
		Argument::Number(value)
	}
}

impl From<Arguments> for Argument {
	fn from(value: Arguments) -> Self {
		Argument::Object(value)
	}
}

impl<T: Into<Argument>> From<Option<T>> for Argument {
	fn from(value: Option<T>) -> Self {
		value.map_or(Argument::Absent, Into::into)
	}
}

impl<T: Into<Argument>> From<Vec<T>> for Argument {
	fn from(value: Vec<T>) -> Self {
		Argument::Sequence(value.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Argument>, const N: usize> From<[T; N]> for Argument {
	fn from(value: [T; N]) -> Self {
		Argument::Sequence(value.into_iter().map(Into::into).collect())
	}
}

impl<T: Clone + Into<Argument>> From<&[T]> for Argument {
	fn from(value: &[T]) -> Self {
		Argument::Sequence(value.iter().cloned().map(Into::into).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scalar_literals() {
		assert_eq!(Argument::from("alpine").to_literal(), "\"alpine\"");
		assert_eq!(Argument::from(1).to_literal(), "1");
		assert_eq!(Argument::from(-42i64).to_literal(), "-42");
		assert_eq!(Argument::from(true).to_literal(), "true");
		assert_eq!(Argument::from_f64(1.5).unwrap().to_literal(), "1.5");
		assert!(Argument::from_f64(f64::NAN).is_none());
	}

	#[test]
	fn strings_use_standard_escapes() {
		let arg = Argument::from("say \"hi\"\\\n");
		assert_eq!(arg.to_literal(), r#""say \"hi\"\\\n""#);
	}

	#[test]
	fn sequences_are_comma_joined_without_trailing_comma() {
		assert_eq!(Argument::from(vec!["apk", "add", "curl"]).to_literal(), r#"["apk","add","curl"]"#);
		assert_eq!(Argument::from(Vec::<String>::new()).to_literal(), "[]");
		assert_eq!(Argument::from([1, 2]).to_literal(), "[1,2]");
	}

	#[test]
	fn absent_entries_are_skipped_in_sequences() {
		let arg = Argument::Sequence(vec![Argument::from("a"), Argument::Absent, Argument::from("b")]);
		assert_eq!(arg.to_literal(), r#"["a","b"]"#);
	}

	#[test]
	fn objects_render_ordered_fields() {
		let obj = Arguments::new().arg("name", "x").arg("skip", None::<bool>).arg("depth", 2);
		assert_eq!(Argument::from(obj).to_literal(), r#"{name: "x",depth: 2}"#);
		assert_eq!(Argument::from(Arguments::new()).to_literal(), "{}");
	}

	#[test]
	fn option_maps_none_to_absent() {
		assert!(Argument::from(None::<&str>).is_absent());
		assert_eq!(Argument::from(Some("x")), Argument::String("x".into()));
	}

	#[test]
	fn reinsert_keeps_original_position() {
		let mut args = Arguments::new().arg("a", 1).arg("b", 2);
		args.insert("a", 3);
		let keys: Vec<_> = args.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, ["a", "b"]);
		assert_eq!(args.get("a"), Some(&Argument::from(3)));
		assert_eq!(args.len(), 2);
	}

	#[test]
	fn has_present_ignores_absent_values() {
		let args = Arguments::new().arg("x", None::<i32>);
		assert!(!args.is_empty());
		assert!(!args.has_present());
	}

	#[test]
	fn collects_from_pairs() {
		let args: Arguments = [("k", "v"), ("k2", "v2")].into_iter().collect();
		let mut out = String::new();
		args.write_fields(&mut out);
		assert_eq!(out, r#"k: "v",k2: "v2""#);
	}
}
