use std::any::{TypeId, type_name};
use std::fmt;

use crate::cnf::{ANONYMOUS_TYPE_NAME, is_reserved_name};

/// The identity of a Rust type as seen by the schema registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
	id: TypeId,
	name: &'static str,
}

impl TypeIdentity {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: type_name::<T>(),
		}
	}

	pub fn id(&self) -> TypeId {
		self.id
	}

	/// The module-qualified name of the type.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// The registry key of the type, derived from its module-qualified name.
	pub fn canonical_name(&self) -> String {
		canonical_name(self.name)
	}

	/// The type name with every module path removed, sanitized for the schema.
	pub fn short_name(&self) -> String {
		sanitize(&short_type_name(self.name))
	}
}

impl fmt::Debug for TypeIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Replaces every run of characters which are not valid in a schema name with
/// a single `_`, trimming them at both ends.
pub fn sanitize(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	let mut pending = false;
	for c in name.chars() {
		if c.is_ascii_alphanumeric() {
			if pending && !out.is_empty() {
				out.push('_');
			}
			pending = false;
			out.push(c);
		} else if !out.is_empty() {
			pending = true;
		}
	}
	if out.is_empty() {
		return ANONYMOUS_TYPE_NAME.to_owned();
	}
	out
}

/// Derives the registry key of a type from its module-qualified name.
///
/// The result is a pure function of the name. Names which clash with the
/// registry's own bookkeeping entries receive a trailing `_`.
pub fn canonical_name(name: &str) -> String {
	let mut out = sanitize(name);
	if is_reserved_name(&out) {
		out.push('_');
	}
	out
}

/// Removes the module path of every type mentioned in a type name, so that
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	let mut segment = 0;
	let mut chars = name.chars().peekable();
	while let Some(c) = chars.next() {
		if c == ':' && chars.peek() == Some(&':') {
			chars.next();
			out.truncate(segment);
			continue;
		}
		out.push(c);
		if !(c.is_alphanumeric() || c == '_') {
			segment = out.len();
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("shop::Product", "shop_Product")]
	#[case("my-crate::a::b_C", "my_crate_a_b_C")]
	#[case("shop::Page<shop::Product>", "shop_Page_shop_Product")]
	#[case("::", "anonymous")]
	#[case("", "anonymous")]
	#[case("Query", "Query_")]
	#[case("RawString", "RawString_")]
	#[case("List_i32", "List_i32_")]
	#[case("[u8; 4]", "u8_4")]
	fn canonical_names(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(canonical_name(input), expected);
	}

	#[rstest]
	#[case("alloc::string::String", "String")]
	#[case("alloc::vec::Vec<alloc::string::String>", "Vec<String>")]
	#[case("std::collections::HashMap<alloc::string::String, i64>", "HashMap<String, i64>")]
	#[case("i32", "i32")]
	#[case("[shop::Product; 3]", "[Product; 3]")]
	fn short_type_names(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(short_type_name(input), expected);
	}

	#[test]
	fn canonical_name_is_deterministic() {
		struct Sample;
		let a = TypeIdentity::of::<Sample>();
		let b = TypeIdentity::of::<Sample>();
		assert_eq!(a, b);
		assert_eq!(a.canonical_name(), b.canonical_name());
		assert!(a.canonical_name().ends_with("_Sample"));
		assert_eq!(a.short_name(), "Sample");
	}
}
