//! Encoding and decoding of the generic container scalars.
//!
//! Lists, fixed-size arrays and maps whose elements cannot be addressed by the
//! schema travel as a single scalar value. None of these functions fail: a
//! value which cannot be represented degrades to the empty container.

use async_graphql::Value as GqlValue;

/// A collection carried by a generic container scalar.
pub trait Container: Sized {
	/// The wire form of the empty container, `[]` or `{}`.
	fn empty_literal() -> GqlValue;

	/// Encodes every element. Returns `None` if any element has no wire form.
	fn encode(&self, graph_key: &str) -> Option<GqlValue>;

	/// Decodes a structured value, skipping elements which fail to convert.
	/// A value of the wrong shape decodes to the empty container.
	fn decode(value: &GqlValue) -> Self;
}

/// Serializes a container, naming the fields of nested objects by their
/// `graph_key` tags.
pub fn serialize<C: Container>(value: &C, graph_key: &str) -> GqlValue {
	value.encode(graph_key).unwrap_or_else(|| {
		trace!("container holds an unrepresentable element, serializing as empty");
		C::empty_literal()
	})
}

/// Parses a value bound through a variable or a structured literal.
pub fn parse_value<C: Container>(value: &GqlValue) -> C {
	C::decode(value)
}

/// Parses a container written inline as JSON text.
pub fn parse_literal<C: Container>(literal: &str) -> C {
	match serde_json::from_str::<serde_json::Value>(literal).map(GqlValue::from_json) {
		Ok(Ok(value)) => C::decode(&value),
		_ => {
			trace!(literal, "container literal is not valid JSON, parsing as empty");
			C::decode(&C::empty_literal())
		}
	}
}

pub fn parse<C: Container>(value: &GqlValue) -> C {
	match value {
		GqlValue::String(literal) => parse_literal(literal),
		value => parse_value(value),
	}
}
