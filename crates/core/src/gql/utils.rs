use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};

pub(crate) trait GqlValueUtils {
	fn as_i64(&self) -> Option<i64>;
	fn as_u64(&self) -> Option<u64>;
	fn as_f64(&self) -> Option<f64>;
	fn as_bool(&self) -> Option<bool>;
	fn as_list(&self) -> Option<&Vec<GqlValue>>;
	fn as_object(&self) -> Option<&IndexMap<Name, GqlValue>>;
}

impl GqlValueUtils for GqlValue {
	fn as_i64(&self) -> Option<i64> {
		match self {
			GqlValue::Number(n) => n.as_i64().or_else(|| {
				n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)
			}),
			GqlValue::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	fn as_u64(&self) -> Option<u64> {
		match self {
			GqlValue::Number(n) => n.as_u64(),
			GqlValue::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	fn as_f64(&self) -> Option<f64> {
		match self {
			GqlValue::Number(n) => n.as_f64(),
			GqlValue::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	fn as_bool(&self) -> Option<bool> {
		match self {
			GqlValue::Boolean(b) => Some(*b),
			GqlValue::String(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	fn as_list(&self) -> Option<&Vec<GqlValue>> {
		if let GqlValue::List(a) = self {
			Some(a)
		} else {
			None
		}
	}

	fn as_object(&self) -> Option<&IndexMap<Name, GqlValue>> {
		if let GqlValue::Object(o) = self {
			Some(o)
		} else {
			None
		}
	}
}

/// Renders a scalar value as a map key. Structured values have no key form.
pub(crate) fn key_string(value: &GqlValue) -> Option<String> {
	match value {
		GqlValue::String(s) => Some(s.to_owned()),
		GqlValue::Number(n) => Some(n.to_string()),
		GqlValue::Boolean(b) => Some(b.to_string()),
		GqlValue::Enum(e) => Some(e.to_string()),
		_ => None,
	}
}
