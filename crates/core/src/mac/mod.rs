/// A macro that allows lazily parsing a value from the environment variable,
/// with a fallback default value if the variable is not set or parsing fails.
///
/// # Parameters
///
/// - `$key`: An expression representing the name of the environment variable.
/// - `$t`: The type of the value to be parsed.
/// - `$default`: The default value to fall back to if the environment variable is not set or
///   parsing fails.
///
/// # Return Value
///
/// A lazy static variable of type `std::sync::LazyLock`, which holds the parsed
/// value from the environment variable or the default value.
#[macro_export]
macro_rules! lazy_env_parse {
	// With no default specified
	($key:expr_2021, $t:ty) => {
		std::sync::LazyLock::new(|| {
			std::env::var($key).ok().and_then(|s| s.parse::<$t>().ok()).unwrap_or_default()
		})
	};
	// With a closure for the default value
	($key:expr_2021, $t:ty, || $default:expr_2021) => {
		std::sync::LazyLock::new(|| {
			std::env::var($key).ok().and_then(|s| s.parse::<$t>().ok()).unwrap_or_else(|| $default)
		})
	};
	// With a static expression for the default value
	($key:expr_2021, $t:ty, $default:expr_2021) => {
		std::sync::LazyLock::new(|| {
			std::env::var($key).ok().and_then(|s| s.parse::<$t>().ok()).unwrap_or($default)
		})
	};
}

/// Implements [`Reflect`](crate::gql::Reflect) for one or more structs which
/// describe themselves through [`GraphObject`](crate::gql::GraphObject).
///
/// The struct becomes an object type in the schema. Its tagged fields and
/// its convention methods become the object's fields.
///
/// ```ignore
/// reflect_object!(Product, Pagination);
/// ```
#[macro_export]
macro_rules! reflect_object {
	($($ty:ty),+ $(,)?) => {
		$(
			impl $crate::gql::Reflect for $ty {
				fn descriptor() -> $crate::gql::TypeDescriptor {
					$crate::gql::TypeDescriptor::object::<Self>()
				}

				fn to_value(
					&self,
					graph_key: &str,
				) -> ::std::option::Option<$crate::__private::GqlValue> {
					$crate::gql::object::object_to_value(self, graph_key)
				}

				fn from_value(_: &$crate::__private::GqlValue) -> ::std::option::Option<Self> {
					::std::option::Option::None
				}

				fn emit<'a>(
					&'a self,
					plan: &$crate::gql::Plan,
				) -> ::std::option::Option<$crate::__private::FieldValue<'a>> {
					plan.emit_object(self)
				}

				fn emit_owned(
					self,
					plan: &$crate::gql::Plan,
				) -> ::std::option::Option<$crate::__private::FieldValue<'static>> {
					plan.emit_object_owned(self)
				}
			}
		)+
	};
}

/// Implements [`Reflect`](crate::gql::Reflect) for types which render
/// through [`Display`](std::fmt::Display) and parse through
/// [`FromStr`](std::str::FromStr).
///
/// Such types are exposed through the shared text scalar.
#[macro_export]
macro_rules! reflect_text {
	($($ty:ty),+ $(,)?) => {
		$(
			impl $crate::gql::Reflect for $ty {
				fn descriptor() -> $crate::gql::TypeDescriptor {
					$crate::gql::TypeDescriptor::new::<Self>($crate::gql::Kind::Text)
				}

				fn to_value(&self, _: &str) -> ::std::option::Option<$crate::__private::GqlValue> {
					::std::option::Option::Some($crate::__private::GqlValue::String(self.to_string()))
				}

				fn from_value(value: &$crate::__private::GqlValue) -> ::std::option::Option<Self> {
					match value {
						$crate::__private::GqlValue::String(s) => s.parse::<Self>().ok(),
						_ => ::std::option::Option::None,
					}
				}
			}
		)+
	};
}

#[cfg(test)]
mod test {
	use std::sync::LazyLock;

	static UNSET: LazyLock<String> =
		lazy_env_parse!("GRAPHLOADER_TEST_VARIABLE_NEVER_SET", String, || "fallback".to_owned());

	static UNSET_NUMBER: LazyLock<u32> =
		lazy_env_parse!("GRAPHLOADER_TEST_NUMBER_NEVER_SET", u32, 42);

	#[test]
	fn env_parse_falls_back_to_default() {
		assert_eq!(UNSET.as_str(), "fallback");
		assert_eq!(*UNSET_NUMBER, 42);
	}
}
