use std::sync::LazyLock;

/// The name of the root query object in every generated schema.
pub const QUERY_TYPE_NAME: &str = "Query";

/// The name of the scalar used for values which are passed through opaquely.
pub const RAW_SCALAR_NAME: &str = "RawString";

/// The name of the scalar used for values which render themselves as text.
pub const TEXT_SCALAR_NAME: &str = "TextString";

/// The placeholder used when a type name canonicalizes to nothing.
pub const ANONYMOUS_TYPE_NAME: &str = "anonymous";

/// Prefix of the generic container scalars for growable lists.
pub const LIST_SCALAR_PREFIX: &str = "List_";

/// Prefix of the generic container scalars for fixed-size arrays.
pub const ARRAY_SCALAR_PREFIX: &str = "Array_";

/// Prefix of the generic container scalars for maps.
pub const MAP_SCALAR_PREFIX: &str = "Map_";

/// The tag key which declares the exposed name of a field.
pub static GRAPH_KEY_TAG: LazyLock<String> =
	lazy_env_parse!("GRAPHLOADER_GRAPH_KEY_TAG", String, || "gql".to_owned());

/// The tag key which marks an argument field as sourced from the root data.
pub static ROOT_KEY_TAG: LazyLock<String> =
	lazy_env_parse!("GRAPHLOADER_ROOT_KEY_TAG", String, || "root".to_owned());

/// The method name prefix which marks override and synthetic field resolvers.
pub static METHOD_PREFIX: LazyLock<String> =
	lazy_env_parse!("GRAPHLOADER_METHOD_PREFIX", String, || "GGL_".to_owned());

/// The naming configuration used while building a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Tag key declaring a field's exposed name. Untagged fields are excluded.
	pub graph_key_tag: String,
	/// Tag key marking an argument field as sourced from the root data.
	pub root_key_tag: String,
	/// Prefix of override and synthetic resolver methods.
	pub method_prefix: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			graph_key_tag: GRAPH_KEY_TAG.clone(),
			root_key_tag: ROOT_KEY_TAG.clone(),
			method_prefix: METHOD_PREFIX.clone(),
		}
	}
}

/// Returns true if the name is used by the registry for its own entries.
pub(crate) fn is_reserved_name(name: &str) -> bool {
	name == QUERY_TYPE_NAME
		|| name == RAW_SCALAR_NAME
		|| name == TEXT_SCALAR_NAME
		|| name.starts_with(LIST_SCALAR_PREFIX)
		|| name.starts_with(ARRAY_SCALAR_PREFIX)
		|| name.starts_with(MAP_SCALAR_PREFIX)
}
