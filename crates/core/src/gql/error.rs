use thiserror::Error;

#[derive(Debug, Error)]
pub enum GqlError {
	#[error("Error generating schema: {0}")]
	SchemaError(String),
	#[error("The root resolver does not expose any fields")]
	EmptySchema,
	#[error("Types `{first}` and `{second}` both map to the schema name `{name}`")]
	TypeCollision {
		name: String,
		first: String,
		second: String,
	},
	#[error("Type `{ty}` already has the custom scalar `{first}`, cannot register `{second}`")]
	DuplicateScalar {
		ty: String,
		first: String,
		second: String,
	},
	#[error("Field `{field}` is declared more than once on `{owner}`")]
	DuplicateField {
		owner: String,
		field: String,
	},
	#[error("Method `{method}` on `{owner}` does not carry the resolver prefix `{prefix}`")]
	InvalidMethod {
		owner: String,
		method: String,
		prefix: String,
	},
	#[error("{0}")]
	ResolverError(String),
	#[error("{0}")]
	ValidationError(String),
	#[error("Internal Error: {0}")]
	InternalError(String),
}

pub fn schema_error(msg: impl Into<String>) -> GqlError {
	GqlError::SchemaError(msg.into())
}

pub fn resolver_error(msg: impl Into<String>) -> GqlError {
	GqlError::ResolverError(msg.into())
}

pub fn internal_error(msg: impl Into<String>) -> GqlError {
	let msg = msg.into();
	error!("{}", msg);
	GqlError::InternalError(msg)
}

impl From<GqlError> for async_graphql::Error {
	fn from(value: GqlError) -> Self {
		async_graphql::Error::new(value.to_string())
	}
}
