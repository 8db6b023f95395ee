use async_graphql::{Request, Response, Variables};
use graphloader_core::gql::{RootData, Schema};

/// Runs a single request against a [`Schema`].
///
/// The root data is attached to the request, so that argument fields tagged
/// with the root key are filled from it.
pub struct Executor<'s> {
	schema: &'s Schema,
	query: String,
	root: RootData,
	variables: Option<serde_json::Value>,
	operation_name: Option<String>,
}

impl<'s> Executor<'s> {
	pub fn new(schema: &'s Schema) -> Self {
		Self {
			schema,
			query: String::new(),
			root: RootData::default(),
			variables: None,
			operation_name: None,
		}
	}

	pub fn query(mut self, query: impl Into<String>) -> Self {
		self.query = query.into();
		self
	}

	pub fn root(mut self, root: RootData) -> Self {
		self.root = root;
		self
	}

	/// Sets the root data from a JSON object.
	pub fn root_json(self, root: serde_json::Value) -> Self {
		self.root(RootData::from_json(root))
	}

	pub fn variables(mut self, variables: serde_json::Value) -> Self {
		self.variables = Some(variables);
		self
	}

	pub fn operation_name(mut self, name: impl Into<String>) -> Self {
		self.operation_name = Some(name.into());
		self
	}

	fn request(self) -> (&'s Schema, Request) {
		let mut request = Request::new(self.query).data(self.root);
		if let Some(variables) = self.variables {
			request = request.variables(Variables::from_json(variables));
		}
		if let Some(name) = self.operation_name {
			request = request.operation_name(name);
		}
		(self.schema, request)
	}

	pub async fn execute(self) -> Response {
		let (schema, request) = self.request();
		let response = schema.execute(request).await;
		if !response.errors.is_empty() {
			debug!(errors = response.errors.len(), "request completed with field errors");
		}
		response
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::{Context, ResolverDef, RootResolver, SchemaBuilder};

	struct Greeter;

	impl RootResolver for Greeter {
		fn define(def: &mut ResolverDef<Self>) {
			def.method("Hello", |_: &Greeter, _: &Context<'_>| Ok::<_, String>("hello".to_owned()));
		}
	}

	#[test]
	fn requests_carry_the_query_and_operation() {
		let schema = SchemaBuilder::new().build(Greeter).unwrap();
		let (_, request) = Executor::new(&schema)
			.query("query Greet($n: Int) { hello }")
			.root_json(json!({"tenant": "acme"}))
			.variables(json!({"n": 1}))
			.operation_name("Greet")
			.request();
		assert_eq!(request.query, "query Greet($n: Int) { hello }");
		assert_eq!(request.operation_name.as_deref(), Some("Greet"));
	}
}
