use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::dynamic::{self, Object, Scalar};
use async_graphql::{Request, Response};

use super::convention::lower_camel;
use super::dispatch::{Method, MethodDef};
use super::error::{GqlError, schema_error};
use super::ext::Named;
use super::inspector::Inspector;
use super::reflect::Reflect;
use super::registry::{CustomScalar, Registry, ScalarDef};
use super::validator::Validator;
use crate::cnf::{Config, QUERY_TYPE_NAME};

/// The root instance whose methods become the fields of the query type.
///
/// Every declared method is exposed under the lower camel case form of its
/// name, and is always invoked on the instance passed to
/// [`SchemaBuilder::build`].
pub trait RootResolver: Sized + Send + Sync + 'static {
	fn define(def: &mut ResolverDef<Self>);
}

pub struct ResolverDef<R> {
	methods: Vec<MethodDef>,
	_marker: PhantomData<fn(&R)>,
}

impl<R: RootResolver> ResolverDef<R> {
	pub fn method<M, Marker>(&mut self, name: &str, method: M) -> &mut Self
	where
		M: Method<R, Marker>,
		Marker: 'static,
	{
		self.methods.push(MethodDef::new::<R, M, Marker>(name, method));
		self
	}
}

/// Configures and builds a [`Schema`].
pub struct SchemaBuilder {
	config: Config,
	scalars: Vec<(Scalar, CustomScalar)>,
	validator: Option<Arc<dyn Validator>>,
}

impl Default for SchemaBuilder {
	fn default() -> Self {
		Self::with_config(Config::default())
	}
}

impl SchemaBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: Config) -> Self {
		Self {
			config,
			scalars: Vec::new(),
			validator: None,
		}
	}

	/// Sets the tag key which declares the exposed name of a field.
	pub fn graph_key(mut self, key: impl Into<String>) -> Self {
		self.config.graph_key_tag = key.into();
		self
	}

	/// Sets the tag key which sources an argument field from the root data.
	pub fn root_key(mut self, key: impl Into<String>) -> Self {
		self.config.root_key_tag = key.into();
		self
	}

	/// Sets the name prefix of override and synthetic resolver methods.
	pub fn method_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.config.method_prefix = prefix.into();
		self
	}

	/// Registers a custom scalar which replaces the derived schema type of
	/// every value of the sample's type.
	pub fn scalar<T: Reflect>(mut self, _sample: &T, def: ScalarDef<T>) -> Self {
		self.scalars.push(def.into_parts());
		self
	}

	/// Sets the validator which checks argument structs before any resolver
	/// method runs.
	pub fn validator(mut self, validator: impl Validator) -> Self {
		self.validator = Some(Arc::new(validator));
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Builds the schema exposing the methods of `root`.
	pub fn build<R: RootResolver>(self, root: R) -> Result<Schema, GqlError> {
		let registry = Arc::new(Registry::new());
		for (scalar, custom) in self.scalars {
			registry.register_scalar(scalar, custom)?;
		}

		let mut def = ResolverDef::<R> {
			methods: Vec::new(),
			_marker: PhantomData,
		};
		R::define(&mut def);
		if def.methods.is_empty() {
			return Err(GqlError::EmptySchema);
		}

		let root: Arc<dyn Any + Send + Sync> = Arc::new(root);
		let inspector = Inspector::new(&registry, &self.config, self.validator.as_ref());
		let mut query = Object::new(QUERY_TYPE_NAME);
		let mut names: Vec<String> = Vec::with_capacity(def.methods.len());
		for method in &def.methods {
			let name = lower_camel(method.name());
			if names.contains(&name) {
				return Err(GqlError::DuplicateField {
					owner: QUERY_TYPE_NAME.to_owned(),
					field: name,
				});
			}
			trace!(field = %name, method = method.name(), "adding query field");
			query = query.field(inspector.method_field(&name, method, Some(root.clone()))?);
			names.push(name);
		}

		let mut schema = dynamic::Schema::build(QUERY_TYPE_NAME, None, None).register(query);
		for ty in registry.take_types()? {
			schema = schema.register(ty);
		}
		let inner = schema
			.finish()
			.map_err(|e| schema_error(format!("there was an error generating schema: {e:?}")))?;

		debug!(fields = names.len(), types = registry.len(), "generated schema");
		Ok(Schema {
			inner,
			registry,
		})
	}
}

/// A built schema, ready to execute requests.
#[derive(Clone)]
pub struct Schema {
	inner: dynamic::Schema,
	registry: Arc<Registry>,
}

impl Schema {
	pub async fn execute(&self, request: impl Into<Request>) -> Response {
		self.inner.execute(request.into()).await
	}

	/// Renders the schema definition language of the schema.
	pub fn sdl(&self) -> String {
		self.inner.sdl()
	}

	/// The registry the schema was built from.
	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	pub fn inner(&self) -> &dynamic::Schema {
		&self.inner
	}
}
