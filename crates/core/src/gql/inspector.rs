use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{Field, InputValue, Object, Scalar, Type, TypeRef};

use super::convention::{Member, resolve_members};
use super::dispatch::{Call, CallEnv, MethodDef, resolve_field, resolve_method};
use super::error::GqlError;
use super::ext::Named;
use super::object::ObjectDescriptor;
use super::reflect::{Kind, Plan, TypeDescriptor};
use super::registry::{EntryKind, Registry};
use super::validator::Validator;
use crate::cnf::{
	ARRAY_SCALAR_PREFIX, Config, LIST_SCALAR_PREFIX, MAP_SCALAR_PREFIX, RAW_SCALAR_NAME,
	TEXT_SCALAR_NAME,
};

/// The schema type of a value together with how its values are emitted.
#[derive(Debug, Clone)]
pub struct Shape {
	pub type_ref: TypeRef,
	pub plan: Plan,
}

impl Shape {
	fn value(type_ref: TypeRef, graph_key: &Arc<str>) -> Self {
		Self {
			type_ref,
			plan: Plan::Value(graph_key.clone()),
		}
	}
}

/// Maps type descriptors onto schema types, registering every object and
/// scalar type it encounters.
pub struct Inspector<'a> {
	registry: &'a Registry,
	config: &'a Config,
	/// The tag key naming the fields of objects nested in wire values.
	graph_key: Arc<str>,
	validator: Option<&'a Arc<dyn Validator>>,
}

impl<'a> Inspector<'a> {
	pub fn new(
		registry: &'a Registry,
		config: &'a Config,
		validator: Option<&'a Arc<dyn Validator>>,
	) -> Self {
		Self {
			registry,
			config,
			graph_key: Arc::from(config.graph_key_tag.as_str()),
			validator,
		}
	}

	/// Classifies a type in an output position.
	///
	/// A custom scalar registered for the type wins over its derived shape.
	/// Objects, and lists of objects or custom scalars, keep their structure.
	/// Every other list or map collapses into a container scalar.
	pub fn classify(&self, descriptor: &TypeDescriptor) -> Result<Shape, GqlError> {
		if let Some(scalar) = self.registry.custom_scalar(&descriptor.identity) {
			return Ok(Shape {
				type_ref: TypeRef::named(scalar.name()),
				plan: Plan::Custom(scalar, self.graph_key.clone()),
			});
		}
		match &descriptor.kind {
			Kind::Object(shape) => {
				let identity = descriptor.identity;
				let name = identity.canonical_name();
				self.registry.get_or_create(&name, Some(identity), EntryKind::Object, || {
					self.build_object(&name, shape.describe())
				})?;
				Ok(Shape {
					type_ref: TypeRef::named(name),
					plan: Plan::Object,
				})
			}
			Kind::List {
				element,
				..
			} if self.keeps_structure(element) => {
				let inner = self.classify(element)?;
				Ok(Shape {
					type_ref: TypeRef::List(Box::new(inner.type_ref)),
					plan: Plan::List(Box::new(inner.plan)),
				})
			}
			_ => self.classify_value(descriptor),
		}
	}

	/// Classifies a type in an argument position. Objects are not valid input
	/// types, so they and any list of them are taken as raw values.
	pub fn classify_input(&self, descriptor: &TypeDescriptor) -> Result<TypeRef, GqlError> {
		if let Some(scalar) = self.registry.custom_scalar(&descriptor.identity) {
			return Ok(TypeRef::named(scalar.name()));
		}
		let degrade = match &descriptor.kind {
			Kind::Object(_) => true,
			Kind::List {
				element,
				..
			} => element.is_object(),
			_ => false,
		};
		if degrade {
			return self.shared_scalar(RAW_SCALAR_NAME, RAW_DESCRIPTION);
		}
		Ok(self.classify_value(descriptor)?.type_ref)
	}

	fn keeps_structure(&self, element: &TypeDescriptor) -> bool {
		element.is_object() || self.registry.custom_scalar(&element.identity).is_some()
	}

	fn classify_value(&self, descriptor: &TypeDescriptor) -> Result<Shape, GqlError> {
		let type_ref = match &descriptor.kind {
			Kind::Boolean => TypeRef::named(TypeRef::BOOLEAN),
			Kind::Integer => TypeRef::named(TypeRef::INT),
			Kind::Float => TypeRef::named(TypeRef::FLOAT),
			Kind::String => TypeRef::named(TypeRef::STRING),
			Kind::Text => self.shared_scalar(TEXT_SCALAR_NAME, TEXT_DESCRIPTION)?,
			Kind::Raw | Kind::Object(_) => self.shared_scalar(RAW_SCALAR_NAME, RAW_DESCRIPTION)?,
			Kind::List {
				..
			}
			| Kind::Map {
				..
			} => self.container(descriptor)?,
		};
		Ok(Shape::value(type_ref, &self.graph_key))
	}

	fn shared_scalar(&self, name: &'static str, description: &'static str) -> Result<TypeRef, GqlError> {
		self.registry.get_or_create(name, None, EntryKind::Scalar, || {
			Ok(Scalar::new(name).description(description).into())
		})?;
		Ok(TypeRef::named(name))
	}

	fn container(&self, descriptor: &TypeDescriptor) -> Result<TypeRef, GqlError> {
		let (name, description) = match &descriptor.kind {
			Kind::List {
				element,
				len: None,
			} => {
				let element = element.identity.short_name();
				(
					format!("{LIST_SCALAR_PREFIX}{element}"),
					format!("A list of `{element}` values, encoded as a JSON array"),
				)
			}
			Kind::List {
				element,
				len: Some(_),
			} => {
				let element = element.identity.short_name();
				(
					format!("{ARRAY_SCALAR_PREFIX}{element}"),
					format!("A fixed-size array of `{element}` values, encoded as a JSON array"),
				)
			}
			Kind::Map {
				key,
				value,
			} => {
				let key = key.identity.short_name();
				let value = value.identity.short_name();
				(
					format!("{MAP_SCALAR_PREFIX}{key}_{value}"),
					format!("A map from `{key}` to `{value}`, encoded as a JSON object"),
				)
			}
			_ => return Ok(TypeRef::named(RAW_SCALAR_NAME)),
		};
		self.registry.get_or_create(&name, None, EntryKind::Container, || {
			Ok(Scalar::new(name.as_str()).description(description).into())
		})?;
		Ok(TypeRef::named(name))
	}

	fn build_object(&self, name: &str, object: ObjectDescriptor) -> Result<Type, GqlError> {
		let members = resolve_members(name, object.fields(), object.methods(), self.config)?;
		let mut ty = Object::new(name);
		for member in members {
			let field = match member {
				Member::Field {
					name: field_name,
					field,
				} => {
					let shape = self.classify(field.descriptor())?;
					trace!(object = name, field = %field_name, "adding field");
					resolve_field(&field_name, shape.type_ref, field.resolve.clone(), shape.plan)
				}
				Member::Override {
					name: field_name,
					method,
					..
				}
				| Member::Synthetic {
					name: field_name,
					method,
				} => {
					trace!(object = name, field = %field_name, method = method.name(), "adding resolver field");
					self.method_field(&field_name, method, None)?
				}
			};
			ty = ty.field(field);
		}
		Ok(ty.into())
	}

	/// Builds the field which invokes `method`, with one argument per query
	/// field of its argument struct.
	pub(crate) fn method_field(
		&self,
		name: &str,
		method: &MethodDef,
		captured: Option<Arc<dyn Any + Send + Sync>>,
	) -> Result<Field, GqlError> {
		let shape = self.classify(method.output())?;
		let arguments = method.arguments.map(|describe| {
			let mut arguments = describe(self.config);
			arguments.resolve_scalars(self.registry);
			arguments
		});

		let mut inputs = Vec::new();
		if let Some(arguments) = &arguments {
			let mut seen = HashSet::new();
			for argument in arguments.query_fields() {
				if !seen.insert(argument.key.as_str()) {
					return Err(GqlError::DuplicateField {
						owner: arguments.type_name().to_owned(),
						field: argument.key.clone(),
					});
				}
				let type_ref = self.classify_input(&argument.descriptor)?;
				inputs.push(InputValue::new(argument.key.as_str(), type_ref));
			}
		}

		let env = CallEnv {
			plan: shape.plan,
			arguments,
			validator: self.validator.cloned(),
		};
		let mut field = resolve_method(name, shape.type_ref, Call::new(method, env, captured));
		for input in inputs {
			field = field.argument(input);
		}
		Ok(field)
	}
}

const RAW_DESCRIPTION: &str = "A value passed through without interpretation";

const TEXT_DESCRIPTION: &str = "A value rendered through its text representation";
