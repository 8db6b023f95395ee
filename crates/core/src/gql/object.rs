use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};

use super::dispatch::{FieldGetter, Method, MethodDef, field_getter};
use super::error::internal_error;
use super::ext::Named;
use super::ident::TypeIdentity;
use super::reflect::{Reflect, TypeDescriptor};
use super::tag::Tag;

/// A struct exposed as an object type.
///
/// `define` declares the struct's fields, each with its exported name, its
/// tag and an accessor, plus any prefixed resolver methods. Fields without a
/// schema key in their tag are never exposed.
///
/// ```ignore
/// impl GraphObject for Product {
/// 	fn define(def: &mut ObjectDef<Self>) {
/// 		def.field("Name", r#"gql:"name""#, |p| &p.name)
/// 			.field("Price", r#"gql:"price""#, |p| &p.price)
/// 			.method("GGL_Price", Product::price);
/// 	}
/// }
/// reflect_object!(Product);
/// ```
pub trait GraphObject: Sized + Send + Sync + 'static {
	fn define(def: &mut ObjectDef<Self>);
}

pub struct ObjectDef<T> {
	fields: Vec<StructField>,
	methods: Vec<MethodDef>,
	_marker: PhantomData<fn(&T)>,
}

impl<T: GraphObject> ObjectDef<T> {
	fn new() -> Self {
		Self {
			fields: Vec::new(),
			methods: Vec::new(),
			_marker: PhantomData,
		}
	}

	pub fn field<F: Reflect>(&mut self, name: &str, tag: &str, get: fn(&T) -> &F) -> &mut Self {
		self.fields.push(StructField {
			name: name.to_owned(),
			tag: Tag::parse(tag),
			descriptor: F::descriptor(),
			resolve: field_getter(move |parent, plan| {
				let this = parent.downcast_ref::<T>().ok_or_else(|| {
					internal_error(format!("failed to downcast parent value to `{}`", type_name::<T>()))
				})?;
				Ok(get(this).emit(plan))
			}),
			read: Arc::new(move |value: &(dyn Any + Send + Sync), graph_key: &str| {
				value.downcast_ref::<T>().and_then(|this| get(this).to_value(graph_key))
			}),
		});
		self
	}

	pub fn method<M, Marker>(&mut self, name: &str, method: M) -> &mut Self
	where
		M: Method<T, Marker>,
		Marker: 'static,
	{
		self.methods.push(MethodDef::new::<T, M, Marker>(name, method));
		self
	}
}

type FieldReader = Arc<dyn Fn(&(dyn Any + Send + Sync), &str) -> Option<GqlValue> + Send + Sync>;

/// A declared struct field.
pub struct StructField {
	pub(crate) name: String,
	pub(crate) tag: Tag,
	pub(crate) descriptor: TypeDescriptor,
	pub(crate) resolve: FieldGetter,
	read: FieldReader,
}

impl StructField {
	pub fn tag(&self) -> &Tag {
		&self.tag
	}

	pub fn descriptor(&self) -> &TypeDescriptor {
		&self.descriptor
	}
}

impl Named for StructField {
	fn name(&self) -> &str {
		&self.name
	}
}

/// Everything an object type declares about itself.
pub struct ObjectDescriptor {
	pub(crate) identity: TypeIdentity,
	pub(crate) fields: Vec<StructField>,
	pub(crate) methods: Vec<MethodDef>,
}

impl ObjectDescriptor {
	pub fn of<T: GraphObject>() -> Self {
		let mut def = ObjectDef::<T>::new();
		T::define(&mut def);
		Self {
			identity: TypeIdentity::of::<T>(),
			fields: def.fields,
			methods: def.methods,
		}
	}

	pub fn identity(&self) -> TypeIdentity {
		self.identity
	}

	pub fn fields(&self) -> &[StructField] {
		&self.fields
	}

	pub fn methods(&self) -> &[MethodDef] {
		&self.methods
	}
}

/// Converts an object into a wire value holding the fields tagged with
/// `graph_key`, keyed by their schema keys. Used where an object travels
/// inside a container scalar.
pub fn object_to_value<T: GraphObject>(value: &T, graph_key: &str) -> Option<GqlValue> {
	let object = ObjectDescriptor::of::<T>();
	let mut out = IndexMap::with_capacity(object.fields.len());
	for field in &object.fields {
		let Some(key) = field.tag.name(graph_key) else {
			continue;
		};
		out.insert(Name::new(key), (field.read)(value, graph_key)?);
	}
	Some(GqlValue::Object(out))
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::*;

	struct Point {
		x: i32,
		y: Option<i32>,
		label: String,
	}

	impl GraphObject for Point {
		fn define(def: &mut ObjectDef<Self>) {
			def.field("X", r#"gql:"x""#, |p| &p.x)
				.field("Y", r#"gql:"y""#, |p| &p.y)
				.field("Label", r#"json:"label""#, |p| &p.label);
		}
	}

	reflect_object!(Point);

	#[test]
	fn objects_convert_to_tagged_values() {
		let point = Point {
			x: 1,
			y: None,
			label: "origin".to_owned(),
		};
		let value = point.to_value("gql").unwrap().into_json().unwrap();
		assert_eq!(value, serde_json::json!({"x": 1, "y": null}));
		assert!(Point::from_value(&GqlValue::Null).is_none());
	}

	#[test]
	fn nested_objects_follow_the_configured_tag() {
		let points: BTreeMap<String, Point> = [(
			"a".to_owned(),
			Point {
				x: 2,
				y: Some(3),
				label: "corner".to_owned(),
			},
		)]
		.into();
		let value = points.to_value("json").unwrap().into_json().unwrap();
		assert_eq!(value, serde_json::json!({"a": {"label": "corner"}}));
		let value = points.to_value("gql").unwrap().into_json().unwrap();
		assert_eq!(value, serde_json::json!({"a": {"x": 2, "y": 3}}));
	}

	#[test]
	fn descriptor_lists_every_declared_field() {
		let object = ObjectDescriptor::of::<Point>();
		assert_eq!(object.fields().len(), 3);
		assert!(object.methods().is_empty());
		assert_eq!(object.identity(), TypeIdentity::of::<Point>());
		assert!(Point::descriptor().is_object());
	}
}
