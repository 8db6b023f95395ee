use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_graphql::dynamic::FieldValue;
use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};
use serde_json::Number;

use super::codec::{self, Container};
use super::ext::TryIntoExt;
use super::ident::TypeIdentity;
use super::object::{GraphObject, ObjectDescriptor};
use super::registry::CustomScalar;
use super::utils::{GqlValueUtils, key_string};

/// A Rust type which can appear in a generated schema.
///
/// Implementations describe the shape of the type and convert its values to
/// and from the engine's wire values. Structs implement it through
/// [`reflect_object!`](crate::reflect_object), and types which render as text
/// through [`reflect_text!`](crate::reflect_text).
pub trait Reflect: Sized + Send + Sync + 'static {
	fn descriptor() -> TypeDescriptor;

	/// Converts the value into a wire value, naming the fields of nested
	/// objects by their `graph_key` tags. Returns `None` when the value has no
	/// wire representation, such as a non-finite float.
	fn to_value(&self, graph_key: &str) -> Option<GqlValue>;

	/// Parses a wire value. Returns `None` when the value does not convert.
	fn from_value(value: &GqlValue) -> Option<Self>;

	/// Hands a borrowed value to the engine following a resolution plan.
	fn emit<'a>(&'a self, plan: &Plan) -> Option<FieldValue<'a>> {
		plan.emit_value(self)
	}

	/// Hands an owned value to the engine following a resolution plan.
	fn emit_owned(self, plan: &Plan) -> Option<FieldValue<'static>> {
		plan.emit_value(&self)
	}

	/// Recovers a value produced by a custom scalar parser, re-wrapping it in
	/// the optional layers of the declared type.
	fn from_custom(value: Box<dyn Any + Send + Sync>) -> Option<Self> {
		value.downcast::<Self>().ok().map(|v| *v)
	}
}

/// The canonical description of a type.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
	pub identity: TypeIdentity,
	pub kind: Kind,
	/// The number of optional layers which were unwrapped to reach `identity`.
	pub depth: usize,
}

#[derive(Clone, Debug)]
pub enum Kind {
	Boolean,
	Integer,
	Float,
	String,
	Object(ObjectShape),
	List {
		element: Box<TypeDescriptor>,
		/// The length of a fixed-size array.
		len: Option<usize>,
	},
	Map {
		key: Box<TypeDescriptor>,
		value: Box<TypeDescriptor>,
	},
	/// A value which renders itself as text.
	Text,
	/// A value which is passed through as-is.
	Raw,
}

/// Lazily collects the fields and methods of an object type, so that
/// recursive type graphs can be described without recursing.
#[derive(Clone, Copy)]
pub struct ObjectShape {
	collect: fn() -> ObjectDescriptor,
}

impl ObjectShape {
	pub fn describe(&self) -> ObjectDescriptor {
		(self.collect)()
	}
}

impl fmt::Debug for ObjectShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ObjectShape")
	}
}

impl TypeDescriptor {
	pub fn new<T: ?Sized + 'static>(kind: Kind) -> Self {
		Self {
			identity: TypeIdentity::of::<T>(),
			kind,
			depth: 0,
		}
	}

	pub fn object<T: GraphObject>() -> Self {
		Self::new::<T>(Kind::Object(ObjectShape {
			collect: ObjectDescriptor::of::<T>,
		}))
	}

	pub(crate) fn indirect(mut self) -> Self {
		self.depth += 1;
		self
	}

	pub fn is_object(&self) -> bool {
		matches!(self.kind, Kind::Object(_))
	}
}

/// How a value is handed to the engine, decided when its field is classified.
#[derive(Clone, Debug)]
pub enum Plan {
	/// Emit the wire value, keying nested objects by the given tag key.
	Value(Arc<str>),
	/// Emit the value itself for the engine to resolve its fields.
	Object,
	/// Emit each element following the inner plan.
	List(Box<Plan>),
	/// Emit through a registered custom scalar.
	Custom(Arc<CustomScalar>, Arc<str>),
}

impl Plan {
	pub fn emit_value<'a, T: Reflect>(&self, value: &T) -> Option<FieldValue<'a>> {
		// Structural plans only reach here for values classified otherwise
		let value = match self {
			Plan::Value(graph_key) => value.to_value(graph_key),
			Plan::Custom(scalar, graph_key) => scalar.serialize(value, graph_key),
			Plan::Object | Plan::List(_) => None,
		}?;
		Some(FieldValue::value(value))
	}

	pub fn emit_object<'a, T: Reflect>(&self, value: &'a T) -> Option<FieldValue<'a>> {
		match self {
			Plan::Object => Some(FieldValue::borrowed_any(value)),
			_ => self.emit_value(value),
		}
	}

	pub fn emit_object_owned<T: Reflect>(&self, value: T) -> Option<FieldValue<'static>> {
		match self {
			Plan::Object => Some(FieldValue::owned_any(value)),
			_ => self.emit_value(&value),
		}
	}
}

impl Reflect for bool {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::Boolean)
	}

	fn to_value(&self, _: &str) -> Option<GqlValue> {
		Some(GqlValue::Boolean(*self))
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		value.as_bool()
	}
}

macro_rules! reflect_integer {
	($($ty:ty),+) => {
		$(
			impl Reflect for $ty {
				fn descriptor() -> TypeDescriptor {
					TypeDescriptor::new::<Self>(Kind::Integer)
				}

				fn to_value(&self, _: &str) -> Option<GqlValue> {
					Some(GqlValue::Number(Number::from(*self)))
				}

				fn from_value(value: &GqlValue) -> Option<Self> {
					value
						.as_i64()
						.and_then(|n| <$ty>::try_from(n).ok())
						.or_else(|| value.as_u64().and_then(|n| <$ty>::try_from(n).ok()))
				}
			}
		)+
	};
}

reflect_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Reflect for f64 {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::Float)
	}

	fn to_value(&self, _: &str) -> Option<GqlValue> {
		(*self).try_intox().ok()
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		value.as_f64()
	}
}

impl Reflect for f32 {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::Float)
	}

	fn to_value(&self, _: &str) -> Option<GqlValue> {
		(*self).try_intox().ok()
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		value.as_f64().map(|f| f as f32)
	}
}

impl Reflect for String {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::String)
	}

	fn to_value(&self, _: &str) -> Option<GqlValue> {
		Some(GqlValue::String(self.clone()))
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		match value {
			GqlValue::String(s) => Some(s.clone()),
			GqlValue::Enum(e) => Some(e.to_string()),
			_ => None,
		}
	}
}

impl Reflect for serde_json::Value {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::Raw)
	}

	fn to_value(&self, _: &str) -> Option<GqlValue> {
		GqlValue::from_json(self.clone()).ok()
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		value.clone().into_json().ok()
	}
}

impl<T: Reflect> Reflect for Option<T> {
	fn descriptor() -> TypeDescriptor {
		T::descriptor().indirect()
	}

	fn to_value(&self, graph_key: &str) -> Option<GqlValue> {
		match self {
			Some(v) => v.to_value(graph_key),
			None => Some(GqlValue::Null),
		}
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		match value {
			GqlValue::Null => Some(None),
			v => T::from_value(v).map(Some),
		}
	}

	fn emit<'a>(&'a self, plan: &Plan) -> Option<FieldValue<'a>> {
		self.as_ref()?.emit(plan)
	}

	fn emit_owned(self, plan: &Plan) -> Option<FieldValue<'static>> {
		self?.emit_owned(plan)
	}

	fn from_custom(value: Box<dyn Any + Send + Sync>) -> Option<Self> {
		T::from_custom(value).map(Some)
	}
}

impl<T: Reflect> Reflect for Box<T> {
	fn descriptor() -> TypeDescriptor {
		T::descriptor().indirect()
	}

	fn to_value(&self, graph_key: &str) -> Option<GqlValue> {
		(**self).to_value(graph_key)
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		T::from_value(value).map(Box::new)
	}

	fn emit<'a>(&'a self, plan: &Plan) -> Option<FieldValue<'a>> {
		(**self).emit(plan)
	}

	fn emit_owned(self, plan: &Plan) -> Option<FieldValue<'static>> {
		(*self).emit_owned(plan)
	}

	fn from_custom(value: Box<dyn Any + Send + Sync>) -> Option<Self> {
		T::from_custom(value).map(Box::new)
	}
}

impl<T: Reflect> Reflect for Vec<T> {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::List {
			element: Box::new(T::descriptor()),
			len: None,
		})
	}

	fn to_value(&self, graph_key: &str) -> Option<GqlValue> {
		Some(codec::serialize(self, graph_key))
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		Some(codec::parse(value))
	}

	fn emit<'a>(&'a self, plan: &Plan) -> Option<FieldValue<'a>> {
		match plan {
			Plan::List(element) => Some(FieldValue::list(
				self.iter().map(|v| v.emit(element).unwrap_or(FieldValue::NULL)),
			)),
			_ => plan.emit_value(self),
		}
	}

	fn emit_owned(self, plan: &Plan) -> Option<FieldValue<'static>> {
		match plan {
			Plan::List(element) => Some(FieldValue::list(
				self.into_iter().map(|v| v.emit_owned(element).unwrap_or(FieldValue::NULL)),
			)),
			_ => plan.emit_value(&self),
		}
	}
}

impl<T: Reflect> Container for Vec<T> {
	fn empty_literal() -> GqlValue {
		GqlValue::List(Vec::new())
	}

	fn encode(&self, graph_key: &str) -> Option<GqlValue> {
		self.iter().map(|v| v.to_value(graph_key)).collect::<Option<Vec<_>>>().map(GqlValue::List)
	}

	fn decode(value: &GqlValue) -> Self {
		value
			.as_list()
			.map(|items| items.iter().filter_map(T::from_value).collect())
			.unwrap_or_default()
	}
}

impl<T: Reflect + Default, const N: usize> Reflect for [T; N] {
	fn descriptor() -> TypeDescriptor {
		TypeDescriptor::new::<Self>(Kind::List {
			element: Box::new(T::descriptor()),
			len: Some(N),
		})
	}

	fn to_value(&self, graph_key: &str) -> Option<GqlValue> {
		Some(codec::serialize(self, graph_key))
	}

	fn from_value(value: &GqlValue) -> Option<Self> {
		Some(codec::parse(value))
	}

	fn emit<'a>(&'a self, plan: &Plan) -> Option<FieldValue<'a>> {
		match plan {
			Plan::List(element) => Some(FieldValue::list(
				self.iter().map(|v| v.emit(element).unwrap_or(FieldValue::NULL)),
			)),
			_ => plan.emit_value(self),
		}
	}

	fn emit_owned(self, plan: &Plan) -> Option<FieldValue<'static>> {
		match plan {
			Plan::List(element) => Some(FieldValue::list(
				self.into_iter().map(|v| v.emit_owned(element).unwrap_or(FieldValue::NULL)),
			)),
			_ => plan.emit_value(&self),
		}
	}
}

impl<T: Reflect + Default, const N: usize> Container for [T; N] {
	fn empty_literal() -> GqlValue {
		GqlValue::List(Vec::new())
	}

	fn encode(&self, graph_key: &str) -> Option<GqlValue> {
		self.iter().map(|v| v.to_value(graph_key)).collect::<Option<Vec<_>>>().map(GqlValue::List)
	}

	// Elements which fail to convert keep their zero value.
	fn decode(value: &GqlValue) -> Self {
		let mut out: [T; N] = std::array::from_fn(|_| T::default());
		if let Some(items) = value.as_list() {
			for (slot, item) in out.iter_mut().zip(items) {
				if let Some(v) = T::from_value(item) {
					*slot = v;
				}
			}
		}
		out
	}
}

macro_rules! reflect_map {
	($map:ident, $($bound:tt)+) => {
		impl<K, V> Reflect for $map<K, V>
		where
			K: Reflect + $($bound)+,
			V: Reflect,
		{
			fn descriptor() -> TypeDescriptor {
				TypeDescriptor::new::<Self>(Kind::Map {
					key: Box::new(K::descriptor()),
					value: Box::new(V::descriptor()),
				})
			}

			fn to_value(&self, graph_key: &str) -> Option<GqlValue> {
				Some(codec::serialize(self, graph_key))
			}

			fn from_value(value: &GqlValue) -> Option<Self> {
				Some(codec::parse(value))
			}
		}

		impl<K, V> Container for $map<K, V>
		where
			K: Reflect + $($bound)+,
			V: Reflect,
		{
			fn empty_literal() -> GqlValue {
				GqlValue::Object(IndexMap::new())
			}

			fn encode(&self, graph_key: &str) -> Option<GqlValue> {
				let mut out = IndexMap::with_capacity(self.len());
				for (k, v) in self {
					let key = key_string(&k.to_value(graph_key)?)?;
					out.insert(Name::new(key), v.to_value(graph_key)?);
				}
				Some(GqlValue::Object(out))
			}

			fn decode(value: &GqlValue) -> Self {
				let Some(entries) = value.as_object() else {
					return Self::new();
				};
				entries
					.iter()
					.filter_map(|(k, v)| {
						let key = K::from_value(&GqlValue::String(k.to_string()))?;
						Some((key, V::from_value(v)?))
					})
					.collect()
			}
		}
	};
}

reflect_map!(HashMap, Eq + Hash);
reflect_map!(BTreeMap, Ord);
