use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::{Name, Value as GqlValue};

use super::reflect::{Reflect, TypeDescriptor};
use super::registry::{CustomScalar, Registry};
use super::tag::Tag;
use crate::cnf::Config;

/// The query arguments of a single field invocation, as parsed by the engine.
pub type QueryArgs = IndexMap<Name, GqlValue>;

/// An argument struct accepted by a resolver method.
///
/// Fields tagged with the root key are filled from the request's
/// [`RootData`]. Fields tagged with the schema key become query arguments.
/// Untagged fields keep their [`Default`] value.
pub trait Arguments: Default + Send + Sync + 'static {
	fn define(def: &mut ArgumentsDef<Self>);
}

impl Arguments for () {
	fn define(_: &mut ArgumentsDef<Self>) {}
}

/// A value offered to an argument field.
pub(crate) enum Source<'v> {
	/// A wire value from the query or the root data.
	Wire(&'v GqlValue),
	/// A fresh copy of a host value from the root data.
	Typed(Box<dyn Any + Send + Sync>),
}

type Setter = Arc<
	dyn for<'v> Fn(&mut (dyn Any + Send + Sync), Source<'v>, Option<&CustomScalar>) -> bool
		+ Send
		+ Sync,
>;

fn setter<F>(f: F) -> Setter
where
	F: for<'v> Fn(&mut (dyn Any + Send + Sync), Source<'v>, Option<&CustomScalar>) -> bool
		+ Send
		+ Sync
		+ 'static,
{
	Arc::new(f)
}

struct DeclaredArgument {
	name: String,
	tag: Tag,
	descriptor: TypeDescriptor,
	set: Setter,
}

pub struct ArgumentsDef<A> {
	fields: Vec<DeclaredArgument>,
	_marker: PhantomData<fn(&mut A)>,
}

impl<A: Arguments> ArgumentsDef<A> {
	pub fn field<F: Reflect>(&mut self, name: &str, tag: &str, get: fn(&mut A) -> &mut F) -> &mut Self {
		let set = setter(move |target, value, custom| {
			let Some(target) = target.downcast_mut::<A>() else {
				return false;
			};
			let parsed = match (value, custom) {
				(Source::Typed(value), _) => F::from_custom(value),
				(Source::Wire(value), Some(scalar)) => scalar.parse(value).and_then(F::from_custom),
				(Source::Wire(value), None) => F::from_value(value),
			};
			match parsed {
				Some(v) => {
					*get(target) = v;
					true
				}
				None => false,
			}
		});
		self.fields.push(DeclaredArgument {
			name: name.to_owned(),
			tag: Tag::parse(tag),
			descriptor: F::descriptor(),
			set,
		});
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
	/// Looked up in the request's root data.
	Root,
	/// Looked up in the field's query arguments.
	Query,
}

pub struct ArgumentField {
	pub name: String,
	pub source: ArgumentSource,
	pub key: String,
	pub descriptor: TypeDescriptor,
	pub(crate) custom: Option<Arc<CustomScalar>>,
	set: Setter,
}

/// The classified fields of an argument struct.
pub struct ArgumentsDescriptor {
	type_name: &'static str,
	alloc: fn() -> Box<dyn Any + Send + Sync>,
	fields: Vec<ArgumentField>,
}

fn alloc<A: Arguments>() -> Box<dyn Any + Send + Sync> {
	Box::new(A::default())
}

impl ArgumentsDescriptor {
	/// Classifies the fields of `A`. The root key wins over the schema key
	/// when a field carries both.
	pub fn of<A: Arguments>(config: &Config) -> Self {
		let mut def = ArgumentsDef::<A> {
			fields: Vec::new(),
			_marker: PhantomData,
		};
		A::define(&mut def);
		let fields = def
			.fields
			.into_iter()
			.filter_map(|field| {
				let (source, key) = if let Some(key) = field.tag.name(&config.root_key_tag) {
					(ArgumentSource::Root, key.to_owned())
				} else if let Some(key) = field.tag.name(&config.graph_key_tag) {
					(ArgumentSource::Query, key.to_owned())
				} else {
					trace!(arguments = type_name::<A>(), field = %field.name, "argument field is untagged");
					return None;
				};
				Some(ArgumentField {
					name: field.name,
					source,
					key,
					descriptor: field.descriptor,
					custom: None,
					set: field.set,
				})
			})
			.collect();
		Self {
			type_name: type_name::<A>(),
			alloc: alloc::<A>,
			fields,
		}
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn fields(&self) -> &[ArgumentField] {
		&self.fields
	}

	pub fn query_fields(&self) -> impl Iterator<Item = &ArgumentField> {
		self.fields.iter().filter(|f| f.source == ArgumentSource::Query)
	}

	/// Attaches the custom scalars registered for the field types.
	pub(crate) fn resolve_scalars(&mut self, registry: &Registry) {
		for field in &mut self.fields {
			field.custom = registry.custom_scalar(&field.descriptor.identity);
		}
	}

	/// Allocates a zero-valued argument struct.
	pub fn allocate(&self) -> Box<dyn Any + Send + Sync> {
		(self.alloc)()
	}

	pub fn apply_root(&self, target: &mut (dyn Any + Send + Sync), root: &RootData) {
		self.assign(target, ArgumentSource::Root, |key| root.source(key));
	}

	pub fn apply_query(&self, target: &mut (dyn Any + Send + Sync), query: &QueryArgs) {
		self.assign(target, ArgumentSource::Query, |key| query.get(key).map(Source::Wire));
	}

	/// Allocates and populates an argument struct, root data first.
	pub fn bind(&self, root: Option<&RootData>, query: &QueryArgs) -> Box<dyn Any + Send + Sync> {
		let mut target = self.allocate();
		if let Some(root) = root {
			self.apply_root(target.as_mut(), root);
		}
		self.apply_query(target.as_mut(), query);
		target
	}

	fn assign<'v>(
		&self,
		target: &mut (dyn Any + Send + Sync),
		source: ArgumentSource,
		lookup: impl Fn(&str) -> Option<Source<'v>>,
	) {
		for field in self.fields.iter().filter(|f| f.source == source) {
			let Some(value) = lookup(&field.key) else {
				continue;
			};
			if matches!(value, Source::Wire(GqlValue::Null)) {
				continue;
			}
			if !(field.set)(target, value, field.custom.as_deref()) {
				warn!(
					arguments = self.type_name,
					argument = %field.key,
					"argument value does not convert, keeping the zero value"
				);
			}
		}
	}
}

type MakeTyped = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

#[derive(Clone)]
enum RootEntry {
	Wire(GqlValue),
	Typed {
		type_name: &'static str,
		make: MakeTyped,
	},
}

impl fmt::Debug for RootEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RootEntry::Wire(value) => fmt::Debug::fmt(value, f),
			RootEntry::Typed {
				type_name,
				..
			} => write!(f, "<{type_name}>"),
		}
	}
}

/// The root-context mapping supplied once per request.
///
/// Entries are either wire values, which convert like query arguments, or
/// typed host values, which fill argument fields of the same type (through
/// any `Option` or `Box` layers) with a fresh clone per invocation.
#[derive(Debug, Clone, Default)]
pub struct RootData(BTreeMap<String, RootEntry>);

impl RootData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds root data from a JSON object. Other JSON values give no entries.
	pub fn from_json(value: serde_json::Value) -> Self {
		let serde_json::Value::Object(entries) = value else {
			warn!("root data is not a JSON object, ignoring it");
			return Self::default();
		};
		Self(
			entries
				.into_iter()
				.filter_map(|(k, v)| GqlValue::from_json(v).ok().map(|v| (k, RootEntry::Wire(v))))
				.collect(),
		)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: GqlValue) -> &mut Self {
		self.0.insert(key.into(), RootEntry::Wire(value));
		self
	}

	pub fn with(mut self, key: impl Into<String>, value: GqlValue) -> Self {
		self.insert(key, value);
		self
	}

	/// Inserts a host value, such as an authenticated user or a connection
	/// handle, under `key`.
	pub fn insert_typed<T>(&mut self, key: impl Into<String>, value: T) -> &mut Self
	where
		T: Clone + Send + Sync + 'static,
	{
		let make: MakeTyped = Arc::new(move || Box::new(value.clone()) as Box<dyn Any + Send + Sync>);
		self.0.insert(key.into(), RootEntry::Typed {
			type_name: type_name::<T>(),
			make,
		});
		self
	}

	pub fn with_typed<T>(mut self, key: impl Into<String>, value: T) -> Self
	where
		T: Clone + Send + Sync + 'static,
	{
		self.insert_typed(key, value);
		self
	}

	/// Returns the wire value under `key`. Typed entries have none.
	pub fn get(&self, key: &str) -> Option<&GqlValue> {
		match self.0.get(key)? {
			RootEntry::Wire(value) => Some(value),
			RootEntry::Typed {
				..
			} => None,
		}
	}

	fn source(&self, key: &str) -> Option<Source<'_>> {
		Some(match self.0.get(key)? {
			RootEntry::Wire(value) => Source::Wire(value),
			RootEntry::Typed {
				make,
				..
			} => Source::Typed(make()),
		})
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Number;

	use super::*;

	#[derive(Debug, Default, PartialEq)]
	struct Lookup {
		flag: bool,
		id: i64,
		both: String,
		untagged: Option<i32>,
	}

	impl Arguments for Lookup {
		fn define(def: &mut ArgumentsDef<Self>) {
			def.field("Flag", r#"root:"flag""#, |a| &mut a.flag)
				.field("ID", r#"gql:"id""#, |a| &mut a.id)
				.field("Both", r#"gql:"both" root:"session""#, |a| &mut a.both)
				.field("Untagged", "", |a| &mut a.untagged);
		}
	}

	fn query() -> QueryArgs {
		let mut query = QueryArgs::new();
		query.insert(Name::new("id"), GqlValue::Number(Number::from(5)));
		query.insert(Name::new("both"), GqlValue::String("from query".to_owned()));
		query.insert(Name::new("flag"), GqlValue::Boolean(false));
		query
	}

	fn root() -> RootData {
		RootData::from_json(serde_json::json!({"flag": true, "session": "from root", "id": 9}))
	}

	#[test]
	fn fields_are_classified_by_tag() {
		let descriptor = ArgumentsDescriptor::of::<Lookup>(&Config::default());
		let classified: Vec<_> =
			descriptor.fields().iter().map(|f| (f.name.as_str(), f.source, f.key.as_str())).collect();
		assert_eq!(
			classified,
			vec![
				("Flag", ArgumentSource::Root, "flag"),
				("ID", ArgumentSource::Query, "id"),
				("Both", ArgumentSource::Root, "session"),
			]
		);
		assert_eq!(descriptor.query_fields().count(), 1);
	}

	#[test]
	fn binding_order_does_not_matter() {
		let descriptor = ArgumentsDescriptor::of::<Lookup>(&Config::default());
		let expected = Lookup {
			flag: true,
			id: 5,
			both: "from root".to_owned(),
			untagged: None,
		};

		let mut root_first = descriptor.allocate();
		descriptor.apply_root(root_first.as_mut(), &root());
		descriptor.apply_query(root_first.as_mut(), &query());

		let mut query_first = descriptor.allocate();
		descriptor.apply_query(query_first.as_mut(), &query());
		descriptor.apply_root(query_first.as_mut(), &root());

		assert_eq!(root_first.downcast_ref::<Lookup>(), Some(&expected));
		assert_eq!(query_first.downcast_ref::<Lookup>(), Some(&expected));

		let bound = descriptor.bind(Some(&root()), &query());
		assert_eq!(bound.downcast_ref::<Lookup>(), Some(&expected));
	}

	#[test]
	fn unconvertible_values_keep_the_zero_value() {
		let descriptor = ArgumentsDescriptor::of::<Lookup>(&Config::default());
		let mut query = QueryArgs::new();
		query.insert(Name::new("id"), GqlValue::String("five".to_owned()));
		let bound = descriptor.bind(None, &query);
		assert_eq!(bound.downcast_ref::<Lookup>(), Some(&Lookup::default()));

		let mut query = QueryArgs::new();
		query.insert(Name::new("id"), GqlValue::Null);
		let bound = descriptor.bind(None, &query);
		assert_eq!(bound.downcast_ref::<Lookup>(), Some(&Lookup::default()));
	}

	#[derive(Debug, Clone, PartialEq)]
	struct Account {
		id: i64,
	}

	impl crate::gql::GraphObject for Account {
		fn define(def: &mut crate::gql::ObjectDef<Self>) {
			def.field("ID", r#"gql:"id""#, |a| &a.id);
		}
	}

	reflect_object!(Account);

	#[derive(Debug, Default, PartialEq)]
	struct Session {
		account: Option<Account>,
		owner: Option<Box<Account>>,
		tenant: String,
	}

	impl Arguments for Session {
		fn define(def: &mut ArgumentsDef<Self>) {
			def.field("Account", r#"root:"account""#, |a| &mut a.account)
				.field("Owner", r#"root:"account""#, |a| &mut a.owner)
				.field("Tenant", r#"root:"tenant""#, |a| &mut a.tenant);
		}
	}

	#[test]
	fn typed_root_values_fill_matching_fields() {
		let descriptor = ArgumentsDescriptor::of::<Session>(&Config::default());
		let account = Account {
			id: 3,
		};
		let root = RootData::new()
			.with_typed("account", account.clone())
			.with("tenant", GqlValue::String("acme".to_owned()));
		let bound = descriptor.bind(Some(&root), &QueryArgs::new());
		assert_eq!(
			bound.downcast_ref::<Session>(),
			Some(&Session {
				account: Some(account.clone()),
				owner: Some(Box::new(account)),
				tenant: "acme".to_owned(),
			})
		);
		assert!(root.get("account").is_none());

		// A host value of another type keeps the zero value
		let root = RootData::new().with_typed("account", 3i64).with_typed("tenant", 7u8);
		let bound = descriptor.bind(Some(&root), &QueryArgs::new());
		assert_eq!(bound.downcast_ref::<Session>(), Some(&Session::default()));
	}

	#[test]
	fn custom_tag_keys() {
		let config = Config {
			graph_key_tag: "graph".to_owned(),
			root_key_tag: "ctx".to_owned(),
			..Config::default()
		};
		let descriptor = ArgumentsDescriptor::of::<Lookup>(&config);
		assert!(descriptor.fields().is_empty());
	}
}
