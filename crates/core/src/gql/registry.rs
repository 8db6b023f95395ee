use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::Value as GqlValue;
use async_graphql::dynamic::{Scalar, Type};
use parking_lot::{Mutex, RwLock};

use super::error::{GqlError, internal_error};
use super::ident::TypeIdentity;
use super::reflect::Reflect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	Object,
	/// A generic container scalar shared by every container of one shape.
	Container,
	Scalar,
}

enum EntryState {
	/// Reserved while its definition is being built.
	Pending,
	Ready(Type),
	/// Handed to the engine.
	Registered,
}

/// A memoized schema type.
pub struct Entry {
	name: String,
	identity: Option<TypeIdentity>,
	kind: EntryKind,
	state: Mutex<EntryState>,
}

impl Entry {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn identity(&self) -> Option<TypeIdentity> {
		self.identity
	}

	#[cfg(test)]
	pub(crate) fn is_pending(&self) -> bool {
		matches!(*self.state.lock(), EntryState::Pending)
	}

	fn describe(&self) -> String {
		match self.identity {
			Some(identity) => identity.name().to_owned(),
			None => format!("the shared `{}` scalar", self.name),
		}
	}

	fn check(&self, identity: Option<TypeIdentity>) -> Result<(), GqlError> {
		if self.identity.map(|i| i.id()) == identity.map(|i| i.id()) {
			return Ok(());
		}
		let other = match identity {
			Some(identity) => identity.name().to_owned(),
			None => format!("the shared `{}` scalar", self.name),
		};
		Err(GqlError::TypeCollision {
			name: self.name.clone(),
			first: self.describe(),
			second: other,
		})
	}
}

impl fmt::Debug for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Entry")
			.field("name", &self.name)
			.field("identity", &self.identity)
			.field("kind", &self.kind)
			.finish()
	}
}

type Serializer = Arc<dyn Fn(&(dyn Any + Send + Sync), &str) -> Option<GqlValue> + Send + Sync>;
type Parser = Arc<dyn Fn(&GqlValue) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// A caller-registered scalar which replaces the derived schema type of one
/// Rust type, structs included.
pub struct CustomScalar {
	name: String,
	identity: TypeIdentity,
	serializer: Serializer,
	parser: Parser,
}

impl CustomScalar {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn identity(&self) -> TypeIdentity {
		self.identity
	}

	/// Serializes a value of the scalar's type. Without a caller-supplied
	/// serializer, nested objects are keyed by their `graph_key` tags.
	pub fn serialize(&self, value: &(dyn Any + Send + Sync), graph_key: &str) -> Option<GqlValue> {
		(self.serializer)(value, graph_key)
	}

	pub fn parse(&self, value: &GqlValue) -> Option<Box<dyn Any + Send + Sync>> {
		(self.parser)(value)
	}
}

impl fmt::Debug for CustomScalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomScalar")
			.field("name", &self.name)
			.field("identity", &self.identity)
			.finish()
	}
}

/// The definition of a custom scalar for values of type `T`.
///
/// Serialization and parsing default to the [`Reflect`] conversions of `T`.
pub struct ScalarDef<T> {
	name: String,
	description: Option<String>,
	specified_by_url: Option<String>,
	serialize: Option<Arc<dyn Fn(&T) -> Option<GqlValue> + Send + Sync>>,
	parse: Option<Arc<dyn Fn(&GqlValue) -> Option<T> + Send + Sync>>,
	_marker: PhantomData<fn(T)>,
}

impl<T: Reflect> ScalarDef<T> {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			specified_by_url: None,
			serialize: None,
			parse: None,
			_marker: PhantomData,
		}
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
		self.specified_by_url = Some(url.into());
		self
	}

	pub fn serialize(mut self, f: impl Fn(&T) -> Option<GqlValue> + Send + Sync + 'static) -> Self {
		self.serialize = Some(Arc::new(f));
		self
	}

	pub fn parse(mut self, f: impl Fn(&GqlValue) -> Option<T> + Send + Sync + 'static) -> Self {
		self.parse = Some(Arc::new(f));
		self
	}

	pub(crate) fn into_parts(self) -> (Scalar, CustomScalar) {
		let mut scalar = Scalar::new(self.name.as_str());
		if let Some(description) = self.description {
			scalar = scalar.description(description);
		}
		if let Some(url) = self.specified_by_url {
			scalar = scalar.specified_by_url(url);
		}
		let serialize = self.serialize;
		let parse = self.parse;
		let custom = CustomScalar {
			name: self.name,
			identity: TypeIdentity::of::<T>(),
			serializer: Arc::new(move |value: &(dyn Any + Send + Sync), graph_key: &str| {
				let value = value.downcast_ref::<T>()?;
				match &serialize {
					Some(f) => f(value),
					None => value.to_value(graph_key),
				}
			}),
			parser: Arc::new(move |value: &GqlValue| {
				let parsed = match &parse {
					Some(f) => f(value),
					None => T::from_value(value),
				}?;
				Some(Box::new(parsed) as Box<dyn Any + Send + Sync>)
			}),
		};
		(scalar, custom)
	}
}

/// The schema types of one build, one entry per canonical name.
#[derive(Default)]
pub struct Registry {
	entries: RwLock<BTreeMap<String, Arc<Entry>>>,
	scalars: RwLock<HashMap<std::any::TypeId, Arc<CustomScalar>>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry stored under `name`, building it on first use.
	///
	/// The entry is reserved before `build` runs, so a recursive request for
	/// the same name observes the pending entry instead of building again, and
	/// concurrent callers all receive the one reserved entry. A failed build
	/// releases the reservation.
	pub fn get_or_create<F>(
		&self,
		name: &str,
		identity: Option<TypeIdentity>,
		kind: EntryKind,
		build: F,
	) -> Result<Arc<Entry>, GqlError>
	where
		F: FnOnce() -> Result<Type, GqlError>,
	{
		{
			let guard = self.entries.read();
			if let Some(entry) = guard.get(name) {
				entry.check(identity)?;
				return Ok(entry.clone());
			}
		}

		let entry = {
			let mut guard = self.entries.write();
			// The name may have been reserved since the read lock was released
			if let Some(entry) = guard.get(name) {
				entry.check(identity)?;
				return Ok(entry.clone());
			}
			let entry = Arc::new(Entry {
				name: name.to_owned(),
				identity,
				kind,
				state: Mutex::new(EntryState::Pending),
			});
			guard.insert(name.to_owned(), entry.clone());
			entry
		};

		trace!(name, ?kind, "building schema type");
		match build() {
			Ok(ty) => {
				*entry.state.lock() = EntryState::Ready(ty);
				Ok(entry)
			}
			Err(e) => {
				self.entries.write().remove(name);
				Err(e)
			}
		}
	}

	pub fn get(&self, name: &str) -> Option<Arc<Entry>> {
		self.entries.read().get(name).cloned()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.read().len()
	}

	fn names(&self) -> Vec<String> {
		self.entries.read().keys().cloned().collect()
	}

	/// Registers a custom scalar for its type identity. A type takes at most
	/// one custom scalar.
	pub fn register_scalar(&self, scalar: Scalar, custom: CustomScalar) -> Result<(), GqlError> {
		let identity = custom.identity;
		let name = custom.name.clone();
		let mut scalars = self.scalars.write();
		if let Some(existing) = scalars.get(&identity.id()) {
			return Err(GqlError::DuplicateScalar {
				ty: identity.name().to_owned(),
				first: existing.name.clone(),
				second: name,
			});
		}
		self.get_or_create(&name, Some(identity), EntryKind::Scalar, || Ok(scalar.into()))?;
		trace!(name = %name, ty = identity.name(), "registered custom scalar");
		scalars.insert(identity.id(), Arc::new(custom));
		Ok(())
	}

	pub fn custom_scalar(&self, identity: &TypeIdentity) -> Option<Arc<CustomScalar>> {
		self.scalars.read().get(&identity.id()).cloned()
	}

	/// Takes every built definition for registration with the engine.
	pub(crate) fn take_types(&self) -> Result<Vec<Type>, GqlError> {
		let guard = self.entries.read();
		let mut types = Vec::with_capacity(guard.len());
		for entry in guard.values() {
			let mut state = entry.state.lock();
			match std::mem::replace(&mut *state, EntryState::Registered) {
				EntryState::Ready(ty) => types.push(ty),
				EntryState::Pending => {
					*state = EntryState::Pending;
					return Err(internal_error(format!(
						"schema type `{}` was never finished",
						entry.name
					)));
				}
				EntryState::Registered => {
					return Err(internal_error(format!(
						"schema type `{}` was already registered",
						entry.name
					)));
				}
			}
		}
		Ok(types)
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry").field("entries", &self.names()).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Barrier;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use async_graphql::dynamic::{Field, FieldFuture, Object, TypeRef};

	use super::*;
	use crate::gql::ident::canonical_name;

	fn object(name: &str) -> Result<Type, GqlError> {
		Ok(Object::new(name)
			.field(Field::new("id", TypeRef::named(TypeRef::INT), |_| FieldFuture::from_value(None)))
			.into())
	}

	#[allow(non_camel_case_types, dead_code)]
	mod a {
		pub struct b_C;
	}

	#[allow(dead_code)]
	mod a_b {
		pub struct C;
	}

	#[test]
	fn same_identity_returns_the_same_entry() {
		let registry = Registry::new();
		let identity = TypeIdentity::of::<a_b::C>();
		let name = identity.canonical_name();
		let builds = AtomicUsize::new(0);
		let build = || {
			builds.fetch_add(1, Ordering::SeqCst);
			object(&name)
		};
		let first = registry.get_or_create(&name, Some(identity), EntryKind::Object, build).unwrap();
		let second = registry.get_or_create(&name, Some(identity), EntryKind::Object, build).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(builds.load(Ordering::SeqCst), 1);
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn concurrent_first_access_builds_once() {
		const THREADS: usize = 8;
		let registry = Registry::new();
		let identity = TypeIdentity::of::<a_b::C>();
		let name = identity.canonical_name();
		let builds = AtomicUsize::new(0);
		let barrier = Barrier::new(THREADS);
		let entries: Vec<Arc<Entry>> = std::thread::scope(|s| {
			let handles: Vec<_> = (0..THREADS)
				.map(|_| {
					s.spawn(|| {
						barrier.wait();
						registry
							.get_or_create(&name, Some(identity), EntryKind::Object, || {
								builds.fetch_add(1, Ordering::SeqCst);
								object(&name)
							})
							.unwrap()
					})
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});
		assert_eq!(builds.load(Ordering::SeqCst), 1);
		assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
		assert!(!entries[0].is_pending());
		assert_eq!(registry.take_types().unwrap().len(), 1);
	}

	#[test]
	fn colliding_identities_are_rejected() {
		let registry = Registry::new();
		let first = TypeIdentity::of::<a::b_C>();
		let second = TypeIdentity::of::<a_b::C>();
		assert_eq!(first.canonical_name(), second.canonical_name());
		let name = first.canonical_name();
		registry.get_or_create(&name, Some(first), EntryKind::Object, || object(&name)).unwrap();
		let err =
			registry.get_or_create(&name, Some(second), EntryKind::Object, || object(&name)).unwrap_err();
		assert!(matches!(err, GqlError::TypeCollision { .. }), "unexpected error: {err}");
	}

	#[test]
	fn recursive_requests_see_the_pending_entry() {
		let registry = Registry::new();
		let identity = TypeIdentity::of::<a::b_C>();
		let name = canonical_name(identity.name());
		let outer = registry
			.get_or_create(&name, Some(identity), EntryKind::Object, || {
				let inner = registry
					.get_or_create(&name, Some(identity), EntryKind::Object, || {
						panic!("a pending entry must not be rebuilt")
					})
					.unwrap();
				assert!(inner.is_pending());
				object(&name)
			})
			.unwrap();
		assert!(!outer.is_pending());
	}

	#[test]
	fn failed_builds_release_the_name() {
		let registry = Registry::new();
		let err = registry
			.get_or_create("Broken", None, EntryKind::Container, || {
				Err(GqlError::SchemaError("broken".to_owned()))
			})
			.unwrap_err();
		assert!(matches!(err, GqlError::SchemaError(_)));
		assert!(registry.get("Broken").is_none());
	}

	#[test]
	fn containers_share_entries() {
		let registry = Registry::new();
		let build = || Ok(Scalar::new("List_Item").into());
		let first = registry.get_or_create("List_Item", None, EntryKind::Container, build).unwrap();
		let second = registry.get_or_create("List_Item", None, EntryKind::Container, build).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn custom_scalars_are_keyed_by_identity() {
		let registry = Registry::new();
		let (scalar, custom) = ScalarDef::<u16>::new("Port")
			.description("A network port")
			.serialize(|port| Some(GqlValue::String(format!(":{port}"))))
			.into_parts();
		registry.register_scalar(scalar, custom).unwrap();
		let custom = registry.custom_scalar(&TypeIdentity::of::<u16>()).unwrap();
		assert_eq!(custom.name(), "Port");
		assert_eq!(custom.serialize(&8080u16, "gql"), Some(GqlValue::String(":8080".to_owned())));
		assert_eq!(custom.serialize(&"wrong type", "gql"), None);
		let parsed = custom.parse(&GqlValue::String("443".to_owned())).unwrap();
		assert_eq!(parsed.downcast_ref::<u16>(), Some(&443));
		assert!(registry.custom_scalar(&TypeIdentity::of::<u32>()).is_none());
		assert_eq!(registry.take_types().unwrap().len(), 1);
	}

	#[test]
	fn a_type_takes_one_custom_scalar() {
		let registry = Registry::new();
		let (scalar, custom) = ScalarDef::<u16>::new("Port").into_parts();
		registry.register_scalar(scalar, custom).unwrap();

		for name in ["Port", "Socket"] {
			let (scalar, custom) = ScalarDef::<u16>::new(name)
				.serialize(|_| Some(GqlValue::Null))
				.into_parts();
			let err = registry.register_scalar(scalar, custom).unwrap_err();
			assert!(matches!(err, GqlError::DuplicateScalar { .. }), "unexpected error: {err}");
		}
		assert!(registry.get("Socket").is_none());
		let custom = registry.custom_scalar(&TypeIdentity::of::<u16>()).unwrap();
		assert_eq!(custom.serialize(&80u16, "gql"), Some(GqlValue::Number(80.into())));
	}
}
