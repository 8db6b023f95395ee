//! Schema construction and resolver binding.
//!
//! This module turns self-describing Rust types into an `async_graphql`
//! dynamic schema whose fields dispatch straight back into those types.
//!
//! ## Architecture
//!
//! The subsystem is split into layers:
//!
//! - **Type inspection** ([`reflect`], [`ident`], [`inspector`]) -- every exposable type
//!   implements [`Reflect`], which yields its canonical [`TypeDescriptor`]. The [`Inspector`]
//!   maps descriptors onto schema types.
//! - **Registry** ([`registry`], [`codec`]) -- memoizes one schema type per canonical name,
//!   including the shared container scalars and caller-registered custom scalars.
//! - **Objects and conventions** ([`object`], [`tag`], [`convention`]) -- structs declare their
//!   tagged fields and prefixed resolver methods. Prefixed methods either override a tagged field
//!   or add a synthetic one.
//! - **Arguments** ([`args`], [`validator`]) -- argument structs are populated from the query
//!   arguments and the request's root data, then checked by the optional validator.
//! - **Dispatch** ([`dispatch`]) -- type-erased resolver methods and the field closures handed to
//!   the engine.
//! - **Assembly** ([`schema`]) -- the [`SchemaBuilder`] which exposes the methods of a root
//!   instance as the query type.
//! - **Error handling** ([`error`]) -- domain error type ([`GqlError`]) with helper constructors.

pub mod args;
pub mod codec;
pub mod convention;
pub mod dispatch;
pub mod error;
mod ext;
pub mod ident;
pub mod inspector;
pub mod object;
pub mod reflect;
pub mod registry;
pub mod schema;
pub mod tag;
mod utils;
pub mod validator;

pub use args::{Arguments, ArgumentsDef, ArgumentsDescriptor, QueryArgs, RootData};
pub use codec::Container;
pub use convention::lower_camel;
pub use dispatch::{Method, MethodDef, Receiver};
pub use error::GqlError;
pub use ext::Named;
pub use ident::TypeIdentity;
pub use inspector::{Inspector, Shape};
pub use object::{GraphObject, ObjectDef, ObjectDescriptor};
pub use reflect::{Kind, Plan, Reflect, TypeDescriptor};
pub use registry::{CustomScalar, Registry, ScalarDef};
pub use schema::{ResolverDef, RootResolver, Schema, SchemaBuilder};
pub use tag::Tag;
pub use validator::{Validator, typed};
