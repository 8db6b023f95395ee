//! The engine behind graphloader: builds an `async-graphql` dynamic schema and
//! the dispatch closures of its fields from plain Rust data types.
//!
//! Types describe themselves at startup through [`gql::GraphObject`],
//! [`gql::Arguments`] and [`gql::RootResolver`]. The [`gql::SchemaBuilder`]
//! walks those descriptions, memoizes one schema type per canonical type
//! identity, and binds each field to its accessor or resolver method.

#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

pub mod cnf;
pub mod gql;

#[doc(hidden)]
/// Channels for the exported macros. Not public API.
pub mod __private {
	pub use async_graphql::Value as GqlValue;
	pub use async_graphql::dynamic::FieldValue;
}
