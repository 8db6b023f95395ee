//! Builds a queryable GraphQL schema, and the resolvers behind it, from plain
//! Rust data types.
//!
//! Structs describe their tagged fields and prefixed resolver methods through
//! [`GraphObject`], argument structs through [`Arguments`], and the root of
//! the graph through [`RootResolver`]. A [`SchemaBuilder`] turns the root
//! instance into a [`Schema`], and an [`Executor`] runs requests against it
//! with the request's root data attached.
//!
//! ```ignore
//! let schema = SchemaBuilder::new().build(Shop::default())?;
//! let res = Executor::new(&schema)
//! 	.query(r#"{ products(cursor: "c") { list { name } cursor } }"#)
//! 	.root(RootData::new().with("tenant", "acme".into()))
//! 	.execute()
//! 	.await;
//! ```

#[macro_use]
extern crate tracing;

mod executor;

pub use async_graphql::{Context, Value as GqlValue};
pub use executor::Executor;
pub use graphloader_core::gql::*;
pub use graphloader_core::{cnf, reflect_object, reflect_text};
