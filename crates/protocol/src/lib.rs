//! Wire types for the engine's GraphQL API.
//!
//! This crate holds the data that crosses the wire and the pure functions
//! that produce or consume it:
//!
//! * [`Argument`] / [`Arguments`]: closed argument variant and ordered argument maps
//! * [`OperationNode`] / [`QueryTree`]: the persistent, append-only selection chain
//! * [`build_query`] / [`build_batch_query`]: query tree to GraphQL document
//! * [`query_flatten`]: nested response to the single leaf the caller asked for
//! * [`GraphQlRequest`] / [`GraphQlResponse`]: HTTP envelope types
//!
//! Nothing here performs I/O. Sessions and transports live in `dagger-runtime`;
//! the ergonomic client handle is built on top in `dagger-sdk`.

pub mod argument;
pub mod builder;
pub mod error;
pub mod flatten;
pub mod graphql;
pub mod tree;

pub use argument::{Argument, Arguments};
pub use builder::{build_batch_query, build_query};
pub use error::{FlattenError, ProtocolError};
pub use flatten::query_flatten;
pub use graphql::{GraphQlError, GraphQlLocation, GraphQlRequest, GraphQlResponse};
pub use tree::{OperationNode, QueryTree};
