//! Pullsql - pull-style graph queries over relational databases
//!
//! This crate translates declarative, tree-shaped property-selection
//! queries over a logical entity graph into relational SQL through:
//! - A schema catalog mapping graph properties to tables and columns
//! - Per-level SELECT generation with join resolution (to-one, to-many,
//!   many-to-many via link tables)
//! - Recursive traversal with depth and cycle control
//! - Reassembly of row results into the nested shape the caller requested

pub mod backend;
pub mod executor;
pub mod query;
pub mod schema;
pub mod seed;
pub mod sql_generator;
pub mod testing;

pub use executor::database::{Database, DbError, Row};
pub use executor::errors::EngineError;
pub use executor::traversal::{run_query, run_query_bounded, RECURSION_CEILING};
pub use query::shape::{JoinNode, QueryNode, Recursion, SubQuery};
pub use schema::model::{Driver, JoinArity, JoinDescriptor, Schema, SchemaBuilder};
pub use schema::property::Prop;
pub use sql_generator::filters::{filter_params_to_filters, FilterRule, Filters};
