//! The database handle the engine borrows.
//!
//! The engine is synchronous and issues no transaction control; the
//! handle's transaction discipline belongs to the caller. Implementations
//! ship for PostgreSQL ([`crate::backend::postgres`]) and for in-memory
//! tests ([`crate::testing::memdb`]).

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub type DbError = Box<dyn std::error::Error + Send + Sync>;

/// One result row, keyed by the emitted column aliases (`table/column`).
pub type Row = HashMap<String, Value>;

pub trait Database {
    /// Run a SELECT with `?` placeholders bound to `params`, in order.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError>;

    /// Insert one row.
    fn insert(&mut self, table: &str, values: &BTreeMap<String, Value>) -> Result<(), DbError>;

    /// Update rows matching a `?`-parameterized WHERE fragment.
    fn update(
        &mut self,
        table: &str,
        values: &BTreeMap<String, Value>,
        where_sql: &str,
        where_params: &[Value],
    ) -> Result<(), DbError>;

    /// Run a statement that returns nothing.
    fn execute(&mut self, sql: &str) -> Result<(), DbError>;
}
