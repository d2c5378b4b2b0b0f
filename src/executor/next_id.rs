//! Primary-key allocation for the seeding helper.
//!
//! Dialect-dispatched on the schema driver. Values are monotonic per table
//! across back-to-back calls on every dialect.

use rand::Rng;
use serde_json::Value;
use std::env;

use crate::schema::model::{Driver, Schema};

use super::database::Database;
use super::errors::EngineError;

/// When this environment variable is set, a random count in `[0, 20)` of
/// extra IDs is drawn before each allocation, so rows seeded first into
/// different tables do not share identical small IDs. Identical IDs across
/// tables mask bugs where a query reads the wrong table's column.
pub const DEV_MODE_ENV: &str = "PULLSQL_DEV";

pub fn next_id(
    db: &mut dyn Database,
    schema: &Schema,
    table: &str,
) -> Result<i64, EngineError> {
    if env::var_os(DEV_MODE_ENV).is_some() {
        let gap = rand::thread_rng().gen_range(0..20);
        for _ in 0..gap {
            fetch_next(db, schema, table)?;
        }
    }
    fetch_next(db, schema, table)
}

fn fetch_next(db: &mut dyn Database, schema: &Schema, table: &str) -> Result<i64, EngineError> {
    let sequence = format!("{}_{}_seq", table, schema.pk(table));
    let rows = match schema.driver() {
        Driver::Default | Driver::Postgres => {
            db.query(&format!("SELECT nextval('{}')", sequence), &[])?
        }
        Driver::H2 => db.query(&format!("SELECT NEXT VALUE FOR {}", sequence), &[])?,
        Driver::Mysql => {
            // MySQL has no sequences; the LAST_INSERT_ID counter-table
            // idiom keeps allocation monotonic per call.
            db.execute(&format!("UPDATE {} SET n = LAST_INSERT_ID(n + 1)", sequence))?;
            db.query("SELECT LAST_INSERT_ID()", &[])?
        }
    };
    rows.first()
        .and_then(|row| row.values().next())
        .and_then(Value::as_i64)
        .ok_or_else(|| EngineError::NextIdUnavailable {
            table: table.to_string(),
        })
}
