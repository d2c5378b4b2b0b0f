//! Fixture seeding with symbolic placeholder IDs.
//!
//! Test fixtures insert rows whose PKs - and references to other rows'
//! PKs - are symbolic placeholders. Seeding resolves them in two passes:
//! first every placeholder appearing in a PK slot gets a real ID from the
//! database sequence, then every value slot is substituted and the
//! instructions execute (all inserts, then all updates, each group in the
//! given order). The placeholder-to-id mapping is returned so tests can
//! address the rows they created.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::executor::database::Database;
use crate::executor::errors::EngineError;
use crate::executor::next_id::next_id;
use crate::schema::model::Schema;

#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Value(Value),
    Placeholder(String),
}

impl SeedValue {
    pub fn placeholder(name: impl Into<String>) -> Self {
        SeedValue::Placeholder(name.into())
    }
}

impl From<Value> for SeedValue {
    fn from(value: Value) -> Self {
        SeedValue::Value(value)
    }
}

pub type SeedRow = BTreeMap<String, SeedValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOp {
    Insert { table: String, row: SeedRow },
    Update {
        table: String,
        id: SeedValue,
        row: SeedRow,
    },
}

impl SeedOp {
    pub fn insert(table: &str, row: SeedRow) -> Self {
        SeedOp::Insert {
            table: table.to_string(),
            row,
        }
    }

    pub fn update(table: &str, id: SeedValue, row: SeedRow) -> Self {
        SeedOp::Update {
            table: table.to_string(),
            id,
            row,
        }
    }
}

pub fn seed(
    db: &mut dyn Database,
    schema: &Schema,
    ops: &[SeedOp],
) -> Result<HashMap<String, i64>, EngineError> {
    // Pass 1: allocate a real ID for every placeholder defined in a PK
    // slot. Defining the same placeholder twice is an error.
    let mut ids: HashMap<String, i64> = HashMap::new();
    for op in ops {
        if let SeedOp::Insert { table, row } = op {
            let pk = schema.pk(table);
            if let Some(SeedValue::Placeholder(name)) = row.get(pk) {
                if ids.contains_key(name) {
                    return Err(EngineError::DuplicatePlaceholder { name: name.clone() });
                }
                let id = next_id(db, schema, table)?;
                log::debug!("seed: placeholder {} -> {} ({})", name, id, table);
                ids.insert(name.clone(), id);
            }
        }
    }

    // Pass 2: substitute placeholders in every value slot and execute.
    for op in ops {
        if let SeedOp::Insert { table, row } = op {
            db.insert(table, &resolve_row(&ids, row))?;
        }
    }
    for op in ops {
        if let SeedOp::Update { table, id, row } = op {
            let where_sql = format!("{} = ?", schema.pk(table));
            db.update(table, &resolve_row(&ids, row), &where_sql, &[resolve(&ids, id)])?;
        }
    }
    Ok(ids)
}

/// Placeholders with no recorded ID pass through as their symbolic name.
fn resolve(ids: &HashMap<String, i64>, value: &SeedValue) -> Value {
    match value {
        SeedValue::Value(v) => v.clone(),
        SeedValue::Placeholder(name) => match ids.get(name) {
            Some(id) => Value::from(*id),
            None => Value::String(name.clone()),
        },
    }
}

fn resolve_row(ids: &HashMap<String, i64>, row: &SeedRow) -> BTreeMap<String, Value> {
    row.iter()
        .map(|(column, value)| (column.clone(), resolve(ids, value)))
        .collect()
}
