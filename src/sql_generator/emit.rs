//! Per-level SELECT generation.
//!
//! One query level turns into a single statement of the form
//! `SELECT ... FROM ... WHERE <filters AND> <filter-col> IN (...)`, with
//! an INNER JOIN onto the link table for many-to-many joins. The SELECT
//! list is sorted by SQL property so emitted statements are deterministic.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::query::analyzer::{columns_for, table_for};
use crate::query::shape::QueryNode;
use crate::schema::model::Schema;
use crate::schema::property::Prop;

use super::errors::SqlGenerationError;
use super::filters::Filters;

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Build the statement for one query level.
///
/// `incoming` is the property the id set filters on: `None` means the ids
/// are the PKs of the query's own table; a join property routes through
/// its descriptor (and link table, for length-4 descriptors); any other
/// property is used as the filter column directly. An empty id set yields
/// `None` - there is nothing to ask the database.
pub fn query_for(
    schema: &Schema,
    incoming: Option<&Prop>,
    query: &[QueryNode],
    ids: &BTreeSet<i64>,
    filters: &Filters,
    depth: u32,
) -> Result<Option<SqlStatement>, SqlGenerationError> {
    if ids.is_empty() {
        return Ok(None);
    }
    let table = table_for(schema, query)?;
    let mut columns = columns_for(schema, query)?;

    let mut link_table = None;
    let (from_clause, filter_col) = match incoming {
        None => (table.clone(), schema.id_prop(&table)),
        Some(prop) => {
            let sql_prop = schema.graph_to_sql(prop);
            match schema.join(&sql_prop) {
                Some(descriptor) => {
                    let target_table = descriptor
                        .target_col()
                        .table()
                        .expect("descriptor entries are namespaced");
                    if target_table != table {
                        return Err(SqlGenerationError::JoinTargetMismatch {
                            join: prop.to_string(),
                            expected: target_table.to_string(),
                            found: table,
                        });
                    }
                    if let Some((link_right, target_col)) = descriptor.link_on() {
                        let link = descriptor.link_table().expect("length-4 descriptor");
                        link_table = Some(link.to_string());
                        let from = format!(
                            "{} INNER JOIN {} ON {} = {}",
                            table,
                            link,
                            link_right.qualified(),
                            target_col.qualified()
                        );
                        (from, descriptor.filter_col().clone())
                    } else {
                        (table.clone(), descriptor.filter_col().clone())
                    }
                }
                None => {
                    if sql_prop.table() != Some(table.as_str()) {
                        return Err(SqlGenerationError::EntryColumnMismatch {
                            prop: prop.to_string(),
                            table,
                        });
                    }
                    (table.clone(), sql_prop)
                }
            }
        }
    };

    // The filter column is always selected: the assembler groups child
    // rows by it, and for link joins it is the only parent reference.
    columns.insert(filter_col.clone());

    let mut filter_tables: Vec<&str> = vec![table.as_str()];
    if let Some(link) = link_table.as_deref() {
        filter_tables.push(link);
    }
    let (filter_sql, params) = filters.for_tables(&filter_tables, depth);

    let select: Vec<String> = columns
        .iter()
        .map(|c| schema.driver().column_spec(c))
        .collect();
    let in_list: Vec<String> = ids.iter().map(i64::to_string).collect();
    let where_clause = match &filter_sql {
        Some(fragment) => format!(
            "({}) AND {} IN ({})",
            fragment,
            filter_col.qualified(),
            in_list.join(",")
        ),
        None => format!("{} IN ({})", filter_col.qualified(), in_list.join(",")),
    };
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        select.join(", "),
        from_clause,
        where_clause
    );
    log::debug!("emitted level query: {}", sql);
    Ok(Some(SqlStatement { sql, params }))
}
