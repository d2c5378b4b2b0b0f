//! Declarative row filters.
//!
//! Callers describe filters as per-property rules with a fixed comparator
//! vocabulary and an optional depth range. Rules compile into per-table
//! WHERE-clause fragments with `?` placeholders; at query time the subset
//! applicable to the current tables and traversal depth is AND-composed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::model::Schema;
use crate::schema::property::Prop;

use super::errors::SqlGenerationError;

pub const DEFAULT_MIN_DEPTH: u32 = 1;
pub const DEFAULT_MAX_DEPTH: u32 = 1000;

fn default_min_depth() -> u32 {
    DEFAULT_MIN_DEPTH
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// One declarative rule: a comparator, its literal, and the inclusive
/// depth range the rule applies at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub op: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl FilterRule {
    fn with(op: &str, value: Value) -> Self {
        FilterRule {
            op: op.to_string(),
            value,
            min_depth: DEFAULT_MIN_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn eq(value: impl Into<Value>) -> Self {
        FilterRule::with("eq", value.into())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        FilterRule::with("ne", value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        FilterRule::with("gt", value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        FilterRule::with("lt", value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        FilterRule::with("gte", value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        FilterRule::with("lte", value.into())
    }

    /// `null(true)` matches NULL columns, `null(false)` non-NULL ones.
    pub fn null(is_null: bool) -> Self {
        FilterRule::with("null", Value::Bool(is_null))
    }

    pub fn min_depth(mut self, depth: u32) -> Self {
        self.min_depth = depth;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }
}

/// A compiled clause: a SQL fragment with `?` placeholders, its parameters
/// in order, and the depth range it applies at.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub sql: String,
    pub params: Vec<Value>,
    pub min_depth: u32,
    pub max_depth: u32,
}

impl FilterClause {
    fn applies_at(&self, depth: u32) -> bool {
        self.min_depth <= depth && depth <= self.max_depth
    }
}

/// Compiled filters, grouped by the table each clause applies to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    clauses: HashMap<String, Vec<FilterClause>>,
}

impl Filters {
    pub fn empty() -> Self {
        Filters::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses_for(&self, table: &str) -> &[FilterClause] {
        self.clauses.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compose the clauses applicable to the given tables at the given
    /// depth into one AND-joined fragment, parameters in clause order.
    /// `(None, empty)` when nothing applies.
    pub fn for_tables(&self, tables: &[&str], depth: u32) -> (Option<String>, Vec<Value>) {
        let mut fragments = Vec::new();
        let mut params = Vec::new();
        for table in tables {
            for clause in self.clauses_for(table) {
                if clause.applies_at(depth) {
                    fragments.push(clause.sql.clone());
                    params.extend(clause.params.iter().cloned());
                }
            }
        }
        if fragments.is_empty() {
            (None, Vec::new())
        } else {
            (Some(fragments.join(" AND ")), params)
        }
    }
}

/// Compile declarative filter parameters into per-table clauses. An
/// unknown comparator fails with the offending rule attached.
pub fn filter_params_to_filters(
    schema: &Schema,
    params: &[(Prop, FilterRule)],
) -> Result<Filters, SqlGenerationError> {
    let mut clauses: HashMap<String, Vec<FilterClause>> = HashMap::new();
    for (prop, rule) in params {
        let sql_prop = schema.graph_to_sql(prop);
        let table = match sql_prop.table() {
            Some(table) => table.to_string(),
            None => {
                return Err(SqlGenerationError::UnqualifiedFilterProperty {
                    property: prop.to_string(),
                })
            }
        };
        let column = sql_prop.qualified();
        let (sql, clause_params) = match rule.op.as_str() {
            "eq" => (format!("{} = ?", column), vec![rule.value.clone()]),
            "ne" => (format!("{} != ?", column), vec![rule.value.clone()]),
            "gt" => (format!("{} > ?", column), vec![rule.value.clone()]),
            "lt" => (format!("{} < ?", column), vec![rule.value.clone()]),
            "gte" => (format!("{} >= ?", column), vec![rule.value.clone()]),
            "lte" => (format!("{} <= ?", column), vec![rule.value.clone()]),
            "null" => match rule.value {
                Value::Bool(true) => (format!("{} IS NULL", column), Vec::new()),
                Value::Bool(false) => (format!("{} IS NOT NULL", column), Vec::new()),
                _ => {
                    return Err(SqlGenerationError::UnknownFilterOperation {
                        property: prop.to_string(),
                        rule: rule.clone(),
                    })
                }
            },
            _ => {
                return Err(SqlGenerationError::UnknownFilterOperation {
                    property: prop.to_string(),
                    rule: rule.clone(),
                })
            }
        };
        clauses.entry(table).or_default().push(FilterClause {
            sql,
            params: clause_params,
            min_depth: rule.min_depth,
            max_depth: rule.max_depth,
        });
    }
    Ok(Filters { clauses })
}
