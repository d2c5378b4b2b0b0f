//! PostgreSQL implementation of the database handle.
//!
//! A thin adapter over the synchronous `postgres` client: translates the
//! engine's `?` placeholders to `$n`, converts scalar values in both
//! directions, and builds the INSERT/UPDATE statements the seeding helper
//! needs. Connection pooling and migrations stay with the caller.

use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::executor::database::{Database, DbError, Row};

pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    pub fn connect(connection_string: &str) -> Result<Self, DbError> {
        let client = Client::connect(connection_string, NoTls)?;
        Ok(PostgresDatabase { client })
    }

    pub fn from_client(client: Client) -> Self {
        PostgresDatabase { client }
    }
}

/// Rewrite `?` placeholders to `$n`, numbering from `start + 1` and
/// leaving quoted literals alone.
fn translate_placeholders(sql: &str, start: usize) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut counter = start;
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                counter += 1;
                out.push_str(&format!("${}", counter));
            }
            _ => out.push(ch),
        }
    }
    out
}

fn to_sql_param(value: &Value) -> Box<dyn ToSql + Sync> {
    match value {
        Value::Null => Box::new(Option::<String>::None),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Box::new(i),
            None => Box::new(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => Box::new(s.clone()),
        other => Box::new(other.to_string()),
    }
}

fn column_value(row: &postgres::Row, idx: usize) -> Value {
    let ty = row.columns()[idx].type_();
    let value = if *ty == Type::INT2 {
        row.get::<_, Option<i16>>(idx).map(Value::from)
    } else if *ty == Type::INT4 {
        row.get::<_, Option<i32>>(idx).map(Value::from)
    } else if *ty == Type::INT8 {
        row.get::<_, Option<i64>>(idx).map(Value::from)
    } else if *ty == Type::FLOAT4 {
        row.get::<_, Option<f32>>(idx).map(|v| Value::from(v as f64))
    } else if *ty == Type::FLOAT8 {
        row.get::<_, Option<f64>>(idx).map(Value::from)
    } else if *ty == Type::BOOL {
        row.get::<_, Option<bool>>(idx).map(Value::from)
    } else {
        row.try_get::<_, Option<String>>(idx)
            .unwrap_or(None)
            .map(Value::from)
    };
    value.unwrap_or(Value::Null)
}

impl Database for PostgresDatabase {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let translated = translate_placeholders(sql, 0);
        let owned: Vec<Box<dyn ToSql + Sync>> = params.iter().map(to_sql_param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(Box::as_ref).collect();
        let rows = self.client.query(translated.as_str(), &refs)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut mapped = Row::new();
            for (idx, column) in row.columns().iter().enumerate() {
                mapped.insert(column.name().to_string(), column_value(&row, idx));
            }
            out.push(mapped);
        }
        Ok(out)
    }

    fn insert(&mut self, table: &str, values: &BTreeMap<String, Value>) -> Result<(), DbError> {
        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${}", n)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );
        let owned: Vec<Box<dyn ToSql + Sync>> = values.values().map(to_sql_param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(Box::as_ref).collect();
        self.client.execute(sql.as_str(), &refs)?;
        Ok(())
    }

    fn update(
        &mut self,
        table: &str,
        values: &BTreeMap<String, Value>,
        where_sql: &str,
        where_params: &[Value],
    ) -> Result<(), DbError> {
        let assignments: Vec<String> = values
            .keys()
            .enumerate()
            .map(|(idx, column)| format!("{} = ${}", column, idx + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            translate_placeholders(where_sql, values.len())
        );
        let owned: Vec<Box<dyn ToSql + Sync>> = values
            .values()
            .chain(where_params.iter())
            .map(to_sql_param)
            .collect();
        let refs: Vec<&(dyn ToSql + Sync)> = owned.iter().map(Box::as_ref).collect();
        self.client.execute(sql.as_str(), &refs)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.client.batch_execute(sql)?;
        Ok(())
    }
}
