//! An in-memory [`Database`] for tests.
//!
//! Interprets exactly the SQL the engine emits - single-table and
//! link-join SELECTs with an optional AND-composed filter prefix and a
//! trailing IN list, plus the three next-id statement forms. Anything
//! else is rejected, which keeps the emitter honest about its grammar.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::executor::database::{Database, DbError, Row};

type TableRow = BTreeMap<String, Value>;

#[derive(Debug, Default)]
pub struct MemDb {
    tables: BTreeMap<String, Vec<TableRow>>,
    sequences: BTreeMap<String, i64>,
    last_insert_id: i64,
}

impl MemDb {
    pub fn new() -> Self {
        MemDb::default()
    }

    /// Raw rows of a table, in insertion order, for assertions.
    pub fn rows(&self, table: &str) -> &[TableRow] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn bump_sequence(&mut self, sequence: &str) -> i64 {
        let counter = self.sequences.entry(sequence.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn run_select(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let rest = sql
            .strip_prefix("SELECT ")
            .ok_or_else(|| unsupported(sql))?;
        let (select_part, rest) = rest.split_once(" FROM ").ok_or_else(|| unsupported(sql))?;
        let (from_part, where_part) = rest
            .split_once(" WHERE ")
            .ok_or_else(|| unsupported(sql))?;

        let columns = parse_select_list(select_part)?;
        let env_rows = self.from_rows(from_part)?;
        let (predicates, in_col, in_ids) = parse_where(where_part)?;

        let mut out = Vec::new();
        for env in env_rows {
            let mut param_iter = params.iter();
            let passes = predicates.iter().all(|p| p.eval(&env, &mut param_iter));
            if !passes {
                continue;
            }
            let in_value = env.get(&in_col).and_then(Value::as_i64);
            match in_value {
                Some(id) if in_ids.contains(&id) => {}
                _ => continue,
            }
            let mut row = Row::new();
            for (qualified, alias) in &columns {
                row.insert(
                    alias.clone(),
                    env.get(qualified).cloned().unwrap_or(Value::Null),
                );
            }
            out.push(row);
        }
        Ok(out)
    }

    /// Materialize the FROM clause as rows keyed `table.column`.
    fn from_rows(&self, from_part: &str) -> Result<Vec<HashMap<String, Value>>, DbError> {
        match from_part.split_once(" INNER JOIN ") {
            None => {
                let table = from_part.trim();
                Ok(self
                    .rows(table)
                    .iter()
                    .map(|row| qualify(table, row))
                    .collect())
            }
            Some((target, rest)) => {
                let (link, on) = rest
                    .split_once(" ON ")
                    .ok_or_else(|| unsupported(from_part))?;
                let (left, right) = on.split_once(" = ").ok_or_else(|| unsupported(on))?;
                let mut out = Vec::new();
                for target_row in self.rows(target.trim()) {
                    let target_env = qualify(target.trim(), target_row);
                    for link_row in self.rows(link.trim()) {
                        let mut env = target_env.clone();
                        env.extend(qualify(link.trim(), link_row));
                        if env.get(left.trim()) == env.get(right.trim())
                            && env.get(left.trim()).is_some()
                        {
                            out.push(env);
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

fn unsupported(sql: &str) -> DbError {
    format!("memdb does not understand: {}", sql).into()
}

fn qualify(table: &str, row: &TableRow) -> HashMap<String, Value> {
    row.iter()
        .map(|(column, value)| (format!("{}.{}", table, column), value.clone()))
        .collect()
}

/// `t.c AS "t/c"` entries, comma-separated.
fn parse_select_list(select_part: &str) -> Result<Vec<(String, String)>, DbError> {
    let mut columns = Vec::new();
    for entry in select_part.split(", ") {
        let (qualified, alias) = entry.split_once(" AS ").ok_or_else(|| unsupported(entry))?;
        columns.push((
            qualified.trim().to_string(),
            alias.trim().trim_matches('"').to_string(),
        ));
    }
    Ok(columns)
}

#[derive(Debug)]
enum Predicate {
    Compare { column: String, op: String },
    IsNull { column: String, negated: bool },
}

impl Predicate {
    fn eval<'a>(
        &self,
        env: &HashMap<String, Value>,
        params: &mut impl Iterator<Item = &'a Value>,
    ) -> bool {
        match self {
            Predicate::IsNull { column, negated } => {
                let is_null = matches!(env.get(column), None | Some(Value::Null));
                is_null != *negated
            }
            Predicate::Compare { column, op } => {
                let Some(expected) = params.next() else {
                    return false;
                };
                let actual = env.get(column).cloned().unwrap_or(Value::Null);
                compare(&actual, expected, op)
            }
        }
    }
}

fn compare(actual: &Value, expected: &Value, op: &str) -> bool {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return match op {
            "=" => a == b,
            "!=" => a != b,
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            _ => false,
        };
    }
    if let (Some(a), Some(b)) = (actual.as_str(), expected.as_str()) {
        return match op {
            "=" => a == b,
            "!=" => a != b,
            ">" => a > b,
            "<" => a < b,
            ">=" => a >= b,
            "<=" => a <= b,
            _ => false,
        };
    }
    match op {
        "=" => actual == expected,
        "!=" => actual != expected,
        _ => false,
    }
}

/// `(<pred> AND <pred>) AND t.c IN (1,2)` or `t.c IN (1,2)`.
fn parse_where(where_part: &str) -> Result<(Vec<Predicate>, String, Vec<i64>), DbError> {
    let (filter_part, in_part) = if let Some(rest) = where_part.strip_prefix('(') {
        let (filters, in_clause) = rest
            .split_once(") AND ")
            .ok_or_else(|| unsupported(where_part))?;
        (Some(filters), in_clause)
    } else {
        (None, where_part)
    };

    let (in_col, ids_part) = in_part
        .split_once(" IN (")
        .ok_or_else(|| unsupported(in_part))?;
    let ids = ids_part
        .trim_end_matches(')')
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<i64>().map_err(|e| -> DbError { e.to_string().into() }))
        .collect::<Result<Vec<i64>, DbError>>()?;

    let mut predicates = Vec::new();
    if let Some(filters) = filter_part {
        for clause in filters.split(" AND ") {
            predicates.push(parse_predicate(clause)?);
        }
    }
    Ok((predicates, in_col.trim().to_string(), ids))
}

fn parse_predicate(clause: &str) -> Result<Predicate, DbError> {
    if let Some(column) = clause.strip_suffix(" IS NOT NULL") {
        return Ok(Predicate::IsNull {
            column: column.trim().to_string(),
            negated: true,
        });
    }
    if let Some(column) = clause.strip_suffix(" IS NULL") {
        return Ok(Predicate::IsNull {
            column: column.trim().to_string(),
            negated: false,
        });
    }
    // Two-character operators first so `>=` is not read as `>`.
    for op in ["!=", ">=", "<=", "=", ">", "<"] {
        let pattern = format!(" {} ?", op);
        if let Some(column) = clause.strip_suffix(&pattern) {
            return Ok(Predicate::Compare {
                column: column.trim().to_string(),
                op: op.to_string(),
            });
        }
    }
    Err(unsupported(clause))
}

impl Database for MemDb {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        if let Some(rest) = sql.strip_prefix("SELECT nextval('") {
            let sequence = rest.trim_end_matches("')");
            let id = self.bump_sequence(sequence);
            return Ok(vec![Row::from([("nextval".to_string(), Value::from(id))])]);
        }
        if let Some(sequence) = sql.strip_prefix("SELECT NEXT VALUE FOR ") {
            let id = self.bump_sequence(sequence.trim());
            return Ok(vec![Row::from([
                ("next_value".to_string(), Value::from(id)),
            ])]);
        }
        if sql == "SELECT LAST_INSERT_ID()" {
            return Ok(vec![Row::from([
                ("last_insert_id".to_string(), Value::from(self.last_insert_id)),
            ])]);
        }
        self.run_select(sql, params)
    }

    fn insert(&mut self, table: &str, values: &BTreeMap<String, Value>) -> Result<(), DbError> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(values.clone());
        Ok(())
    }

    fn update(
        &mut self,
        table: &str,
        values: &BTreeMap<String, Value>,
        where_sql: &str,
        where_params: &[Value],
    ) -> Result<(), DbError> {
        let column = where_sql
            .strip_suffix(" = ?")
            .ok_or_else(|| unsupported(where_sql))?;
        let expected = where_params
            .first()
            .ok_or_else(|| -> DbError { "update requires one parameter".into() })?;
        let rows = self.tables.entry(table.to_string()).or_default();
        for row in rows.iter_mut() {
            if row.get(column) == Some(expected) {
                for (k, v) in values {
                    row.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        // The MySQL next-id counter bump.
        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            if let Some(sequence) = rest.strip_suffix(" SET n = LAST_INSERT_ID(n + 1)") {
                self.last_insert_id = self.bump_sequence(sequence);
                return Ok(());
            }
        }
        Err(unsupported(sql))
    }
}
