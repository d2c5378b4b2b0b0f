//! Result assembly: turning flat rows plus child results back into the
//! nested shape the caller asked for.
//!
//! Output keys are the caller's own property spellings (the query nodes
//! retain them), the PK lands under the caller's `db/id` or `id` spelling
//! when requested, and columns that were selected only to resolve joins
//! are not emitted.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::query::shape::QueryNode;
use crate::schema::model::{JoinArity, Schema};

use super::database::Row;

/// One assembled row: the value of the incoming filter column (what the
/// parent level groups by), the row's own PK, and the caller-shaped value.
#[derive(Debug, Clone)]
pub(crate) struct AssembledRow {
    pub group_key: i64,
    pub pk: i64,
    pub value: Value,
}

/// Child results for one join of the current level, in query order.
#[derive(Debug, Clone)]
pub(crate) struct JoinChildren {
    /// Output key: the caller's spelling of the join property.
    pub prop: String,
    /// Alias of the descriptor's source-side column in the parent rows;
    /// its value per row selects that row's children.
    pub source_alias: String,
    pub arity: JoinArity,
    /// A recursion gate dropped this join entirely; emit no key.
    pub skipped: bool,
    pub grouped: HashMap<i64, Vec<Value>>,
}

/// Group child rows by their incoming filter-column value, preserving the
/// order rows came back in; optionally sort each group by child PK.
pub(crate) fn group_children(
    rows: Vec<AssembledRow>,
    stable_order: bool,
) -> HashMap<i64, Vec<Value>> {
    let mut rows = rows;
    if stable_order {
        rows.sort_by_key(|row| (row.group_key, row.pk));
    }
    let mut grouped: HashMap<i64, Vec<Value>> = HashMap::new();
    for row in rows {
        grouped.entry(row.group_key).or_default().push(row.value);
    }
    grouped
}

pub(crate) fn assemble_level(
    schema: &Schema,
    query: &[QueryNode],
    rows: &[Row],
    pk_alias: &str,
    group_alias: &str,
    children: &[JoinChildren],
) -> Vec<AssembledRow> {
    let mut assembled = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(group_key) = row.get(group_alias).and_then(Value::as_i64) else {
            continue;
        };
        let Some(pk) = row.get(pk_alias).and_then(Value::as_i64) else {
            continue;
        };
        let mut value = Map::new();
        let mut join_index = 0;
        for node in query {
            match node {
                QueryNode::Prop(p) if p.is_pk_sentinel() => {
                    value.insert(
                        p.to_string(),
                        row.get(pk_alias).cloned().unwrap_or(Value::Null),
                    );
                }
                QueryNode::Prop(p) => {
                    let alias = schema.graph_to_sql(p).to_string();
                    value.insert(
                        p.to_string(),
                        row.get(&alias).cloned().unwrap_or(Value::Null),
                    );
                }
                QueryNode::Join(_) => {
                    let child = &children[join_index];
                    join_index += 1;
                    if child.skipped {
                        continue;
                    }
                    let matched = row
                        .get(&child.source_alias)
                        .and_then(Value::as_i64)
                        .and_then(|key| child.grouped.get(&key))
                        .cloned()
                        .unwrap_or_default();
                    let attached = match child.arity {
                        JoinArity::ToMany => Value::Array(matched),
                        JoinArity::ToOne => matched.into_iter().next().unwrap_or(Value::Null),
                    };
                    value.insert(child.prop.clone(), attached);
                }
            }
        }
        assembled.push(AssembledRow {
            group_key,
            pk,
            value: Value::Object(value),
        });
    }
    assembled
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .graph_to_sql("person/name", "member/name")
            .pk("member", "id")
            .build()
            .unwrap()
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_assemble_renames_back_to_caller_properties() {
        let query = vec![QueryNode::prop("db/id"), QueryNode::prop("person/name")];
        let rows = vec![row(&[
            ("member/id", json!(7)),
            ("member/name", json!("joe")),
        ])];
        let assembled = assemble_level(&schema(), &query, &rows, "member/id", "member/id", &[]);
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled[0].pk, 7);
        assert_eq!(
            assembled[0].value,
            json!({"db/id": 7, "person/name": "joe"})
        );
    }

    #[test]
    fn test_unrequested_resolution_columns_are_not_emitted() {
        let query = vec![QueryNode::prop("person/name")];
        let rows = vec![row(&[
            ("member/id", json!(7)),
            ("member/name", json!("joe")),
            ("member/account_id", json!(3)),
        ])];
        let assembled =
            assemble_level(&schema(), &query, &rows, "member/id", "member/account_id", &[]);
        assert_eq!(assembled[0].group_key, 3);
        assert_eq!(assembled[0].value, json!({"person/name": "joe"}));
    }

    #[test]
    fn test_to_one_takes_the_first_child_and_defaults_to_null() {
        let query = vec![
            QueryNode::prop("db/id"),
            QueryNode::join("member/account", vec![QueryNode::prop("db/id")]),
        ];
        let mut grouped = HashMap::new();
        grouped.insert(3, vec![json!({"db/id": 3})]);
        let children = vec![JoinChildren {
            prop: "member/account".to_string(),
            source_alias: "member/account_id".to_string(),
            arity: JoinArity::ToOne,
            skipped: false,
            grouped,
        }];
        let rows = vec![
            row(&[("member/id", json!(1)), ("member/account_id", json!(3))]),
            row(&[("member/id", json!(2)), ("member/account_id", Value::Null)]),
        ];
        let assembled =
            assemble_level(&schema(), &query, &rows, "member/id", "member/id", &children);
        assert_eq!(
            assembled[0].value,
            json!({"db/id": 1, "member/account": {"db/id": 3}})
        );
        assert_eq!(
            assembled[1].value,
            json!({"db/id": 2, "member/account": null})
        );
    }

    #[test]
    fn test_skipped_joins_contribute_no_key() {
        let query = vec![
            QueryNode::prop("db/id"),
            QueryNode::join("member/account", vec![QueryNode::prop("db/id")]),
        ];
        let children = vec![JoinChildren {
            prop: "member/account".to_string(),
            source_alias: "member/account_id".to_string(),
            arity: JoinArity::ToOne,
            skipped: true,
            grouped: HashMap::new(),
        }];
        let rows = vec![row(&[
            ("member/id", json!(1)),
            ("member/account_id", json!(3)),
        ])];
        let assembled =
            assemble_level(&schema(), &query, &rows, "member/id", "member/id", &children);
        assert_eq!(assembled[0].value, json!({"db/id": 1}));
    }

    #[test]
    fn test_group_children_preserves_row_order() {
        let rows = vec![
            AssembledRow {
                group_key: 1,
                pk: 9,
                value: json!({"db/id": 9}),
            },
            AssembledRow {
                group_key: 1,
                pk: 4,
                value: json!({"db/id": 4}),
            },
        ];
        let grouped = group_children(rows.clone(), false);
        assert_eq!(grouped[&1], vec![json!({"db/id": 9}), json!({"db/id": 4})]);
        let stable = group_children(rows, true);
        assert_eq!(stable[&1], vec![json!({"db/id": 4}), json!({"db/id": 9})]);
    }
}
