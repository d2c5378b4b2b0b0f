//! Query analysis: deriving the target table, the join classification and
//! the minimum column set a query level needs.

use std::collections::BTreeSet;

use crate::schema::model::{JoinDescriptor, Schema};
use crate::schema::property::Prop;

use super::errors::QueryAnalysisError;
use super::shape::{render, JoinNode, QueryNode};

/// Derive the single SQL table a query belongs to.
///
/// Every non-sentinel element must agree on one space; anything else is a
/// malformed query and fails with the rendered shape in the message.
pub fn table_for(schema: &Schema, query: &[QueryNode]) -> Result<String, QueryAnalysisError> {
    let mut spaces: BTreeSet<String> = BTreeSet::new();
    for node in query {
        let prop = match node {
            QueryNode::Prop(p) => p,
            QueryNode::Join(j) => &j.prop,
        };
        if prop.is_pk_sentinel() {
            continue;
        }
        let sql = schema.graph_to_sql(prop);
        if let Some(space) = sql.table() {
            spaces.insert(space.to_string());
        }
    }
    if spaces.len() == 1 {
        Ok(spaces.into_iter().next().expect("one element"))
    } else {
        Err(QueryAnalysisError::AmbiguousTable {
            query: render(query),
        })
    }
}

/// Look up the join descriptor for a join node, resolving the remap first.
pub fn descriptor_for<'a>(
    schema: &'a Schema,
    join: &JoinNode,
) -> Result<(Prop, &'a JoinDescriptor), QueryAnalysisError> {
    let sql = schema.graph_to_sql(&join.prop);
    match schema.join(&sql) {
        Some(descriptor) => Ok((sql, descriptor)),
        None => Err(QueryAnalysisError::UnknownJoin {
            prop: join.prop.to_string(),
        }),
    }
}

/// A join is forward when the source table holds an FK to the target's PK,
/// i.e. when the descriptor's source-side column is not the source PK.
pub fn is_forward(schema: &Schema, join: &JoinNode) -> Result<bool, QueryAnalysisError> {
    let (_, descriptor) = descriptor_for(schema, join)?;
    let source_table = descriptor
        .source_col()
        .table()
        .expect("descriptor entries are namespaced");
    Ok(descriptor.source_col() != &schema.id_prop(source_table))
}

/// A join is reverse when the target table holds the FK back to the source.
pub fn is_reverse(schema: &Schema, join: &JoinNode) -> Result<bool, QueryAnalysisError> {
    Ok(!is_forward(schema, join)?)
}

/// The column on the *current* table that resolves a join: the FK column
/// for a forward join, the source table's PK for a reverse one. Its values
/// in the parent rows become the child root set.
pub fn sqlprop_for_join(schema: &Schema, join: &JoinNode) -> Result<Prop, QueryAnalysisError> {
    let (_, descriptor) = descriptor_for(schema, join)?;
    if is_forward(schema, join)? {
        Ok(descriptor.source_col().clone())
    } else {
        let source_table = descriptor
            .source_col()
            .table()
            .expect("descriptor entries are namespaced");
        Ok(schema.id_prop(source_table))
    }
}

/// The minimum set of SQL properties the SELECT list must contain for one
/// query level: the table's PK, every leaf's SQL property, and the
/// join-resolution column of every join. Returned sorted.
pub fn columns_for(
    schema: &Schema,
    query: &[QueryNode],
) -> Result<BTreeSet<Prop>, QueryAnalysisError> {
    let table = table_for(schema, query)?;
    let mut columns = BTreeSet::new();
    columns.insert(schema.id_prop(&table));
    for node in query {
        match node {
            QueryNode::Prop(p) => {
                if !p.is_pk_sentinel() {
                    columns.insert(schema.graph_to_sql(p));
                }
            }
            QueryNode::Join(j) => {
                columns.insert(sqlprop_for_join(schema, j)?);
            }
        }
    }
    Ok(columns)
}
