//! The traversal driver.
//!
//! Walks the query tree one level at a time: emit the level's SQL, run it,
//! derive each join's child root set from the parent rows, recurse, then
//! assemble. Recursive joins are gated by a remaining-depth counter or, for
//! the unbounded sentinel, by a per-branch visited set of `(join, id)`
//! pairs - plus a hard ceiling so a broken schema cannot spin forever.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::query::analyzer::{descriptor_for, table_for};
use crate::query::shape::{JoinNode, QueryNode, Recursion, SubQuery};
use crate::schema::model::Schema;
use crate::schema::property::Prop;
use crate::sql_generator::emit::query_for;
use crate::sql_generator::filters::Filters;

use super::assemble::{assemble_level, group_children, AssembledRow, JoinChildren};
use super::database::Database;
use super::errors::EngineError;

/// Default hard bound on traversal depth. Cycle detection terminates
/// sentinel recursion on its own; the ceiling catches schemas where it
/// cannot (for instance a join whose rows keep producing fresh ids).
pub const RECURSION_CEILING: u32 = 1000;

/// Run a graph query rooted at `root_ids`.
///
/// `entry` is the property the root set filters on: an id property when
/// called from the outside, a join property when the engine recurses. The
/// result list is ordered by the ascending IN-list order of the root set.
/// An empty root set returns empty without touching the database.
pub fn run_query(
    db: &mut dyn Database,
    schema: &Schema,
    entry: &Prop,
    query: &[QueryNode],
    root_ids: &[i64],
    filters: &Filters,
) -> Result<Vec<Value>, EngineError> {
    run_query_bounded(db, schema, entry, query, root_ids, filters, RECURSION_CEILING)
}

/// [`run_query`] with an explicit recursion ceiling.
pub fn run_query_bounded(
    db: &mut dyn Database,
    schema: &Schema,
    entry: &Prop,
    query: &[QueryNode],
    root_ids: &[i64],
    filters: &Filters,
    ceiling: u32,
) -> Result<Vec<Value>, EngineError> {
    let roots: BTreeSet<i64> = root_ids.iter().copied().collect();
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let mut ctx = Traversal {
        db,
        schema,
        filters,
        ceiling,
    };
    let assembled = ctx.run_level(Some(entry), query, &roots, 1, &HashSet::new())?;

    let mut by_key: HashMap<i64, Vec<Value>> = HashMap::new();
    for row in assembled {
        by_key.entry(row.group_key).or_default().push(row.value);
    }
    let mut out = Vec::new();
    for id in &roots {
        if let Some(values) = by_key.remove(id) {
            out.extend(values);
        }
    }
    Ok(out)
}

struct Traversal<'a> {
    db: &'a mut dyn Database,
    schema: &'a Schema,
    filters: &'a Filters,
    ceiling: u32,
}

type Visited = HashSet<(Prop, i64)>;

impl<'a> Traversal<'a> {
    fn run_level(
        &mut self,
        incoming: Option<&Prop>,
        query: &[QueryNode],
        roots: &BTreeSet<i64>,
        depth: u32,
        visited: &Visited,
    ) -> Result<Vec<AssembledRow>, EngineError> {
        if roots.is_empty() {
            return Ok(Vec::new());
        }
        if depth > self.ceiling {
            return Err(EngineError::RecursionLimit {
                ceiling: self.ceiling,
            });
        }
        let Some(stmt) = query_for(self.schema, incoming, query, roots, self.filters, depth)?
        else {
            return Ok(Vec::new());
        };
        log::debug!("depth {}: {}", depth, stmt.sql);
        let rows = self.db.query(&stmt.sql, &stmt.params)?;

        let table = table_for(self.schema, query)?;
        let pk_alias = self.schema.id_prop(&table).to_string();
        let group_alias = match incoming {
            None => pk_alias.clone(),
            Some(prop) => {
                let sql_prop = self.schema.graph_to_sql(prop);
                match self.schema.join(&sql_prop) {
                    Some(descriptor) => descriptor.filter_col().to_string(),
                    None => sql_prop.to_string(),
                }
            }
        };

        let mut children = Vec::new();
        for node in query {
            let QueryNode::Join(join) = node else {
                continue;
            };
            children.push(self.run_join(join, query, &rows, depth, visited)?);
        }

        Ok(assemble_level(
            self.schema,
            query,
            &rows,
            &pk_alias,
            &group_alias,
            &children,
        ))
    }

    fn run_join(
        &mut self,
        join: &JoinNode,
        level_query: &[QueryNode],
        rows: &[super::database::Row],
        depth: u32,
        visited: &Visited,
    ) -> Result<JoinChildren, EngineError> {
        let (sql_prop, descriptor) = descriptor_for(self.schema, join)?;
        let arity = descriptor.arity;
        let source_alias = descriptor.source_col().to_string();
        let mut child_roots: BTreeSet<i64> = rows
            .iter()
            .filter_map(|row| row.get(&source_alias).and_then(Value::as_i64))
            .collect();

        let skipped = JoinChildren {
            prop: join.prop.to_string(),
            source_alias: source_alias.clone(),
            arity,
            skipped: true,
            grouped: HashMap::new(),
        };

        let (child_query, child_visited) = match &join.query {
            SubQuery::Shape(sub) => (sub.clone(), visited.clone()),
            SubQuery::Recurse(Recursion::Remaining(n)) => {
                if *n <= 0 {
                    return Ok(skipped);
                }
                (
                    decrement_recursion(level_query, &join.prop, *n),
                    visited.clone(),
                )
            }
            SubQuery::Recurse(Recursion::Unbounded) => {
                child_roots.retain(|id| !visited.contains(&(sql_prop.clone(), *id)));
                if child_roots.is_empty() {
                    return Ok(skipped);
                }
                let mut extended = visited.clone();
                for id in &child_roots {
                    extended.insert((sql_prop.clone(), *id));
                }
                (level_query.to_vec(), extended)
            }
        };

        let assembled = self.run_level(
            Some(&join.prop),
            &child_query,
            &child_roots,
            depth + 1,
            &child_visited,
        )?;
        Ok(JoinChildren {
            prop: join.prop.to_string(),
            source_alias,
            arity,
            skipped: false,
            grouped: group_children(assembled, self.schema.stable_child_order()),
        })
    }
}

/// The recursion target of an integer-gated join is the enclosing query
/// with that join's counter decremented.
fn decrement_recursion(query: &[QueryNode], target: &Prop, remaining: i64) -> Vec<QueryNode> {
    query
        .iter()
        .map(|node| match node {
            QueryNode::Join(j)
                if &j.prop == target
                    && matches!(j.query, SubQuery::Recurse(Recursion::Remaining(_))) =>
            {
                QueryNode::Join(JoinNode {
                    prop: j.prop.clone(),
                    query: SubQuery::Recurse(Recursion::Remaining(remaining - 1)),
                })
            }
            other => other.clone(),
        })
        .collect()
}
