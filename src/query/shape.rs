//! Query shapes.
//!
//! A query is an ordered sequence of nodes: plain properties (leaves) and
//! joins carrying a sub-query. A join's sub-query is either a nested shape
//! or a recursion marker - the unbounded sentinel or a remaining-depth
//! counter.

use std::fmt;

use crate::schema::property::Prop;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Prop(Prop),
    Join(JoinNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    pub prop: Prop,
    pub query: SubQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubQuery {
    Shape(Vec<QueryNode>),
    Recurse(Recursion),
}

/// Recursion marker for self-referencing joins: unbounded (terminated by
/// cycle detection) or a maximum remaining depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recursion {
    Unbounded,
    Remaining(i64),
}

impl QueryNode {
    pub fn prop(prop: impl Into<Prop>) -> Self {
        QueryNode::Prop(prop.into())
    }

    pub fn join(prop: impl Into<Prop>, query: Vec<QueryNode>) -> Self {
        QueryNode::Join(JoinNode {
            prop: prop.into(),
            query: SubQuery::Shape(query),
        })
    }

    pub fn recursive(prop: impl Into<Prop>, recursion: Recursion) -> Self {
        QueryNode::Join(JoinNode {
            prop: prop.into(),
            query: SubQuery::Recurse(recursion),
        })
    }
}

/// Render a query shape for error messages and logs.
pub fn render(query: &[QueryNode]) -> String {
    let parts: Vec<String> = query.iter().map(|node| node.to_string()).collect();
    format!("[{}]", parts.join(" "))
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Prop(p) => write!(f, "{}", p),
            QueryNode::Join(j) => write!(f, "{{{} {}}}", j.prop, j.query),
        }
    }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubQuery::Shape(query) => f.write_str(&render(query)),
            SubQuery::Recurse(Recursion::Unbounded) => f.write_str("..."),
            SubQuery::Recurse(Recursion::Remaining(n)) => write!(f, "{}", n),
        }
    }
}
