pub mod analyzer;
pub mod errors;
pub mod shape;

pub use analyzer::{columns_for, is_forward, is_reverse, sqlprop_for_join, table_for};
pub use errors::QueryAnalysisError;
pub use shape::{JoinNode, QueryNode, Recursion, SubQuery};
