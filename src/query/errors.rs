use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryAnalysisError {
    #[error("Could not determine a single table from the subquery {query}")]
    AmbiguousTable { query: String },
    #[error("no join is registered in the schema for `{prop}`")]
    UnknownJoin { prop: String },
}
