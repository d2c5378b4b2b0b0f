use thiserror::Error;

use crate::query::errors::QueryAnalysisError;

use super::filters::FilterRule;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGenerationError {
    #[error(transparent)]
    Analysis(#[from] QueryAnalysisError),
    #[error("unknown filter operation for `{property}`: {rule:?}")]
    UnknownFilterOperation { property: String, rule: FilterRule },
    #[error("filter property `{property}` does not resolve to a table")]
    UnqualifiedFilterProperty { property: String },
    #[error("join `{join}` targets table `{expected}` but its subquery resolves to `{found}`")]
    JoinTargetMismatch {
        join: String,
        expected: String,
        found: String,
    },
    #[error("entry column `{prop}` is not on table `{table}`")]
    EntryColumnMismatch { prop: String, table: String },
}
