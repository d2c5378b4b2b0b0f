use thiserror::Error;

use crate::query::errors::QueryAnalysisError;
use crate::schema::errors::SchemaError;
use crate::sql_generator::errors::SqlGenerationError;

use super::database::DbError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Analysis(#[from] QueryAnalysisError),
    #[error(transparent)]
    SqlGeneration(#[from] SqlGenerationError),
    #[error("database error: {0}")]
    Database(#[source] DbError),
    #[error("recursion exceeded the ceiling of {ceiling} levels")]
    RecursionLimit { ceiling: u32 },
    #[error("placeholder `{name}` is defined more than once")]
    DuplicatePlaceholder { name: String },
    #[error("next-id query for table `{table}` returned no usable value")]
    NextIdUnavailable { table: String },
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        EngineError::Database(err)
    }
}
