pub mod emit;
pub mod errors;
pub mod filters;

pub use emit::{query_for, SqlStatement};
pub use errors::SqlGenerationError;
pub use filters::{filter_params_to_filters, FilterClause, FilterRule, Filters};
