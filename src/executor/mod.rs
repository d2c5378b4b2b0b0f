pub mod assemble;
pub mod database;
pub mod errors;
pub mod next_id;
pub mod traversal;

pub use database::{Database, DbError, Row};
pub use errors::EngineError;
pub use next_id::next_id;
pub use traversal::{run_query, run_query_bounded, RECURSION_CEILING};
