pub mod postgres;

pub use postgres::PostgresDatabase;
