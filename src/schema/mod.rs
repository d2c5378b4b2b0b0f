pub mod config;
pub mod errors;
pub mod model;
pub mod property;

pub use config::SchemaConfig;
pub use errors::SchemaError;
pub use model::{Driver, JoinArity, JoinDescriptor, Schema, SchemaBuilder};
pub use property::Prop;
