//! Schema configuration loading.
//!
//! Schemas are plain values and are usually built in code through
//! [`SchemaBuilder`], but they can also be loaded from YAML or JSON:
//!
//! ```yaml
//! graph_to_sql:
//!   person/name: member/name
//! pks:
//!   account: id
//!   member: id
//! joins:
//!   account/members:
//!     path: [account/id, member/account_id]
//!     arity: to-many
//! driver: postgres
//! ```
//!
//! The three mapping keys are required; a configuration that omits one is
//! rejected at parse time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::SchemaError;
use super::model::{Driver, JoinArity, Schema, SchemaBuilder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub graph_to_sql: BTreeMap<String, String>,
    pub pks: BTreeMap<String, String>,
    pub joins: BTreeMap<String, JoinConfig>,
    #[serde(default)]
    pub driver: Driver,
    #[serde(default)]
    pub stable_child_order: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    pub path: Vec<String>,
    #[serde(default)]
    pub arity: JoinArity,
}

impl SchemaConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(raw).map_err(|e| SchemaError::ConfigParse {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(raw).map_err(|e| SchemaError::ConfigParse {
            message: e.to_string(),
        })
    }
}

impl Schema {
    pub fn from_config(config: SchemaConfig) -> Result<Schema, SchemaError> {
        let mut builder = SchemaBuilder::default()
            .driver(config.driver)
            .stable_child_order(config.stable_child_order);
        for (from, to) in &config.graph_to_sql {
            builder = builder.graph_to_sql(from, to);
        }
        for (table, column) in &config.pks {
            builder = builder.pk(table, column);
        }
        for (prop, join) in &config.joins {
            let path: Vec<&str> = join.path.iter().map(String::as_str).collect();
            builder = builder.join(prop, &path, join.arity);
        }
        builder.build()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Schema, SchemaError> {
        Schema::from_config(SchemaConfig::from_yaml_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Schema, SchemaError> {
        Schema::from_config(SchemaConfig::from_json_str(raw)?)
    }
}
