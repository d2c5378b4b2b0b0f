use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("join `{join}` has a descriptor of length {len}; expected 2 (direct) or 4 (through a link table)")]
    BadDescriptorLength { join: String, len: usize },
    #[error("join `{join}` is not namespaced; join properties must be of the form `table/column`")]
    UnqualifiedJoin { join: String },
    #[error("descriptor entry `{entry}` of join `{join}` is not namespaced")]
    UnqualifiedDescriptorEntry { join: String, entry: String },
    #[error("descriptor of join `{join}` starts on table `{found}`; expected the join's source table `{expected}`")]
    DescriptorSourceMismatch {
        join: String,
        expected: String,
        found: String,
    },
    #[error("graph-to-sql entry `{entry}` is not namespaced")]
    UnqualifiedMapping { entry: String },
    #[error("unknown driver `{driver}`; expected postgres, mysql, h2 or default")]
    UnknownDriver { driver: String },
    #[error("failed to parse schema configuration: {message}")]
    ConfigParse { message: String },
}
