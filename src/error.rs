//! Error types for schema flattening

use thiserror::Error;

/// Result type for flattening operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema shapes the flattener refuses to normalize
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedSchema {
    #[error("tuple array at {origin}")]
    TupleArray { origin: String },

    #[error("entity '{entity}' is not identifiable, cannot relate {origin} to it")]
    NotIdentifiable { entity: String, origin: String },

    #[error("'{target}' has a relation to itself (reached from {origin})")]
    RelationToItself { target: String, origin: String },
}

/// Flattener errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unsupported schema: {0}")]
    Unsupported(#[from] UnsupportedSchema),

    #[error("Field '{field}' already mapped on entity '{entity}'")]
    FieldAlreadyMapped { entity: String, field: String },

    #[error("'{selector}' selector already mapped")]
    SelectorAlreadyMapped { selector: String },

    #[error("Invalid selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unresolved $ref '{reference}' at {origin}")]
    UnresolvedReference { reference: String, origin: String },

    #[error("Entity name collision: '{name}' is produced by both {existing} and {origin}")]
    EntityNameCollision {
        name: String,
        existing: String,
        origin: String,
    },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Generated JSON Schema does not compile: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// The unsupported-shape kind, if this is a rejection of the input
    pub fn unsupported(&self) -> Option<&UnsupportedSchema> {
        match self {
            SchemaError::Unsupported(kind) => Some(kind),
            _ => None,
        }
    }
}
