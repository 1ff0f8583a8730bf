use crate::block::BlockKind;
use thiserror::Error;

fn record_suffix(record: &Option<String>) -> String {
    match record {
        Some(id) => format!(" (record '{}')", id),
        None => String::new(),
    }
}

/// Errors raised while rewriting a single block tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    #[error(
        "Block '{name}' at path '{path}' is not defined in the schema{}",
        record_suffix(.record)
    )]
    SchemaMismatch {
        name: String,
        path: String,
        record: Option<String>,
    },

    #[error("Block at path '{path}' is not a container, its children cannot be rewritten")]
    NotAContainer { path: String },

    #[error("Operation '{operation}' cannot rewrite the children of the {kind} block at path '{path}'")]
    IncompatibleOperation {
        operation: String,
        kind: BlockKind,
        path: String,
    },

    #[error(
        "Malformed block data at path '{path}': expected {expected}{}",
        record_suffix(.record)
    )]
    MalformedBlock {
        path: String,
        expected: String,
        record: Option<String>,
    },

    #[error("Failed to parse block data JSON: {0}")]
    JsonParseError(String),
}

impl MigrationError {
    /// Attaches the identifier of the record whose data triggered the error.
    pub fn with_record(self, id: &str) -> Self {
        match self {
            MigrationError::SchemaMismatch { name, path, .. } => MigrationError::SchemaMismatch {
                name,
                path,
                record: Some(id.to_string()),
            },
            MigrationError::MalformedBlock { path, expected, .. } => {
                MigrationError::MalformedBlock {
                    path,
                    expected,
                    record: Some(id.to_string()),
                }
            }
            other => other,
        }
    }
}

/// Errors raised by a decision source while it is being consulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error("Failed to read an answer: {0}")]
    Io(String),

    #[error("The decision was aborted before an answer was given")]
    Aborted,

    #[error("No recorded answer for question: {0}")]
    Unanswered(String),
}

/// Errors that stop a change detection run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

/// Errors that can occur when loading or converting a schema description.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to parse schema JSON: {0}")]
    JsonParseError(String),

    #[error("Could not read schema file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid schema description: {0}")]
    Conversion(String),
}

/// Errors for loading, saving and applying migration plans.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Failed to (de)serialize migration plan: {0}")]
    JsonParseError(String),

    #[error("Could not access plan file '{path}': {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Errors for similarity configuration files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse similarity config JSON: {0}")]
    JsonParseError(String),

    #[error("Could not read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid similarity config: {0}")]
    Invalid(String),
}
