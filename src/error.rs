//! Error types for the profit advisor service.
//!
//! Validation rejections are not errors — they are ordinary
//! `Transition::Rejected` outcomes. The variants here are caller errors
//! and infrastructure failures.

use crate::funnel::StepId;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Funnel error: {0}")]
    Funnel(#[from] FunnelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lead-store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Lead not found: id {0}")]
    NotFound(i64),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<libsql::Error> for DatabaseError {
    fn from(e: libsql::Error) -> Self {
        DatabaseError::Query(e.to_string())
    }
}

/// Caller errors at the state-machine boundary.
///
/// These indicate a bug in the transport layer or a doctored client
/// payload, never ordinary user input.
#[derive(Debug, thiserror::Error)]
pub enum FunnelError {
    #[error("Step {0} is terminal; advance must not be called for it")]
    TerminalStep(StepId),

    #[error("Session is missing required field {0}; a prior step was skipped")]
    MissingField(&'static str),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
