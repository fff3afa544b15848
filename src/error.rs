//! Error types for colquery
//!
//! Provides a unified error type for all operations.
//!
//! Only [`ConnectorError::PatternCompile`] and [`ConnectorError::Config`]
//! are raised at init time and are fatal to the connector. Everything else
//! is scoped to a single request.

use thiserror::Error;

use crate::bridge::OperationKind;

/// Result type alias using ConnectorError
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Status returned by a successful init
pub const STATUS_OK: i32 = 0;

/// Status returned by a fatal init failure
pub const STATUS_FATAL: i32 = -1;

/// Unified error type for colquery operations
#[derive(Debug, Error)]
pub enum ConnectorError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("Pattern compile error: {0}")]
    PatternCompile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup error: {0}")]
    Logging(String),

    // -------------------------------------------------------------------------
    // Parse Errors
    // -------------------------------------------------------------------------
    #[error("Command does not match the address grammar: {0:?}")]
    NoMatch(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Client create error: {0}")]
    ClientCreate(String),

    #[error("{kind} could not be issued: {reason}")]
    IssueFailed { kind: OperationKind, reason: String },

    // -------------------------------------------------------------------------
    // Async Completion Errors
    // -------------------------------------------------------------------------
    #[error("{kind} failed with code {code}")]
    OperationFailed { kind: OperationKind, code: i32 },

    #[error("{kind} callback was dropped without completing")]
    OperationAbandoned { kind: OperationKind },

    #[error("{kind} timed out waiting for completion")]
    Timeout { kind: OperationKind },

    #[error("{kind} wait was cancelled")]
    Cancelled { kind: OperationKind },

    #[error("{kind} completed without a result")]
    EmptyResult { kind: OperationKind },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ConnectorError {
    /// Whether the error is fatal to the whole connector
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PatternCompile(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Map an init result to its status code (0 = ok, -1 = fatal)
pub fn status_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(_) => STATUS_FATAL,
    }
}
