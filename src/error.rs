//! Error types for taskgraph
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown task, bad arguments, bad config)
//! - 4: Operation failed (corrupt store, I/O, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskgraph CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Unknown task id: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("Corrupt task store {path}: {message}")]
    StorageCorruption { path: PathBuf, message: String },

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_) | Error::InvalidArgument(_) | Error::InvalidConfig(_) => {
                exit_codes::USER_ERROR
            }

            Error::StorageCorruption { .. }
            | Error::LockFailed(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable identifier, reported to tool callers
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidConfig(_) => "invalid_config",
            Error::StorageCorruption { .. } => "storage_corruption",
            Error::LockFailed(_) => "lock_failed",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::TomlParse(_) => "toml_parse_error",
        }
    }

    /// Structured fields for errors that carry more than a message
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::StorageCorruption { path, message } => Some(serde_json::json!({
                "path": path.to_string_lossy(),
                "message": message,
            })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            _ => None,
        }
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub kind: &'static str,
    pub message: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            kind: err.kind(),
            message: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
