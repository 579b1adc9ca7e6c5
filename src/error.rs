//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation, not logged in)
//! - 3: Blocked by another editor (edit lease held elsewhere)
//! - 4: Operation failed (storage, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid credentials for {0}")]
    AuthenticationFailed(String),

    // Blocked (exit code 3)
    #[error("Editing conflict: task is being edited by {holder}")]
    EditConflict { holder: String },

    // Operation failures (exit code 4)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Shorthand for a title validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::NotAuthenticated
            | Error::AuthenticationFailed(_) => exit_codes::USER_ERROR,

            Error::EditConflict { .. } => exit_codes::BLOCKED,

            Error::StorageUnavailable(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output, when the variant carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation { field, message } => Some(serde_json::json!({
                "field": field,
                "message": message,
            })),
            Error::EditConflict { holder } => Some(serde_json::json!({
                "holder": holder,
                "choices": ["merge", "overwrite"],
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_categories() {
        assert_eq!(
            Error::validation("title", "Title is required").exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(Error::NotAuthenticated.exit_code(), exit_codes::USER_ERROR);
        assert_eq!(
            Error::EditConflict {
                holder: "Bob Smith".to_string()
            }
            .exit_code(),
            exit_codes::BLOCKED
        );
        assert_eq!(
            Error::StorageUnavailable(PathBuf::from("/nope")).exit_code(),
            exit_codes::OPERATION_FAILED
        );
    }

    #[test]
    fn validation_message_names_field() {
        let err = Error::validation("title", "Title cannot match column names");
        assert_eq!(err.to_string(), "title: Title cannot match column names");
        let details = err.details().unwrap();
        assert_eq!(details["field"], "title");
    }
}
