//! Error types for LitGraph
//!
//! Provides a single error enum for every crate with:
//! - Distinct variants for parameter, integrity and infrastructure failures
//! - Machine-readable error codes for hosting layers
//! - Caller/server classification for logging

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parameter errors (1xxx)
    InvalidParameter,

    // Integrity errors (4xxx)
    DataIntegrity,
    PaperNotFound,
    AuthorNotFound,
    SnapshotNotFound,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidParameter => 1001,

            ErrorCode::DataIntegrity => 4001,
            ErrorCode::PaperNotFound => 4002,
            ErrorCode::AuthorNotFound => 4003,
            ErrorCode::SnapshotNotFound => 4004,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Parameter errors
    #[error("Invalid parameter `{parameter}`: {message}")]
    InvalidParameter { parameter: String, message: String },

    // Integrity errors
    #[error("Data integrity violation on {entity} {id}: {message}")]
    DataIntegrity {
        entity: String,
        id: String,
        message: String,
    },

    #[error("Paper not found in snapshot: {id}")]
    PaperNotFound { id: String },

    #[error("Author not found in snapshot: {id}")]
    AuthorNotFound { id: String },

    #[error("Snapshot not found: {version}")]
    SnapshotNotFound { version: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a parameter outside its documented domain
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a dangling reference inside a snapshot
    pub fn integrity(
        entity: impl Into<String>,
        id: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        AppError::DataIntegrity {
            entity: entity.into(),
            id: id.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            AppError::DataIntegrity { .. } => ErrorCode::DataIntegrity,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::AuthorNotFound { .. } => ErrorCode::AuthorNotFound,
            AppError::SnapshotNotFound { .. } => ErrorCode::SnapshotNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Integrity errors cover every "referenced entity is absent" failure
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            AppError::DataIntegrity { .. }
                | AppError::PaperNotFound { .. }
                | AppError::AuthorNotFound { .. }
                | AppError::SnapshotNotFound { .. }
        )
    }

    /// Check if the caller can fix this error by changing the request
    pub fn is_caller_error(&self) -> bool {
        matches!(self, AppError::InvalidParameter { .. }) || self.is_integrity_error()
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        !self.is_caller_error()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        // Report the first offending field; the message lists all of them.
        let parameter = errs
            .field_errors()
            .keys()
            .next()
            .map(|field| field.to_string())
            .unwrap_or_else(|| "request".to_string());
        AppError::InvalidParameter {
            parameter,
            message: errs.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("analysis task failed: {}", err),
        }
    }
}
