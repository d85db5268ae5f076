//! Error types for CiteBuddy
//!
//! Provides a single error enum shared by the repository clients and the
//! recommender core:
//! - Distinct variants for argument, resolution and lookup failures
//! - Machine-readable error codes
//! - Process exit code mapping for the CLI

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidArgument,

    // Resource errors (4xxx)
    ArticleNotFound,

    // Upstream errors (8xxx)
    LookupFailed,
    LookupTimeout,
    MalformedResponse,
    RateLimited,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidArgument => 1001,

            ErrorCode::ArticleNotFound => 4002,

            ErrorCode::LookupFailed => 8001,
            ErrorCode::LookupTimeout => 8002,
            ErrorCode::MalformedResponse => 8003,
            ErrorCode::RateLimited => 8004,
            ErrorCode::UpstreamError => 8005,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    // Resolution errors
    #[error("Could not find article with identifier {id}")]
    ArticleNotFound { id: String },

    // Lookup errors (collaborator-originated)
    #[error("Lookup of {id} failed: {message}")]
    LookupFailed { id: String, message: String },

    #[error("Lookup of {id} timed out after {timeout_ms}ms")]
    LookupTimeout { id: String, timeout_ms: u64 },

    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse { source_name: String, message: String },

    #[error("Rate limit exceeded for {source_name}")]
    RateLimited { source_name: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an argument validation failure
    pub fn invalid_argument(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidArgument {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            AppError::ArticleNotFound { .. } => ErrorCode::ArticleNotFound,
            AppError::LookupFailed { .. } => ErrorCode::LookupFailed,
            AppError::LookupTimeout { .. } => ErrorCode::LookupTimeout,
            AppError::MalformedResponse { .. } => ErrorCode::MalformedResponse,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) | AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this error came from fetching a downstream record.
    ///
    /// These are the only errors a skip-on-failure policy may swallow;
    /// argument and configuration errors always propagate.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            AppError::ArticleNotFound { .. }
                | AppError::LookupFailed { .. }
                | AppError::LookupTimeout { .. }
                | AppError::MalformedResponse { .. }
                | AppError::RateLimited { .. }
                | AppError::HttpClient(_)
        )
    }

    /// Process exit status for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidArgument { .. } => 2,
            AppError::ArticleNotFound { .. } => 3,
            AppError::LookupFailed { .. }
            | AppError::LookupTimeout { .. }
            | AppError::MalformedResponse { .. }
            | AppError::RateLimited { .. }
            | AppError::HttpClient(_) => 4,
            AppError::Configuration { .. } => 78,
            AppError::Serialization(_) | AppError::Io(_) | AppError::Other(_) => 1,
        }
    }
}
