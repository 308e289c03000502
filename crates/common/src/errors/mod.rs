//! Error types for PaperGraph
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Retryable/fatal classification at the transport boundary
//! - Machine-readable error codes for the CLI exit path

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    ConfigurationError,
    InvalidSource,
    InvalidSpine,
    NoSeeds,

    // Transport errors (2xxx)
    TransportError,
    Timeout,
    RateLimited,

    // Source errors (3xxx)
    SourceError,
    SearchFailed,

    // Store errors (4xxx)
    StoreError,
    MigrationError,

    // Cache errors (5xxx)
    CacheError,

    // Internal errors (9xxx)
    InternalError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Configuration (1xxx)
            ErrorCode::ConfigurationError => 1001,
            ErrorCode::InvalidSource => 1002,
            ErrorCode::InvalidSpine => 1003,
            ErrorCode::NoSeeds => 1004,

            // Transport (2xxx)
            ErrorCode::TransportError => 2001,
            ErrorCode::Timeout => 2002,
            ErrorCode::RateLimited => 2003,

            // Sources (3xxx)
            ErrorCode::SourceError => 3001,
            ErrorCode::SearchFailed => 3002,

            // Store (4xxx)
            ErrorCode::StoreError => 4001,
            ErrorCode::MigrationError => 4002,

            // Cache (5xxx)
            ErrorCode::CacheError => 5001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::SerializationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unsupported source '{source_name}': expected 'openalex' or 's2'")]
    InvalidSource { source_name: String },

    #[error("Unsupported spine '{spine}'")]
    InvalidSpine { spine: String },

    #[error("No seed papers found; provide --topic, --paper, or --doi")]
    NoSeeds,

    // Transport errors
    #[error("Transport error ({status:?}): {message}")]
    Transport {
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // Source errors
    #[error("Source '{source_name}' error: {message}")]
    Source { source_name: String, message: String },

    #[error("Search against '{source_name}' failed: {message}")]
    SearchFailed { source_name: String, message: String },

    // Store errors
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Schema migration failed: {message}")]
    Migration { message: String },

    // Cache errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::InvalidSource { .. } => ErrorCode::InvalidSource,
            AppError::InvalidSpine { .. } => ErrorCode::InvalidSpine,
            AppError::NoSeeds => ErrorCode::NoSeeds,
            AppError::Transport { status, .. } if *status == Some(429) => ErrorCode::RateLimited,
            AppError::Transport { .. } => ErrorCode::TransportError,
            AppError::Timeout { .. } => ErrorCode::Timeout,
            AppError::Source { .. } => ErrorCode::SourceError,
            AppError::SearchFailed { .. } => ErrorCode::SearchFailed,
            AppError::Store(_) => ErrorCode::StoreError,
            AppError::Migration { .. } => ErrorCode::MigrationError,
            AppError::Cache { .. } => ErrorCode::CacheError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::InternalError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the transport retry loop may re-issue the request.
    ///
    /// Retryable: HTTP 429/500/502/503/504, connect/reset failures, and
    /// timeouts. Everything else is fatal and propagates.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Transport { retryable, .. } => *retryable,
            AppError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Build a transport error from an HTTP status and response payload
    pub fn from_status(status: u16, payload: String) -> Self {
        let retryable = matches!(status, 429 | 500 | 502 | 503 | 504);
        AppError::Transport {
            status: Some(status),
            message: payload,
            retryable,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Timeout { timeout_secs: 0 };
        }
        // Connection-level failures (refused, reset, DNS) are transient
        let retryable = err.is_connect() || err.is_request();
        AppError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            retryable,
        }
    }
}
