// src/error.rs

//! Unified error handling for the harvester application.
//!
//! `AppError` covers failures that abort a run (configuration, storage,
//! invalid selectors). Transport and extraction failures during collection
//! are represented by `FetchError` and `ExtractError` instead: they are
//! skippable per unit of work and never fatal to the run.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Harvest orchestration error
    #[error("Harvest error for {context}: {message}")]
    Harvest { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a harvest error with context.
    pub fn harvest(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Harvest {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Transport failure for a single outbound request.
///
/// Always local-recoverable: the offending page, item, or fixed URL is
/// skipped and the run continues.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// No extraction strategy produced usable content for a document.
///
/// The item is dropped; a record with empty text is never emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no extraction rule produced enough content")]
    NoContent,
}
