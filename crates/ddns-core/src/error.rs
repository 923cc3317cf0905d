//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.
//! Provider crates translate their API failures into these variants at the
//! provider boundary, so the reconciler never inspects raw responses.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file missing, unparseable, or missing a required field
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure, timeout, or unreadable response
    #[error("Network error: {0}")]
    Network(String),

    /// Zone or record does not exist under the given name
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider rejected an update because the value is already stored
    #[error("Duplicate value ({provider}): record already holds {value}")]
    DuplicateValue {
        /// Provider name
        provider: String,
        /// The value that was submitted
        value: String,
    },

    /// Any other non-success provider response
    #[error("Provider error ({provider}){}: {message}", status_suffix(.status))]
    Provider {
        /// Provider name
        provider: String,
        /// HTTP status code, when the failure came with one
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" [HTTP {s}]")).unwrap_or_default()
}

/// Coarse classification of an [`Error`], used to decide exit behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Network,
    NotFound,
    DuplicateValue,
    Provider,
    Other,
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a duplicate-value error
    pub fn duplicate_value(provider: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DuplicateValue {
            provider: provider.into(),
            value: value.into(),
        }
    }

    /// Create a provider error without an HTTP status
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a provider error carrying the HTTP status code
    pub fn provider_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Network(_) => ErrorKind::Network,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateValue { .. } => ErrorKind::DuplicateValue,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this error is the benign "value already stored" signal
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateValue { .. })
    }
}
