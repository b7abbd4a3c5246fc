//! Error types for card service operations.

use thiserror::Error;

/// Result type for card service operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the card service.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Add dispatched but unconfirmed: {0}")]
    Unconfirmed(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if this is a failure of the carrying mechanism itself, the
    /// kind the fallback chain may substitute another primitive for.
    /// Backend refusals and decode mismatches are not: every primitive
    /// would reproduce them.
    #[inline]
    #[must_use]
    pub fn is_transport_kind(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout(_))
    }

    /// Check if the underlying request may still have succeeded
    /// server-side even though this call failed.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Unconfirmed(_))
    }
}
