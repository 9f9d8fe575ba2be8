//! Common error types for Limn.

use thiserror::Error;

/// Result type alias using Limn's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Limn operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Signaling exchange failed (transport, status or content type)
    #[error("signaling error: {0}")]
    Signaling(String),

    /// Media capture failed
    #[error("capture error: {0}")]
    Capture(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a serialization error from any displayable type.
    pub fn serialization(msg: impl std::fmt::Display) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Create a signaling error from any displayable type.
    pub fn signaling(msg: impl std::fmt::Display) -> Self {
        Self::Signaling(msg.to_string())
    }

    /// Create a capture error from any displayable type.
    pub fn capture(msg: impl std::fmt::Display) -> Self {
        Self::Capture(msg.to_string())
    }

    /// Create an internal error from any displayable type.
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }
}
