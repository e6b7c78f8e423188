// src/utils/errors.rs
//! Error types for the courier core
//!
//! None of these escape the public recording surface: the core logs and
//! degrades rather than failing the host (see the crate docs). They exist
//! for the fallible internals (client construction, serialization,
//! compression, delivery).

use thiserror::Error;

/// Courier errors
#[derive(Debug, Error)]
pub enum CourierError {
    /// HTTP client could not be constructed
    #[error("client build failed: {0}")]
    ClientBuild(String),

    /// Envelope serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Batch compression failed
    #[error("compression failed: {0}")]
    Compression(String),

    /// Delivery attempt failed
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CourierError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }
}
