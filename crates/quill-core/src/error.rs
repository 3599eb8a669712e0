//! Error types for the Quill market-making engine.

use thiserror::Error;

/// Core error type for the engine.
///
/// Hot-path operations never return these for flow control; they return
/// sentinels (`Option`, `bool`, rejected decisions). Errors surface at
/// initialization and at the configuration boundary.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid Hawkes kernel parameters
    #[error("Invalid kernel parameters: {0}")]
    InvalidKernel(String),

    /// Model weight or topology problem
    #[error("Model error: {0}")]
    ModelError(String),

    /// Risk limit exceeded
    #[error("Risk limit exceeded: {0}")]
    RiskLimitExceeded(String),

    /// Venue not found in the registry
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),

    /// Invalid venue identifier
    #[error("Invalid venue id: {0}")]
    InvalidVenueId(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("weights must sum to 1".to_string());
        assert_eq!(err.to_string(), "Configuration error: weights must sum to 1");
    }

    #[test]
    fn test_unknown_venue_display() {
        let err = Error::UnknownVenue("KRAKEN".to_string());
        assert!(err.to_string().contains("KRAKEN"));
    }
}
