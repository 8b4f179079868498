//! Error types for mobile_mpc

use thiserror::Error;

/// Main error type for the MPC core
#[derive(Debug, Error)]
pub enum MpcError {
    /// Invalid parameter (configuration value or input)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input length does not match the configured horizon
    #[error("Shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Configuration could not be decoded or encoded
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl From<toml::de::Error> for MpcError {
    fn from(e: toml::de::Error) -> Self {
        MpcError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for MpcError {
    fn from(e: toml::ser::Error) -> Self {
        MpcError::Config(e.to_string())
    }
}

/// Result type alias for MPC operations
pub type MpcResult<T> = Result<T, MpcError>;
