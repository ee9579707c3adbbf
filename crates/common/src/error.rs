use thiserror::Error;

/// Common error types for the vanir node
#[derive(Error, Debug)]
pub enum VanirError {
    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VanirError>;

impl From<serde_json::Error> for VanirError {
    fn from(err: serde_json::Error) -> Self {
        VanirError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for VanirError {
    fn from(err: config::ConfigError) -> Self {
        VanirError::Config(err.to_string())
    }
}
