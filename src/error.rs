//! Error types for the classroom vote library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation called in the wrong order (e.g. export before counting)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed line in a normalized annotation file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The external pose model failed for a region
    #[error("Pose source error: {0}")]
    PoseSource(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
