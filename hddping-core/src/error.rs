//! Error types for the hddping system
//!
//! Nothing in hddping is fatal: these errors travel between internal
//! components and are logged or folded into defaults at the edges.

use thiserror::Error;

/// Core error type for hddping operations
#[derive(Error, Debug)]
pub enum HddPingError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Drive is not among the attached, eligible volumes
    #[error("Drive not found: {0}")]
    DriveNotFound(String),

    /// Settings file written by an incompatible version
    #[error("Unsupported settings version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The control loop has stopped and no longer accepts commands
    #[error("Control loop is not running")]
    ControlClosed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for hddping operations
pub type Result<T> = std::result::Result<T, HddPingError>;

impl From<serde_json::Error> for HddPingError {
    fn from(err: serde_json::Error) -> Self {
        HddPingError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HddPingError {
    fn from(err: toml::de::Error) -> Self {
        HddPingError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for HddPingError {
    fn from(err: toml::ser::Error) -> Self {
        HddPingError::Serialization(err.to_string())
    }
}
