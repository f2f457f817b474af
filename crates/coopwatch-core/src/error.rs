//! Error types for coopwatch-core.

use thiserror::Error;

/// Errors that can occur when talking to the real-time store.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A record could not be serialized into the store tree.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A subscription is already active for the logical path.
    ///
    /// The store enforces at most one live listener per path; drop or close
    /// the existing subscription before subscribing again.
    #[error("a subscription is already active for path '{path}'")]
    ListenerActive {
        /// The contested logical path.
        path: String,
    },

    /// An equipment operation referenced a unit that is not in the store.
    #[error("equipment unit not found: {0}")]
    UnitNotFound(String),

    /// A stored record had an unexpected shape.
    #[error("invalid record at '{path}': {message}")]
    InvalidRecord {
        /// Path of the offending record.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an invalid-record error.
    pub fn invalid_record(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using coopwatch-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
