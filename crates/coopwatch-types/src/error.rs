//! Error types for parsing store records.

use thiserror::Error;

/// Errors that can occur when parsing record fields from their string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Unknown equipment kind.
    #[error("unknown equipment kind: {0}")]
    UnknownKind(String),

    /// Unknown equipment status.
    #[error("unknown equipment status: {0}")]
    UnknownStatus(String),

    /// Unknown alert severity.
    #[error("unknown alert severity: {0}")]
    UnknownSeverity(String),
}

/// Result type alias for parse operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
