use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("cannot decode project id {0:?}: decoded to empty path")]
    EmptyDecodedPath(String),

    #[error("unknown backup operation: {0}")]
    UnknownOperation(String),

    #[error("unknown layer source: {0}")]
    UnknownLayer(String),

    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
