use std::path::PathBuf;

use strata_types::{ProjectId, TypeError};

/// Errors from filesystem primitives.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// An empty path was supplied where a location is required.
    #[error("path must not be empty")]
    EmptyPath,

    /// The resolved path is not under any allowed root.
    #[error("path is outside allowed directories: {}", .0.display())]
    PathOutsideAllowedRoots(PathBuf),

    /// No registration marker exists for the project id.
    #[error("unregistered project id {0}")]
    ProjectNotRegistered(ProjectId),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;
