use std::path::PathBuf;

use strata_fs::FsError;

/// Errors from resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("invalid resource id: {0:?}")]
    InvalidResourceId(String),

    /// A memory filename is not a plain `*.md` name.
    #[error("invalid memory filename {0:?}: expected a plain *.md name")]
    InvalidMemoryFilename(String),

    #[error("unknown instructions file {0:?}: expected main or local")]
    InvalidInstructionsFile(String),

    #[error("resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("resource already exists: {}", .0.display())]
    ResourceAlreadyExists(PathBuf),

    /// The frontmatter block is not a YAML mapping.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
