use std::path::PathBuf;

use strata_fs::FsError;

/// Errors from settings reads and mutations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The key path is absent from the source file of a move.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The settings file to delete from does not exist.
    #[error("settings file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A project-scoped layer was requested without a project.
    #[error("layer {0} requires a project")]
    ProjectRequired(String),

    #[error("invalid hook event: {0:?}")]
    InvalidHookEvent(String),

    /// A hook id is not of the form `<event>:<index>`.
    #[error("invalid hook id {0:?}: expected <event>:<index>")]
    InvalidHookId(String),

    #[error("hook not found: {0}")]
    HookNotFound(String),

    /// An event's hook list exists but is not a list of definitions.
    #[error("malformed hooks for {event}: {reason}")]
    MalformedHooks { event: String, reason: String },

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
