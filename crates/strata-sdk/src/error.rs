use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// The target is inside the plugin cache and may not be modified.
    #[error("plugin-managed file is read-only: {}", .0.display())]
    PluginManaged(PathBuf),

    /// The engine configuration file could not be loaded.
    #[error("invalid config file {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("type error: {0}")]
    Type(#[from] strata_types::TypeError),

    #[error("filesystem error: {0}")]
    Fs(#[from] strata_fs::FsError),

    #[error("backup error: {0}")]
    Backup(#[from] strata_backup::BackupError),

    #[error("settings error: {0}")]
    Settings(#[from] strata_config::ConfigError),

    #[error("resource error: {0}")]
    Resource(#[from] strata_resource::ResourceError),
}

pub type SdkResult<T> = Result<T, SdkError>;
