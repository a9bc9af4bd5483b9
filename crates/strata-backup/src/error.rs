use std::path::PathBuf;

use strata_fs::FsError;

/// Errors from backup and restore operations.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// The snapshot's metadata or payload is missing or unusable.
    #[error("backup is corrupted ({reason}): {}", .dir.display())]
    CorruptBackup { dir: PathBuf, reason: String },

    /// A snapshot id contains characters generated ids never use.
    #[error("invalid backup id format: {0:?}")]
    InvalidBackupId(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    /// I/O error while copying or restoring.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    pub(crate) fn corrupt(dir: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::CorruptBackup {
            dir: dir.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result alias for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;
