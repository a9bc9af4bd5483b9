//! Snapshot, restore, and retention management.
//!
//! Before any destructive change to a file, Strata copies the file's current
//! bytes into a snapshot directory under `<root>/backups/`:
//!
//! ```text
//! <root>/backups/<id>/meta.json   {"originalPath", "operation", "timestamp"}
//! <root>/backups/<id>/file        byte-for-byte copy
//! ```
//!
//! # Design Rules
//!
//! 1. Taking a backup never fails the caller: errors are logged and reported
//!    as "no snapshot" ([`BackupManager::backup`] returns `None`).
//! 2. Snapshots are assembled in a hidden staging directory and renamed into
//!    place, so a visible snapshot directory is always complete.
//! 3. Restoring first snapshots the file being overwritten, so a restore can
//!    itself be undone.
//! 4. Pruning runs in the background after each backup and only removes
//!    snapshots that are expired or can never be restored. Overlapping runs
//!    are harmless.

pub mod entry;
pub mod error;
pub mod manager;
pub mod scheduler;

pub use entry::{BackupEntry, BackupMeta, PruneReport, META_FILE, PAYLOAD_FILE};
pub use error::{BackupError, BackupResult};
pub use manager::{BackupManager, BACKUPS_DIR, DEFAULT_RETENTION_DAYS};
pub use scheduler::{
    InlineScheduler, NoopScheduler, PruneJob, PruneScheduler, ThreadScheduler, TokioScheduler,
};
