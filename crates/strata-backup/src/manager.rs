use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{DateTime, Duration, Utc};
use strata_fs::assert_safe_path;
use strata_types::{BackupOperation, SnapshotId};
use tracing::{debug, info, warn};

use crate::entry::{BackupEntry, BackupMeta, PruneReport, META_FILE, PAYLOAD_FILE};
use crate::error::{BackupError, BackupResult};
use crate::scheduler::{PruneScheduler, ThreadScheduler};

/// Subdirectory of the configuration root holding snapshots.
pub const BACKUPS_DIR: &str = "backups";

/// Snapshots older than this are pruned.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Prefix of snapshot directories still being assembled.
const STAGING_PREFIX: &str = ".staging-";

/// Staging directories older than this are considered abandoned.
const STAGING_GRACE: StdDuration = StdDuration::from_secs(60 * 60);

/// Takes, lists, restores, and prunes snapshots under `<root>/backups/`.
///
/// The manager holds no state beyond its configuration; every call reads the
/// filesystem fresh. Cloning is cheap.
#[derive(Clone)]
pub struct BackupManager {
    backups_dir: PathBuf,
    retention: Duration,
    scheduler: Arc<dyn PruneScheduler>,
}

impl std::fmt::Debug for BackupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupManager")
            .field("backups_dir", &self.backups_dir)
            .field("retention_days", &self.retention.num_days())
            .finish()
    }
}

impl BackupManager {
    /// Manager for the configuration root `root`, pruning on a background
    /// thread with the default 30-day retention.
    pub fn new(root: &Path) -> Self {
        Self {
            backups_dir: root.join(BACKUPS_DIR),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            scheduler: Arc::new(ThreadScheduler),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn PruneScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Directory a snapshot with `id` lives in.
    pub fn snapshot_dir(&self, id: &SnapshotId) -> PathBuf {
        self.backups_dir.join(id.as_str())
    }

    // -----------------------------------------------------------------------
    // Backup
    // -----------------------------------------------------------------------

    /// Snapshot `path` before a mutation.
    ///
    /// Returns the snapshot directory, or `None` if `path` does not exist or
    /// the snapshot could not be written. Never fails: a backup problem must
    /// not block the write it protects. On success a prune pass is handed to
    /// the scheduler.
    pub fn backup(&self, path: &Path, operation: BackupOperation) -> Option<PathBuf> {
        if !path.is_file() {
            return None;
        }
        match self.try_backup(path, operation) {
            Ok(dir) => {
                debug!(path = %path.display(), snapshot = %dir.display(), %operation, "backup taken");
                self.schedule_prune();
                Some(dir)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "backup failed; continuing without snapshot");
                None
            }
        }
    }

    fn try_backup(&self, path: &Path, operation: BackupOperation) -> BackupResult<PathBuf> {
        let now = Utc::now();
        let id = SnapshotId::generate(now);
        let staging = self.backups_dir.join(format!("{STAGING_PREFIX}{id}"));
        let target = self.snapshot_dir(&id);

        fs::create_dir_all(&staging)?;
        let assembled = (|| -> BackupResult<()> {
            let meta = BackupMeta::new(path, operation, now);
            let mut bytes = serde_json::to_vec_pretty(&meta).map_err(io::Error::from)?;
            bytes.push(b'\n');
            fs::write(staging.join(META_FILE), bytes)?;
            copy_file(path, &staging.join(PAYLOAD_FILE))?;
            fs::rename(&staging, &target)?;
            Ok(())
        })();

        if let Err(e) = assembled {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
        Ok(target)
    }

    fn schedule_prune(&self) {
        let pruner = self.clone();
        self.scheduler.submit(Box::new(move || {
            let report = pruner.prune();
            if report.removed() > 0 {
                debug!(?report, "background prune complete");
            }
        }));
    }

    // -----------------------------------------------------------------------
    // List
    // -----------------------------------------------------------------------

    /// All restorable snapshots, newest first.
    ///
    /// Entries with missing, unparseable or incomplete metadata are skipped.
    /// A missing backups directory yields an empty list.
    pub fn list(&self) -> BackupResult<Vec<BackupEntry>> {
        let mut entries: Vec<BackupEntry> = self
            .snapshot_dirs()?
            .into_iter()
            .filter_map(|dir| match BackupEntry::load(&dir) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "skipping unreadable snapshot");
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    /// Look up a single snapshot by id.
    pub fn get(&self, id: &str) -> BackupResult<BackupEntry> {
        let dir = self.checked_snapshot_dir(id)?;
        BackupEntry::load(&dir)
    }

    /// Visible (non-staging) snapshot directories.
    fn snapshot_dirs(&self) -> BackupResult<Vec<PathBuf>> {
        let read = match fs::read_dir(&self.backups_dir) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut dirs = Vec::new();
        for entry in read {
            let entry = entry?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            dirs.push(entry.path());
        }
        Ok(dirs)
    }

    // -----------------------------------------------------------------------
    // Prune
    // -----------------------------------------------------------------------

    /// Apply the configured retention as of now.
    pub fn prune(&self) -> PruneReport {
        self.prune_with(self.retention, Utc::now())
    }

    /// Remove snapshots older than `now - retention`, every snapshot whose
    /// metadata is missing or unusable, and abandoned staging directories.
    ///
    /// Safe to run concurrently with itself and with [`BackupManager::backup`]:
    /// in-progress snapshots live in staging directories younger than the
    /// grace period, and directories that vanish mid-pass are ignored.
    pub fn prune_with(&self, retention: Duration, now: DateTime<Utc>) -> PruneReport {
        let mut report = PruneReport::default();
        let cutoff = now - retention;

        let read = match fs::read_dir(&self.backups_dir) {
            Ok(read) => read,
            Err(_) => return report,
        };

        for entry in read.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let dir = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if name.starts_with(STAGING_PREFIX) {
                if is_abandoned(&dir) && remove_snapshot(&dir) {
                    report.removed_staging += 1;
                }
                continue;
            }
            if name.starts_with('.') {
                continue;
            }

            let judged = BackupMeta::read(&dir).and_then(|meta| meta.validate(&dir));
            match judged {
                Err(_) => {
                    if remove_snapshot(&dir) {
                        report.removed_corrupt += 1;
                    }
                }
                Ok((timestamp, _)) if timestamp < cutoff => {
                    if remove_snapshot(&dir) {
                        report.removed_expired += 1;
                    }
                }
                Ok(_) => report.kept += 1,
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Restore
    // -----------------------------------------------------------------------

    /// Copy a snapshot's payload back to its original path.
    ///
    /// The file currently at the original path is snapshotted first, so the
    /// restore can be undone. Returns the restored path.
    pub fn restore(&self, snapshot_dir: &Path) -> BackupResult<PathBuf> {
        let meta = BackupMeta::read(snapshot_dir)?;
        meta.validate(snapshot_dir)?;
        let original = PathBuf::from(&meta.original_path);

        self.backup(&original, BackupOperation::Update);

        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = snapshot_dir.join(PAYLOAD_FILE);
        if !payload.is_file() {
            return Err(BackupError::corrupt(snapshot_dir, "missing file"));
        }
        copy_file(&payload, &original)?;

        info!(snapshot = %snapshot_dir.display(), path = %original.display(), "backup restored");
        Ok(original)
    }

    /// Restore the snapshot named `id`.
    pub fn restore_by_id(&self, id: &str) -> BackupResult<PathBuf> {
        let dir = self.checked_snapshot_dir(id)?;
        self.restore(&dir)
    }

    fn checked_snapshot_dir(&self, id: &str) -> BackupResult<PathBuf> {
        if !SnapshotId::is_well_formed(id) {
            return Err(BackupError::InvalidBackupId(id.to_string()));
        }
        let dir = self.backups_dir.join(id);
        Ok(assert_safe_path(&dir, &[&self.backups_dir])?)
    }
}

/// Copy `src` over `dst` byte-for-byte and flush it to disk.
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    io::copy(&mut input, &mut output)?;
    output.sync_all()
}

/// Remove a snapshot directory. Returns `true` if this call removed it.
fn remove_snapshot(dir: &Path) -> bool {
    match fs::remove_dir_all(dir) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to remove snapshot");
            false
        }
    }
}

fn is_abandoned(dir: &Path) -> bool {
    fs::metadata(dir)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > STAGING_GRACE)
        .unwrap_or(false)
}
