use std::path::Path;

use strata_backup::BackupManager;
use strata_fs::{normalize, read_json_object_lossy, write_json_pretty};
use strata_jsonpath::{delete_at_path_owned, get_at_path, set_at_path_owned};
use strata_types::{BackupOperation, JsonObject, JsonValue};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Key-path mutations on settings files.
///
/// Every mutation reads the file fresh, snapshots it, and replaces it
/// atomically. There is no locking: two writers racing on one file both
/// succeed and the later rename wins.
#[derive(Clone, Debug)]
pub struct SettingsWriter {
    backups: BackupManager,
}

impl SettingsWriter {
    pub fn new(backups: BackupManager) -> Self {
        Self { backups }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Set `key_path` to `value` in `file`, creating the file if needed.
    ///
    /// A missing or unparseable file is treated as `{}`.
    pub fn apply_update(&self, file: &Path, key_path: &str, value: JsonValue) -> ConfigResult<JsonObject> {
        let updated = set_at_path_owned(read_json_object_lossy(file), key_path, value);
        self.backups.backup(file, BackupOperation::Update);
        write_json_pretty(file, &updated)?;
        debug!(path = %file.display(), key = key_path, "setting updated");
        Ok(updated)
    }

    /// Remove `key_path` from `file`.
    ///
    /// Deleting a key that is not present rewrites the file unchanged.
    pub fn apply_delete(&self, file: &Path, key_path: &str) -> ConfigResult<JsonObject> {
        if !file.exists() {
            return Err(ConfigError::FileNotFound(file.to_path_buf()));
        }
        let updated = delete_at_path_owned(read_json_object_lossy(file), key_path);
        self.backups.backup(file, BackupOperation::Delete);
        write_json_pretty(file, &updated)?;
        debug!(path = %file.display(), key = key_path, "setting deleted");
        Ok(updated)
    }

    /// Move `key_path` from one settings file to another.
    ///
    /// The destination is written before the source, so an interruption
    /// between the two writes leaves the value in both files, never in
    /// neither. Fails with [`ConfigError::KeyNotFound`] before touching either
    /// file if the key is absent from `from`.
    pub fn apply_move(&self, from: &Path, to: &Path, key_path: &str) -> ConfigResult<()> {
        let source = read_json_object_lossy(from);
        let value = get_at_path(&source, key_path)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key_path.to_string()))?;

        if normalize(from)? == normalize(to)? {
            return Ok(());
        }

        let destination = set_at_path_owned(read_json_object_lossy(to), key_path, value);
        let source = delete_at_path_owned(source, key_path);

        self.backups.backup(from, BackupOperation::Move);
        self.backups.backup(to, BackupOperation::Move);

        write_json_pretty(to, &destination)?;
        write_json_pretty(from, &source)?;
        debug!(from = %from.display(), to = %to.display(), key = key_path, "setting moved");
        Ok(())
    }
}
