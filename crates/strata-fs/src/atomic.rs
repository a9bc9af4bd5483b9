//! Atomic file replacement.
//!
//! Content is written to a uniquely named temporary file next to the target
//! and renamed into place. Rename within one directory stays on one
//! filesystem, so readers see either the old bytes or the new bytes.

use std::fs;
use std::io::Write;
use std::path::Path;

use strata_types::{parse_object, JsonObject};
use tempfile::Builder;
use tracing::debug;

use crate::error::FsResult;

/// Prefix of in-flight temporary files.
const TEMP_PREFIX: &str = ".tmp-";

/// Write `content` to `path` with no partial write ever visible.
///
/// The parent directory must already exist. If the target exists its
/// permissions are carried over to the replacement. On any failure the
/// temporary file is removed and the target is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> FsResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Dropping `tmp` on an early return deletes the temporary file.
    let mut tmp = Builder::new().prefix(TEMP_PREFIX).rand_bytes(12).tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    carry_permissions(path, tmp.as_file())?;

    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), bytes = content.len(), "atomic write committed");
    Ok(())
}

#[cfg(unix)]
fn carry_permissions(target: &Path, tmp: &fs::File) -> FsResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let perms = match fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(_) => fs::Permissions::from_mode(0o644),
    };
    tmp.set_permissions(perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn carry_permissions(target: &Path, tmp: &fs::File) -> FsResult<()> {
    if let Ok(meta) = fs::metadata(target) {
        tmp.set_permissions(meta.permissions())?;
    }
    Ok(())
}

/// Serialise `obj` as two-space indented JSON plus a trailing newline and
/// commit it atomically, creating parent directories as needed.
pub fn write_json_pretty(path: &Path, obj: &JsonObject) -> FsResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = serde_json::to_vec_pretty(obj)?;
    out.push(b'\n');
    write_atomic(path, &out)
}

/// Read a JSON object from `path`.
///
/// A missing file, unreadable file, invalid JSON, or a non-object top-level
/// value all yield an empty object.
pub fn read_json_object_lossy(path: &Path) -> JsonObject {
    fs::read(path)
        .ok()
        .and_then(|bytes| parse_object(&bytes))
        .unwrap_or_default()
}
