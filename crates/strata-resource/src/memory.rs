//! Per-project memory notes: `<root>/projects/<id>/memory/*.md`.
//!
//! Files are addressed by their full file name (`notes.md`), not a stem.
//! Checking that the project is registered is the caller's job.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use strata_backup::BackupManager;
use strata_fs::write_atomic;
use strata_types::BackupOperation;
use tracing::{debug, warn};

use crate::error::{ResourceError, ResourceResult};
use crate::frontmatter::truncate_body;

/// Directory under a project's metadata directory holding its notes.
pub const MEMORY_DIR: &str = "memory";

/// Lines of content kept in a listing preview.
pub const MEMORY_PREVIEW_LINES: usize = 3;

const MEMORY_SUFFIX: &str = ".md";

/// A memory file as listed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFile {
    pub filename: String,
    pub file_path: PathBuf,
    pub preview: String,
}

/// A memory file with its full content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDetail {
    pub filename: String,
    pub file_path: PathBuf,
    pub content: String,
}

/// Check that `filename` is a plain `*.md` name with no separators or NUL.
/// The suffix rules out a `..` segment.
pub fn validate_memory_filename(filename: &str) -> ResourceResult<()> {
    let invalid = filename.contains(['/', '\\', '\0']) || !filename.ends_with(MEMORY_SUFFIX);
    if invalid {
        return Err(ResourceError::InvalidMemoryFilename(filename.to_string()));
    }
    Ok(())
}

/// CRUD over one project's memory directory.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    dir: PathBuf,
    backups: BackupManager,
}

impl MemoryStore {
    /// Store for `<project_meta>/memory`, where `project_meta` is
    /// `<root>/projects/<id>`.
    pub fn new(project_meta: &Path, backups: BackupManager) -> Self {
        Self {
            dir: project_meta.join(MEMORY_DIR),
            backups,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, filename: &str) -> ResourceResult<PathBuf> {
        validate_memory_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// Every `*.md` file, sorted by name, with a short preview. A missing
    /// directory is an empty list; unreadable files are skipped.
    pub fn list(&self) -> ResourceResult<Vec<MemoryFile>> {
        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in read {
            let entry = entry?;
            let path = entry.path();
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !path.is_file() || !filename.ends_with(MEMORY_SUFFIX) {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => files.push(MemoryFile {
                    filename,
                    preview: truncate_body(&content, MEMORY_PREVIEW_LINES),
                    file_path: path,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable memory file"),
            }
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    pub fn get(&self, filename: &str) -> ResourceResult<MemoryDetail> {
        let path = self.path_for(filename)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ResourceError::ResourceNotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(MemoryDetail {
            filename: filename.to_string(),
            file_path: path,
            content,
        })
    }

    /// Create a new note. Fails if `filename` already exists.
    pub fn create(&self, filename: &str, content: &str) -> ResourceResult<MemoryFile> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.dir)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ResourceError::ResourceAlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = file.write_all(content.as_bytes()).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        debug!(path = %path.display(), "memory created");
        Ok(MemoryFile {
            filename: filename.to_string(),
            file_path: path,
            preview: truncate_body(content, MEMORY_PREVIEW_LINES),
        })
    }

    /// Write `content` to `filename`, creating it if needed. An existing
    /// file is snapshotted first.
    pub fn update(&self, filename: &str, content: &str) -> ResourceResult<()> {
        let path = self.path_for(filename)?;
        self.backups.backup(&path, BackupOperation::Update);
        fs::create_dir_all(&self.dir)?;
        write_atomic(&path, content.as_bytes())?;
        debug!(path = %path.display(), "memory updated");
        Ok(())
    }

    pub fn delete(&self, filename: &str) -> ResourceResult<()> {
        let path = self.path_for(filename)?;
        if !path.is_file() {
            return Err(ResourceError::ResourceNotFound(path));
        }
        self.backups.backup(&path, BackupOperation::Delete);
        fs::remove_file(&path)?;
        debug!(path = %path.display(), "memory deleted");
        Ok(())
    }
}
