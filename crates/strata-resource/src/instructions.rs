//! `CLAUDE.md` and `CLAUDE.local.md`, the free-form instruction files of a
//! scope.
//!
//! Global instructions live in the configuration root; a project's live in
//! the project root itself, next to (not inside) its `.claude` directory.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strata_backup::BackupManager;
use strata_fs::write_atomic;
use strata_types::BackupOperation;
use tracing::debug;

use crate::error::{ResourceError, ResourceResult};

/// Which of the two instruction files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionsKind {
    /// `CLAUDE.md`, usually committed.
    #[default]
    Main,
    /// `CLAUDE.local.md`, usually ignored by version control.
    Local,
}

impl InstructionsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Local => "local",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Main => "CLAUDE.md",
            Self::Local => "CLAUDE.local.md",
        }
    }
}

impl fmt::Display for InstructionsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionsKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "local" => Ok(Self::Local),
            other => Err(ResourceError::InvalidInstructionsFile(other.to_string())),
        }
    }
}

/// One instruction file as read from disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsFile {
    pub file_path: PathBuf,
    pub exists: bool,
    /// `None` when the file does not exist.
    pub content: Option<String>,
}

/// Both instruction files of a scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instructions {
    pub main: InstructionsFile,
    pub local: InstructionsFile,
}

/// Reads and rewrites the instruction files in one directory.
#[derive(Clone, Debug)]
pub struct InstructionsStore {
    dir: PathBuf,
    backups: BackupManager,
}

impl InstructionsStore {
    pub fn new(dir: &Path, backups: BackupManager) -> Self {
        Self {
            dir: dir.to_path_buf(),
            backups,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: InstructionsKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Read one file. A missing file is reported with `exists: false`.
    pub fn read(&self, kind: InstructionsKind) -> ResourceResult<InstructionsFile> {
        let file_path = self.path_for(kind);
        let content = match fs::read_to_string(&file_path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(InstructionsFile {
            file_path,
            exists: content.is_some(),
            content,
        })
    }

    pub fn get(&self) -> ResourceResult<Instructions> {
        Ok(Instructions {
            main: self.read(InstructionsKind::Main)?,
            local: self.read(InstructionsKind::Local)?,
        })
    }

    /// Replace (or create) one file. An existing file is snapshotted first.
    pub fn update(&self, kind: InstructionsKind, content: &str) -> ResourceResult<InstructionsFile> {
        let path = self.path_for(kind);
        self.backups.backup(&path, BackupOperation::Update);
        fs::create_dir_all(&self.dir)?;
        write_atomic(&path, content.as_bytes())?;
        debug!(path = %path.display(), file = %kind, "instructions updated");
        Ok(InstructionsFile {
            file_path: path,
            exists: true,
            content: Some(content.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_backup::NoopScheduler;

    fn store(root: &Path, dir: &Path) -> InstructionsStore {
        let backups = BackupManager::new(root).with_scheduler(Arc::new(NoopScheduler));
        InstructionsStore::new(dir, backups)
    }

    #[test]
    fn kind_names() {
        assert_eq!("local".parse::<InstructionsKind>().unwrap(), InstructionsKind::Local);
        assert_eq!(InstructionsKind::Main.file_name(), "CLAUDE.md");
        assert!(matches!(
            "global".parse::<InstructionsKind>(),
            Err(ResourceError::InvalidInstructionsFile(_))
        ));
    }

    #[test]
    fn missing_files_are_reported_absent() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), root.path());
        let all = s.get().unwrap();
        assert!(!all.main.exists);
        assert_eq!(all.main.content, None);
        assert_eq!(all.local.file_path, root.path().join("CLAUDE.local.md"));
    }

    #[test]
    fn first_write_creates_without_snapshot() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("work").join("app");
        let s = store(root.path(), &project);

        let written = s.update(InstructionsKind::Local, "be terse").unwrap();
        assert!(written.exists);
        assert_eq!(fs::read_to_string(project.join("CLAUDE.local.md")).unwrap(), "be terse");
        assert!(s.backups.list().unwrap().is_empty());
    }

    #[test]
    fn rewrite_snapshots_previous_content() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), root.path());
        s.update(InstructionsKind::Main, "v1").unwrap();
        s.update(InstructionsKind::Main, "v2").unwrap();

        assert_eq!(s.read(InstructionsKind::Main).unwrap().content.as_deref(), Some("v2"));
        let entries = s.backups.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, BackupOperation::Update);
        s.backups.restore(&entries[0].dir).unwrap();
        assert_eq!(s.read(InstructionsKind::Main).unwrap().content.as_deref(), Some("v1"));
    }
}
