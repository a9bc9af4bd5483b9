use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use strata_backup::BackupManager;
use strata_fs::write_atomic;
use strata_types::{BackupOperation, JsonObject, ResourceKind};
use tracing::debug;

use crate::error::{ResourceError, ResourceResult};
use crate::frontmatter::{FrontmatterParser, YamlFrontmatter};
use crate::id::{validate_resource_id, RESOURCE_EXTENSION};

/// A parsed resource file.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFile {
    /// File stem.
    pub id: String,
    /// Frontmatter `name`, or the id when absent.
    pub name: String,
    pub description: String,
    /// Raw file content.
    pub content: String,
    pub frontmatter: JsonObject,
    pub body: String,
    pub file_path: PathBuf,
}

/// CRUD over the resources of one kind under one base directory.
#[derive(Clone)]
pub struct ResourceStore {
    dir: PathBuf,
    kind: ResourceKind,
    backups: BackupManager,
    parser: Arc<dyn FrontmatterParser>,
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("dir", &self.dir)
            .field("kind", &self.kind)
            .finish()
    }
}

impl ResourceStore {
    /// Store for `<base>/<kind dir>/`. `base` is the configuration root or a
    /// project's `.claude` directory.
    pub fn new(base: &Path, kind: ResourceKind, backups: BackupManager) -> Self {
        Self {
            dir: base.join(kind.dir_name()),
            kind,
            backups,
            parser: Arc::new(YamlFrontmatter),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn FrontmatterParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Path of resource `id`, after validating the id.
    pub fn path_for(&self, id: &str) -> ResourceResult<PathBuf> {
        validate_resource_id(id)?;
        Ok(self.dir.join(format!("{id}.{RESOURCE_EXTENSION}")))
    }

    /// Every `*.md` file directly in the directory, sorted by file name.
    /// Symlinks are followed; directories and dangling links are skipped. A
    /// missing directory is an empty list.
    pub fn list(&self) -> ResourceResult<Vec<ResourceFile>> {
        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in read {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == RESOURCE_EXTENSION) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        names
            .iter()
            .map(|name| {
                let id = name.strip_suffix(".md").unwrap_or(name);
                self.load(id, &self.dir.join(name))
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> ResourceResult<ResourceFile> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(ResourceError::ResourceNotFound(path));
        }
        self.load(id, &path)
    }

    /// Create a new resource. Fails if one with `id` already exists.
    ///
    /// The file is created exclusively, so two concurrent creates of the
    /// same id cannot both succeed.
    pub fn create(&self, id: &str, content: &str) -> ResourceResult<ResourceFile> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.dir)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ResourceError::ResourceAlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        };
        let written = file.write_all(content.as_bytes()).and_then(|()| file.sync_all());
        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        debug!(path = %path.display(), kind = %self.kind, "resource created");
        self.load(id, &path)
    }

    /// Replace an existing resource's content.
    pub fn update(&self, id: &str, content: &str) -> ResourceResult<ResourceFile> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(ResourceError::ResourceNotFound(path));
        }
        self.backups.backup(&path, BackupOperation::Update);
        write_atomic(&path, content.as_bytes())?;
        debug!(path = %path.display(), kind = %self.kind, "resource updated");
        self.load(id, &path)
    }

    pub fn delete(&self, id: &str) -> ResourceResult<()> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(ResourceError::ResourceNotFound(path));
        }
        self.backups.backup(&path, BackupOperation::Delete);
        fs::remove_file(&path)?;
        debug!(path = %path.display(), kind = %self.kind, "resource deleted");
        Ok(())
    }

    fn load(&self, id: &str, path: &Path) -> ResourceResult<ResourceFile> {
        let content = fs::read_to_string(path)?;
        let doc = self.parser.parse(&content)?;
        let name = doc
            .str_field("name")
            .filter(|n| !n.is_empty())
            .unwrap_or(id)
            .to_string();
        let description = doc.str_field("description").unwrap_or_default().to_string();
        Ok(ResourceFile {
            id: id.to_string(),
            name,
            description,
            content,
            frontmatter: doc.frontmatter,
            body: doc.body,
            file_path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::MarkdownDoc;
    use strata_backup::NoopScheduler;

    fn store(root: &Path, kind: ResourceKind) -> ResourceStore {
        let backups = BackupManager::new(root).with_scheduler(Arc::new(NoopScheduler));
        ResourceStore::new(root, kind, backups)
    }

    #[test]
    fn list_missing_dir_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(store(root.path(), ResourceKind::Agent).list().unwrap().is_empty());
    }

    #[test]
    fn list_sorted_md_files_only() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Skill);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.dir().join("b.md"), "B").unwrap();
        fs::write(s.dir().join("a.md"), "---\nname: Alpha\ndescription: first\n---\nA").unwrap();
        fs::write(s.dir().join("notes.txt"), "ignored").unwrap();
        fs::create_dir_all(s.dir().join("dir.md")).unwrap();

        let listed = s.list().unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(listed[0].name, "Alpha");
        assert_eq!(listed[0].description, "first");
        assert_eq!(listed[0].body, "A");
        assert_eq!(listed[1].name, "b");
        assert_eq!(listed[1].description, "");
    }

    #[cfg(unix)]
    #[test]
    fn list_follows_symlinked_resources() {
        let root = tempfile::tempdir().unwrap();
        let dotfiles = tempfile::tempdir().unwrap();
        let target = dotfiles.path().join("reviewer.md");
        fs::write(&target, "---\nname: Reviewer\n---\nreview").unwrap();

        let s = store(root.path(), ResourceKind::Agent);
        fs::create_dir_all(s.dir()).unwrap();
        std::os::unix::fs::symlink(&target, s.dir().join("reviewer.md")).unwrap();
        std::os::unix::fs::symlink(dotfiles.path().join("gone.md"), s.dir().join("dangling.md")).unwrap();

        let listed = s.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "reviewer");
        assert_eq!(listed[0].name, "Reviewer");
        assert_eq!(s.get("reviewer").unwrap(), listed[0]);
    }

    #[test]
    fn create_get_update_delete() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Command);

        let created = s.create("deploy", "---\nname: Deploy\n---\nship it").unwrap();
        assert_eq!(created.file_path, root.path().join("commands").join("deploy.md"));
        assert_eq!(s.get("deploy").unwrap(), created);

        let updated = s.update("deploy", "new body").unwrap();
        assert_eq!(updated.name, "deploy");
        assert_eq!(updated.content, "new body");

        s.delete("deploy").unwrap();
        assert!(matches!(s.get("deploy"), Err(ResourceError::ResourceNotFound(_))));

        let ops: Vec<_> = s.backups.list().unwrap().into_iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![BackupOperation::Delete, BackupOperation::Update]);
    }

    #[test]
    fn create_twice_fails_and_keeps_first() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Agent);
        s.create("reviewer", "first").unwrap();

        let err = s.create("reviewer", "second").unwrap_err();
        assert!(matches!(err, ResourceError::ResourceAlreadyExists(_)));
        assert_eq!(s.get("reviewer").unwrap().content, "first");
    }

    #[test]
    fn traversal_ids_are_rejected_everywhere() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Agent);
        for id in ["../escape", "a/b", ""] {
            assert!(matches!(s.create(id, "x"), Err(ResourceError::InvalidResourceId(_))));
            assert!(matches!(s.get(id), Err(ResourceError::InvalidResourceId(_))));
            assert!(matches!(s.update(id, "x"), Err(ResourceError::InvalidResourceId(_))));
            assert!(matches!(s.delete(id), Err(ResourceError::InvalidResourceId(_))));
        }
        assert!(!root.path().join("escape.md").exists());
    }

    #[test]
    fn update_and_delete_missing_are_not_found() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Skill);
        assert!(matches!(s.update("ghost", "x"), Err(ResourceError::ResourceNotFound(_))));
        assert!(matches!(s.delete("ghost"), Err(ResourceError::ResourceNotFound(_))));
    }

    #[test]
    fn deleted_resource_can_be_restored() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Agent);
        s.create("keep", "precious").unwrap();
        s.delete("keep").unwrap();

        let entry = &s.backups.list().unwrap()[0];
        s.backups.restore(&entry.dir).unwrap();
        assert_eq!(s.get("keep").unwrap().content, "precious");
    }

    struct Uppercase;

    impl FrontmatterParser for Uppercase {
        fn parse(&self, content: &str) -> ResourceResult<MarkdownDoc> {
            Ok(MarkdownDoc {
                frontmatter: JsonObject::new(),
                body: content.to_uppercase(),
            })
        }
    }

    #[test]
    fn custom_parser_is_used() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Agent).with_parser(Arc::new(Uppercase));
        assert_eq!(s.create("x", "shout").unwrap().body, "SHOUT");
    }

    #[test]
    fn mutations_commit_when_backup_fails() {
        let root = tempfile::tempdir().unwrap();
        let s = store(root.path(), ResourceKind::Command);
        s.create("deploy", "v1").unwrap();
        fs::write(root.path().join("backups"), "blocked").unwrap();

        assert_eq!(s.update("deploy", "v2").unwrap().content, "v2");
        assert_eq!(fs::read_to_string(s.path_for("deploy").unwrap()).unwrap(), "v2");
        s.delete("deploy").unwrap();
        assert!(!s.path_for("deploy").unwrap().exists());
    }
}
