use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Serialize;
use strata_backup::{BackupEntry, BackupManager, PruneReport};
use strata_config::{
    resolve_layer_path, ConfigLayers, EffectiveConfig, HookDefinition, HookEntry, HookEvent,
    HookId, HookStore, SettingsWriter, PROJECT_CONFIG_DIR,
};
use strata_fs::{
    allowed_roots, assert_safe_path, resolve_project_path, OwnershipPolicy, PROJECTS_DIR,
};
use strata_resource::{
    search, Instructions, InstructionsFile, InstructionsKind, InstructionsStore, MemoryDetail,
    MemoryFile, MemoryStore, ResourceFile, ResourceStore, SearchHit,
};
use strata_types::{JsonObject, JsonValue, LayerSource, ProjectId, ResourceKind};
use tracing::debug;

use crate::config::StrataConfig;
use crate::error::{SdkError, SdkResult};

/// Which tree an operation addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    /// The configuration root.
    #[default]
    Global,
    /// A registered project's `.claude` directory.
    Project(ProjectId),
}

impl Scope {
    pub fn project(&self) -> Option<&ProjectId> {
        match self {
            Self::Global => None,
            Self::Project(id) => Some(id),
        }
    }
}

/// A registered project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    /// Last component of the decoded path.
    pub name: String,
    pub path: PathBuf,
}

/// High-level Strata API bound to one configuration root.
pub struct Strata {
    root: PathBuf,
    config: StrataConfig,
    backups: BackupManager,
    ownership: OwnershipPolicy,
    layers: ConfigLayers,
    settings: SettingsWriter,
    hooks: HookStore,
}

impl Strata {
    /// Open the configuration root described by `config`.
    pub fn open(config: StrataConfig) -> Self {
        let root = config.resolved_root();
        let backups = BackupManager::new(&root)
            .with_retention(Duration::days(i64::from(config.retention_days)))
            .with_scheduler(config.scheduler.build());
        debug!(root = %root.display(), scheduler = ?config.scheduler, "strata opened");

        Self {
            ownership: OwnershipPolicy::new(&root),
            layers: ConfigLayers::new(&root),
            settings: SettingsWriter::new(backups.clone()),
            hooks: HookStore::new(backups.clone()),
            backups,
            root,
            config,
        }
    }

    /// Open `root` with default settings.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self::open(StrataConfig::with_root(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn ownership(&self) -> &OwnershipPolicy {
        &self.ownership
    }

    // ---- Path safety ----

    /// The root, every path in the projects file, and every registered
    /// project.
    pub fn allowed_roots(&self) -> Vec<PathBuf> {
        allowed_roots(&self.root, self.config.projects_file.as_deref())
    }

    /// Resolve `candidate`, failing if it escapes the allowed roots.
    pub fn check_path(&self, candidate: &Path) -> SdkResult<PathBuf> {
        Ok(assert_safe_path(candidate, &self.allowed_roots())?)
    }

    /// Fail with [`SdkError::PluginManaged`] for plugin-cache paths.
    pub fn ensure_user_owned(&self, path: &Path) -> SdkResult<()> {
        if self.ownership.is_plugin_managed(path) {
            return Err(SdkError::PluginManaged(path.to_path_buf()));
        }
        Ok(())
    }

    /// Gate for every mutation: inside the sandbox and not plugin-managed.
    fn writable(&self, path: &Path) -> SdkResult<PathBuf> {
        let resolved = self.check_path(path)?;
        self.ensure_user_owned(&resolved)?;
        Ok(resolved)
    }

    // ---- Projects ----

    /// Every registered project with a decodable id, sorted by id.
    pub fn list_projects(&self) -> Vec<ProjectInfo> {
        let Ok(entries) = fs::read_dir(self.root.join(PROJECTS_DIR)) else {
            return Vec::new();
        };
        let mut projects: Vec<ProjectInfo> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| {
                let id = ProjectId::new(e.file_name().to_string_lossy().into_owned());
                let path = id.decode().ok()?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                Some(ProjectInfo { id, name, path })
            })
            .collect();
        projects.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        projects
    }

    /// Path of a registered project.
    pub fn resolve_project(&self, id: &ProjectId) -> SdkResult<PathBuf> {
        Ok(resolve_project_path(&self.root, id)?)
    }

    fn project_path(&self, project: Option<&ProjectId>) -> SdkResult<Option<PathBuf>> {
        project.map(|id| self.resolve_project(id)).transpose()
    }

    /// Directory holding a scope's settings and resources.
    pub fn scope_base(&self, scope: &Scope) -> SdkResult<PathBuf> {
        match scope {
            Scope::Global => Ok(self.root.clone()),
            Scope::Project(id) => Ok(self.resolve_project(id)?.join(PROJECT_CONFIG_DIR)),
        }
    }

    // ---- Settings ----

    /// Merged settings, including the project layers when `project` is set.
    pub fn effective_config(&self, project: Option<&ProjectId>) -> SdkResult<EffectiveConfig> {
        let project = self.project_path(project)?;
        Ok(self.layers.merge(project.as_deref()))
    }

    /// Merged value at `key_path`.
    pub fn get_setting(&self, project: Option<&ProjectId>, key_path: &str) -> SdkResult<Option<JsonValue>> {
        Ok(self.effective_config(project)?.get(key_path).cloned())
    }

    /// Settings file backing `layer`.
    pub fn settings_path(&self, layer: LayerSource, project: Option<&ProjectId>) -> SdkResult<PathBuf> {
        let project = self.project_path(project)?;
        Ok(resolve_layer_path(&self.root, layer, project.as_deref())?)
    }

    pub fn set_setting(
        &self,
        layer: LayerSource,
        project: Option<&ProjectId>,
        key_path: &str,
        value: JsonValue,
    ) -> SdkResult<JsonObject> {
        let file = self.writable(&self.settings_path(layer, project)?)?;
        Ok(self.settings.apply_update(&file, key_path, value)?)
    }

    pub fn unset_setting(
        &self,
        layer: LayerSource,
        project: Option<&ProjectId>,
        key_path: &str,
    ) -> SdkResult<JsonObject> {
        let file = self.writable(&self.settings_path(layer, project)?)?;
        Ok(self.settings.apply_delete(&file, key_path)?)
    }

    /// Move `key_path` between two layers.
    pub fn move_setting(
        &self,
        from: LayerSource,
        to: LayerSource,
        project: Option<&ProjectId>,
        key_path: &str,
    ) -> SdkResult<()> {
        let from = self.writable(&self.settings_path(from, project)?)?;
        let to = self.writable(&self.settings_path(to, project)?)?;
        Ok(self.settings.apply_move(&from, &to, key_path)?)
    }

    // ---- Resources ----

    /// Store for `kind` resources in `scope`.
    pub fn resources(&self, kind: ResourceKind, scope: &Scope) -> SdkResult<ResourceStore> {
        Ok(ResourceStore::new(&self.scope_base(scope)?, kind, self.backups.clone()))
    }

    pub fn list_resources(&self, kind: ResourceKind, scope: &Scope) -> SdkResult<Vec<ResourceFile>> {
        Ok(self.resources(kind, scope)?.list()?)
    }

    pub fn get_resource(&self, kind: ResourceKind, scope: &Scope, id: &str) -> SdkResult<ResourceFile> {
        Ok(self.resources(kind, scope)?.get(id)?)
    }

    pub fn create_resource(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: &str,
        content: &str,
    ) -> SdkResult<ResourceFile> {
        let store = self.resources(kind, scope)?;
        self.writable(&store.path_for(id)?)?;
        Ok(store.create(id, content)?)
    }

    pub fn update_resource(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: &str,
        content: &str,
    ) -> SdkResult<ResourceFile> {
        let store = self.resources(kind, scope)?;
        self.writable(&store.path_for(id)?)?;
        Ok(store.update(id, content)?)
    }

    pub fn delete_resource(&self, kind: ResourceKind, scope: &Scope, id: &str) -> SdkResult<()> {
        let store = self.resources(kind, scope)?;
        self.writable(&store.path_for(id)?)?;
        Ok(store.delete(id)?)
    }

    /// Search global resources of `kinds` (every kind when empty).
    pub fn search(&self, query: &str, kinds: &[ResourceKind]) -> SdkResult<Vec<SearchHit>> {
        let kinds = if kinds.is_empty() { &ResourceKind::ALL[..] } else { kinds };
        let stores = kinds
            .iter()
            .map(|kind| self.resources(*kind, &Scope::Global))
            .collect::<SdkResult<Vec<_>>>()?;
        Ok(search(&stores, query)?)
    }

    // ---- Instructions ----

    /// Store for the instruction files of `scope`: the configuration root, or
    /// the project root itself for a project.
    pub fn instructions(&self, scope: &Scope) -> SdkResult<InstructionsStore> {
        let dir = match scope {
            Scope::Global => self.root.clone(),
            Scope::Project(id) => self.resolve_project(id)?,
        };
        Ok(InstructionsStore::new(&dir, self.backups.clone()))
    }

    pub fn get_instructions(&self, scope: &Scope) -> SdkResult<Instructions> {
        Ok(self.instructions(scope)?.get()?)
    }

    pub fn update_instructions(
        &self,
        scope: &Scope,
        kind: InstructionsKind,
        content: &str,
    ) -> SdkResult<InstructionsFile> {
        let store = self.instructions(scope)?;
        self.writable(&store.path_for(kind))?;
        Ok(store.update(kind, content)?)
    }

    // ---- Memory ----

    /// Memory store of a registered project.
    pub fn memory(&self, project: &ProjectId) -> SdkResult<MemoryStore> {
        self.resolve_project(project)?;
        let meta = self.root.join(PROJECTS_DIR).join(project.as_str());
        Ok(MemoryStore::new(&meta, self.backups.clone()))
    }

    pub fn list_memory(&self, project: &ProjectId) -> SdkResult<Vec<MemoryFile>> {
        Ok(self.memory(project)?.list()?)
    }

    pub fn get_memory(&self, project: &ProjectId, filename: &str) -> SdkResult<MemoryDetail> {
        Ok(self.memory(project)?.get(filename)?)
    }

    pub fn create_memory(&self, project: &ProjectId, filename: &str, content: &str) -> SdkResult<MemoryFile> {
        let store = self.memory(project)?;
        self.writable(&store.path_for(filename)?)?;
        Ok(store.create(filename, content)?)
    }

    pub fn update_memory(&self, project: &ProjectId, filename: &str, content: &str) -> SdkResult<()> {
        let store = self.memory(project)?;
        self.writable(&store.path_for(filename)?)?;
        Ok(store.update(filename, content)?)
    }

    pub fn delete_memory(&self, project: &ProjectId, filename: &str) -> SdkResult<()> {
        let store = self.memory(project)?;
        self.writable(&store.path_for(filename)?)?;
        Ok(store.delete(filename)?)
    }

    // ---- Hooks ----

    fn hooks_file(&self, scope: &Scope) -> SdkResult<PathBuf> {
        let layer = match scope {
            Scope::Global => LayerSource::Global,
            Scope::Project(_) => LayerSource::Project,
        };
        self.settings_path(layer, scope.project())
    }

    pub fn list_hooks(&self, scope: &Scope) -> SdkResult<Vec<HookEntry>> {
        Ok(self.hooks.list(&self.hooks_file(scope)?)?)
    }

    pub fn add_hook(&self, scope: &Scope, event: HookEvent, definition: HookDefinition) -> SdkResult<HookId> {
        let file = self.writable(&self.hooks_file(scope)?)?;
        Ok(self.hooks.add(&file, event, definition)?)
    }

    pub fn update_hook(&self, scope: &Scope, id: HookId, definition: HookDefinition) -> SdkResult<()> {
        let file = self.writable(&self.hooks_file(scope)?)?;
        Ok(self.hooks.update(&file, id, definition)?)
    }

    pub fn remove_hook(&self, scope: &Scope, id: HookId) -> SdkResult<HookDefinition> {
        let file = self.writable(&self.hooks_file(scope)?)?;
        Ok(self.hooks.remove(&file, id)?)
    }

    // ---- Backups ----

    pub fn list_backups(&self) -> SdkResult<Vec<BackupEntry>> {
        Ok(self.backups.list()?)
    }

    /// Restore snapshot `id` over its original path. Plugin-managed targets
    /// are refused.
    pub fn restore_backup(&self, id: &str) -> SdkResult<PathBuf> {
        let entry = self.backups.get(id)?;
        self.ensure_user_owned(&entry.original_path)?;
        Ok(self.backups.restore(&entry.dir)?)
    }

    pub fn prune_backups(&self) -> PruneReport {
        self.backups.prune()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerKind;
    use serde_json::json;

    fn strata(root: &Path) -> Strata {
        Strata::open(StrataConfig {
            scheduler: SchedulerKind::Disabled,
            ..StrataConfig::with_root(root)
        })
    }

    #[test]
    fn global_settings_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        let s = strata(root.path());
        s.set_setting(LayerSource::Global, None, "env.DEBUG", json!("1")).unwrap();
        assert_eq!(s.get_setting(None, "env.DEBUG").unwrap(), Some(json!("1")));

        s.unset_setting(LayerSource::Global, None, "env.DEBUG").unwrap();
        assert_eq!(s.get_setting(None, "env.DEBUG").unwrap(), None);
    }

    #[test]
    fn project_layer_without_project_fails() {
        let root = tempfile::tempdir().unwrap();
        let err = strata(root.path())
            .set_setting(LayerSource::Project, None, "a", json!(1))
            .unwrap_err();
        assert!(matches!(err, SdkError::Settings(strata_config::ConfigError::ProjectRequired(_))));
    }

    #[test]
    fn unregistered_project_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let s = strata(root.path());
        let id = ProjectId::new("-nowhere");
        assert!(matches!(
            s.effective_config(Some(&id)),
            Err(SdkError::Fs(strata_fs::FsError::ProjectNotRegistered(_)))
        ));
    }

    #[test]
    fn plugin_cache_paths_are_read_only() {
        let root = tempfile::tempdir().unwrap();
        let s = strata(root.path());
        let cached = root.path().join("plugins").join("cache").join("acme").join("agent.md");
        assert!(matches!(s.ensure_user_owned(&cached), Err(SdkError::PluginManaged(_))));
        assert!(s.ensure_user_owned(&root.path().join("agents").join("a.md")).is_ok());
    }

    #[test]
    fn list_projects_decodes_markers() {
        let root = tempfile::tempdir().unwrap();
        let projects = root.path().join(PROJECTS_DIR);
        fs::create_dir_all(projects.join("-work-app")).unwrap();
        fs::create_dir_all(projects.join("-")).unwrap();
        fs::write(projects.join("-stray-file"), "").unwrap();

        let listed = strata(root.path()).list_projects();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, PathBuf::from("/work/app"));
        assert_eq!(listed[0].name, "app");
    }

    #[test]
    fn search_defaults_to_all_kinds() {
        let root = tempfile::tempdir().unwrap();
        let s = strata(root.path());
        s.create_resource(ResourceKind::Agent, &Scope::Global, "a", "needle").unwrap();
        s.create_resource(ResourceKind::Skill, &Scope::Global, "b", "needle").unwrap();

        assert_eq!(s.search("NEEDLE", &[]).unwrap().len(), 2);
        assert_eq!(s.search("needle", &[ResourceKind::Skill]).unwrap().len(), 1);
    }
}
