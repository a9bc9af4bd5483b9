use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use strata_sdk::{
    HookDefinition, HookEvent, InstructionsKind, LayerSource, ProjectId, ResourceKind,
    SchedulerKind, Scope, SdkError, Strata, StrataConfig,
};

fn open(root: &Path) -> Strata {
    Strata::open(StrataConfig {
        scheduler: SchedulerKind::Disabled,
        ..StrataConfig::with_root(root)
    })
}

/// Temp dir whose absolute path contains no `-`, so it encodes to a project
/// id that decodes back to itself. Random suffixes are alphanumeric.
fn dashless_tempdir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("strata")
        .tempdir_in("/tmp")
        .unwrap()
}

/// Register `project` under `root`.
fn register(root: &Path, project: &Path) -> ProjectId {
    let id = ProjectId::encode(project);
    assert_eq!(id.decode().unwrap(), project, "project path must round-trip");
    fs::create_dir_all(root.join("projects").join(id.as_str())).unwrap();
    id
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn settings_change_can_be_undone() {
    let root = tempfile::tempdir().unwrap();
    let settings = root.path().join("settings.json");
    fs::write(&settings, r#"{"model":"opus"}"#).unwrap();
    let s = open(root.path());

    s.set_setting(LayerSource::Global, None, "model", json!("haiku")).unwrap();
    assert_eq!(read_json(&settings), json!({"model": "haiku"}));

    let backups = s.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].original_path, settings);

    s.restore_backup(backups[0].id.as_str()).unwrap();
    assert_eq!(fs::read(&settings).unwrap(), br#"{"model":"opus"}"#);
    // The restore itself was snapshotted.
    assert_eq!(s.list_backups().unwrap().len(), 2);
}

#[test]
fn project_layers_override_global() {
    let root = tempfile::tempdir().unwrap();
    let project = dashless_tempdir();
    let id = register(root.path(), project.path());
    let s = open(root.path());

    s.set_setting(LayerSource::Global, None, "a", json!({"x": 1, "y": 2})).unwrap();
    s.set_setting(LayerSource::GlobalLocal, None, "b", json!("hello")).unwrap();
    s.set_setting(LayerSource::ProjectLocal, Some(&id), "a.y", json!(99)).unwrap();

    let effective = s.effective_config(Some(&id)).unwrap();
    assert_eq!(effective.layers.len(), 4);
    assert_eq!(
        serde_json::Value::Object(effective.merged.clone()),
        json!({"a": {"x": 1, "y": 99}, "b": "hello"})
    );
    assert_eq!(effective.provenance("a.y"), Some(LayerSource::ProjectLocal));
    assert_eq!(effective.provenance("a.x"), Some(LayerSource::Global));
    assert!(project.path().join(".claude").join("settings.local.json").is_file());

    let global_only = s.effective_config(None).unwrap();
    assert_eq!(global_only.layers.len(), 2);
    assert_eq!(global_only.get("a.y"), Some(&json!(2)));
}

#[test]
fn move_between_layers() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());
    s.set_setting(LayerSource::Global, None, "permissions.allow", json!(["Read"])).unwrap();

    s.move_setting(LayerSource::Global, LayerSource::GlobalLocal, None, "permissions")
        .unwrap();
    assert_eq!(read_json(&root.path().join("settings.json")), json!({}));
    assert_eq!(
        read_json(&root.path().join("settings.local.json")),
        json!({"permissions": {"allow": ["Read"]}})
    );

    let err = s
        .move_setting(LayerSource::Global, LayerSource::GlobalLocal, None, "permissions")
        .unwrap_err();
    assert!(matches!(err, SdkError::Settings(strata_config::ConfigError::KeyNotFound(_))));
}

#[test]
fn resource_lifecycle_with_recovery() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());
    let scope = Scope::Global;

    s.create_resource(ResourceKind::Agent, &scope, "reviewer", "---\nname: Reviewer\n---\nv1")
        .unwrap();
    s.update_resource(ResourceKind::Agent, &scope, "reviewer", "---\nname: Reviewer\n---\nv2")
        .unwrap();
    assert_eq!(s.get_resource(ResourceKind::Agent, &scope, "reviewer").unwrap().body, "v2");

    s.delete_resource(ResourceKind::Agent, &scope, "reviewer").unwrap();
    assert!(s.list_resources(ResourceKind::Agent, &scope).unwrap().is_empty());

    // Newest first: the delete snapshot holds v2, the update snapshot v1.
    let backups = s.list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    s.restore_backup(backups[1].id.as_str()).unwrap();
    let restored = s.get_resource(ResourceKind::Agent, &scope, "reviewer").unwrap();
    assert_eq!(restored.name, "Reviewer");
    assert_eq!(restored.body, "v1");
}

#[test]
fn resource_id_and_duplicate_checks() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());

    let err = s
        .create_resource(ResourceKind::Command, &Scope::Global, "../escape", "x")
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::Resource(strata_resource::ResourceError::InvalidResourceId(_))
    ));

    s.create_resource(ResourceKind::Command, &Scope::Global, "deploy", "x").unwrap();
    let err = s
        .create_resource(ResourceKind::Command, &Scope::Global, "deploy", "y")
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::Resource(strata_resource::ResourceError::ResourceAlreadyExists(_))
    ));
}

#[test]
fn project_scoped_resources_live_in_project() {
    let root = tempfile::tempdir().unwrap();
    let project = dashless_tempdir();
    let id = register(root.path(), project.path());
    let s = open(root.path());
    let scope = Scope::Project(id);

    let created = s.create_resource(ResourceKind::Skill, &scope, "lint", "run lint").unwrap();
    assert_eq!(
        created.file_path,
        project.path().join(".claude").join("skills").join("lint.md")
    );
    assert!(s.list_resources(ResourceKind::Skill, &Scope::Global).unwrap().is_empty());
}

#[test]
fn plugin_managed_project_is_read_only() {
    let root = dashless_tempdir();
    let cached = root.path().join("plugins").join("cache").join("acme");
    fs::create_dir_all(cached.join(".claude").join("agents")).unwrap();
    let id = register(root.path(), &cached);
    let s = open(root.path());
    let scope = Scope::Project(id);

    let err = s.create_resource(ResourceKind::Agent, &scope, "bot", "x").unwrap_err();
    assert!(matches!(err, SdkError::PluginManaged(_)));
    assert!(!cached.join(".claude").join("agents").join("bot.md").exists());

    // Reads are still allowed.
    assert!(s.list_resources(ResourceKind::Agent, &scope).unwrap().is_empty());
    assert!(matches!(
        s.add_hook(&scope, HookEvent::Stop, HookDefinition::default()),
        Err(SdkError::PluginManaged(_))
    ));
}

#[test]
fn hooks_through_facade() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());

    let def = HookDefinition::from_commands(["notify-send done"], None);
    let id = s.add_hook(&Scope::Global, HookEvent::Stop, def.clone()).unwrap();
    let listed = s.list_hooks(&Scope::Global).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);

    assert_eq!(s.remove_hook(&Scope::Global, id).unwrap(), def);
    assert!(s.list_hooks(&Scope::Global).unwrap().is_empty());
    assert_eq!(read_json(&root.path().join("settings.json")), json!({}));
}

#[test]
fn allowed_roots_and_traversal() {
    let root = tempfile::tempdir().unwrap();
    let extra = tempfile::tempdir().unwrap();
    let projects_file = root.path().join("projects.json");
    let listed = extra.path().to_string_lossy().into_owned();
    fs::write(&projects_file, serde_json::to_vec(&json!([&listed, &listed, ""])).unwrap()).unwrap();

    let s = Strata::open(StrataConfig {
        projects_file: Some(projects_file),
        scheduler: SchedulerKind::Disabled,
        ..StrataConfig::with_root(root.path())
    });

    let roots = s.allowed_roots();
    assert_eq!(roots.len(), 2);
    assert!(roots.contains(&root.path().to_path_buf()));
    assert!(roots.contains(&extra.path().to_path_buf()));

    assert!(s.check_path(&extra.path().join("CLAUDE.md")).is_ok());
    let escape: PathBuf = root.path().join("..").join("etc").join("passwd");
    assert!(matches!(
        s.check_path(&escape),
        Err(SdkError::Fs(strata_fs::FsError::PathOutsideAllowedRoots(_)))
    ));
}

#[test]
fn restore_rejects_malformed_ids() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());
    assert!(matches!(
        s.restore_backup("../../settings"),
        Err(SdkError::Backup(strata_backup::BackupError::InvalidBackupId(_)))
    ));
}

#[test]
fn config_file_drives_retention() {
    let root = tempfile::tempdir().unwrap();
    let config = root.path().join("strata.toml");
    fs::write(
        &config,
        format!("root = {:?}\nretention_days = 1\nscheduler = \"none\"\n", root.path()),
    )
    .unwrap();
    let s = Strata::open(StrataConfig::from_file(&config).unwrap());
    assert_eq!(s.root(), root.path());

    let old = root.path().join("backups").join("old");
    fs::create_dir_all(&old).unwrap();
    fs::write(
        old.join("meta.json"),
        r#"{"originalPath":"/x","operation":"update","timestamp":"2020-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    fs::write(old.join("file"), "x").unwrap();

    let report = s.prune_backups();
    assert_eq!(report.removed_expired, 1);
    assert!(!old.exists());
}

#[test]
fn instructions_in_global_and_project_scope() {
    let root = tempfile::tempdir().unwrap();
    let project = dashless_tempdir();
    let id = register(root.path(), project.path());
    let s = open(root.path());

    let global = s.get_instructions(&Scope::Global).unwrap();
    assert!(!global.main.exists && !global.local.exists);

    s.update_instructions(&Scope::Global, InstructionsKind::Main, "global rules").unwrap();
    s.update_instructions(&Scope::Global, InstructionsKind::Main, "global rules v2").unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("CLAUDE.md")).unwrap(),
        "global rules v2"
    );

    let scope = Scope::Project(id);
    let written = s
        .update_instructions(&scope, InstructionsKind::Local, "local notes")
        .unwrap();
    assert_eq!(written.file_path, project.path().join("CLAUDE.local.md"));
    let both = s.get_instructions(&scope).unwrap();
    assert!(!both.main.exists);
    assert_eq!(both.local.content.as_deref(), Some("local notes"));

    // Only the overwrite of an existing file was snapshotted.
    let backups = s.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    s.restore_backup(backups[0].id.as_str()).unwrap();
    assert_eq!(fs::read_to_string(root.path().join("CLAUDE.md")).unwrap(), "global rules");
}

#[test]
fn instructions_need_a_registered_project() {
    let root = tempfile::tempdir().unwrap();
    let s = open(root.path());
    let scope = Scope::Project(ProjectId::from("-nowhere-at-all"));
    assert!(matches!(
        s.update_instructions(&scope, InstructionsKind::Main, "x"),
        Err(SdkError::Fs(strata_fs::FsError::ProjectNotRegistered(_)))
    ));
}

#[test]
fn project_memory_lifecycle() {
    let root = tempfile::tempdir().unwrap();
    let project = dashless_tempdir();
    let id = register(root.path(), project.path());
    let s = open(root.path());

    assert!(s.list_memory(&id).unwrap().is_empty());
    let created = s.create_memory(&id, "decisions.md", "use sqlite\nno orm").unwrap();
    assert_eq!(
        created.file_path,
        root.path().join("projects").join(id.as_str()).join("memory").join("decisions.md")
    );
    s.update_memory(&id, "decisions.md", "use postgres").unwrap();
    assert_eq!(s.get_memory(&id, "decisions.md").unwrap().content, "use postgres");

    let listed = s.list_memory(&id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].preview, "use postgres");

    s.delete_memory(&id, "decisions.md").unwrap();
    assert!(s.list_memory(&id).unwrap().is_empty());

    // Newest first: the delete snapshot, then the update snapshot.
    let backups = s.list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    s.restore_backup(backups[1].id.as_str()).unwrap();
    assert_eq!(s.get_memory(&id, "decisions.md").unwrap().content, "use sqlite\nno orm");
}

#[test]
fn memory_rejects_bad_names_and_unregistered_projects() {
    let root = tempfile::tempdir().unwrap();
    let project = dashless_tempdir();
    let id = register(root.path(), project.path());
    let s = open(root.path());

    for bad in ["notes.txt", "../escape.md", "a/b.md"] {
        assert!(matches!(
            s.create_memory(&id, bad, "x"),
            Err(SdkError::Resource(strata_resource::ResourceError::InvalidMemoryFilename(_)))
        ));
    }
    assert!(matches!(
        s.list_memory(&ProjectId::from("-not-registered")),
        Err(SdkError::Fs(strata_fs::FsError::ProjectNotRegistered(_)))
    ));
    assert!(!root.path().join("projects").join("-not-registered").exists());
}
