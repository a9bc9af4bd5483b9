//! Sandboxed path resolution.
//!
//! Paths are resolved lexically: relative paths are joined onto the current
//! directory, `.` segments are dropped and `..` pops the previous segment.
//! The check is purely textual; it does not consult the filesystem, so a
//! candidate that does not exist yet can still be validated before it is
//! created.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use strata_types::{ProjectId, TypeError};
use tracing::debug;

use crate::error::{FsError, FsResult};

/// Subdirectory of the configuration root holding registration markers.
pub const PROJECTS_DIR: &str = "projects";

/// Resolve `path` to an absolute, lexically normalised form.
pub fn normalize(path: &Path) -> FsResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Ok(out)
}

/// Verify that `candidate` resolves to one of `allowed_roots` or a
/// descendant of one, returning the resolved path.
///
/// Roots that cannot be resolved are skipped.
pub fn assert_safe_path<P: AsRef<Path>>(candidate: &Path, allowed_roots: &[P]) -> FsResult<PathBuf> {
    if candidate.as_os_str().is_empty() {
        return Err(FsError::EmptyPath);
    }
    let resolved = normalize(candidate)?;

    let inside = allowed_roots
        .iter()
        .filter_map(|root| normalize(root.as_ref()).ok())
        .any(|root| resolved.starts_with(&root));

    if inside {
        Ok(resolved)
    } else {
        debug!(path = %resolved.display(), "rejected path outside allowed roots");
        Err(FsError::PathOutsideAllowedRoots(resolved))
    }
}

/// Returns `true` if `<root>/projects/<id>/` exists as a directory.
pub fn project_registered(root: &Path, id: &ProjectId) -> bool {
    if !is_single_component(id.as_str()) {
        return false;
    }
    root.join(PROJECTS_DIR).join(id.as_str()).is_dir()
}

/// Resolve a registered project's id to its filesystem path.
///
/// Registration, not the allow-list, is the authority for project-scoped
/// operations: an id is accepted only if its marker directory exists.
pub fn resolve_project_path(root: &Path, id: &ProjectId) -> FsResult<PathBuf> {
    if id.as_str().is_empty() {
        return Err(FsError::Type(TypeError::EmptyPath));
    }
    if !project_registered(root, id) {
        return Err(FsError::ProjectNotRegistered(id.clone()));
    }
    Ok(id.decode()?)
}

/// Collect the filesystem roots caller-supplied paths may resolve under.
///
/// Always contains `root`. Adds every non-empty path listed in
/// `projects_file` (a JSON array of strings; missing or malformed files are
/// ignored) and the decoded path of every registered project. The result is
/// deduplicated and sorted.
pub fn allowed_roots(root: &Path, projects_file: Option<&Path>) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut add = |p: &Path| {
        if let Ok(abs) = normalize(p) {
            seen.insert(abs);
        }
    };

    add(root);

    if let Some(file) = projects_file {
        let listed = fs::read(file)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Vec<String>>(&bytes).ok())
            .unwrap_or_default();
        for p in listed.iter().filter(|p| !p.is_empty()) {
            add(Path::new(p));
        }
    }

    if let Ok(entries) = fs::read_dir(root.join(PROJECTS_DIR)) {
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let id = ProjectId::new(entry.file_name().to_string_lossy().into_owned());
            if let Ok(decoded) = id.decode() {
                add(&decoded);
            }
        }
    }

    seen.into_iter().collect()
}

fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(std::path::is_separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dot_segments() {
        let p = normalize(Path::new("/a/./b/../c")).unwrap();
        assert_eq!(p, PathBuf::from("/a/c"));
    }

    #[test]
    fn normalize_clamps_at_root() {
        assert_eq!(normalize(Path::new("/../../x")).unwrap(), PathBuf::from("/x"));
    }

    #[test]
    fn normalize_makes_relative_absolute() {
        let p = normalize(Path::new("rel/file")).unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("rel/file"));
    }

    #[test]
    fn root_itself_is_allowed() {
        let resolved = assert_safe_path(Path::new("/root"), &["/root"]).unwrap();
        assert_eq!(resolved, PathBuf::from("/root"));
    }

    #[test]
    fn descendant_is_allowed() {
        let resolved = assert_safe_path(Path::new("/root/a/../b/c.json"), &["/root"]).unwrap();
        assert_eq!(resolved, PathBuf::from("/root/b/c.json"));
    }

    #[test]
    fn traversal_is_rejected() {
        let err = assert_safe_path(Path::new("/root/../etc/passwd"), &["/root"]).unwrap_err();
        match err {
            FsError::PathOutsideAllowedRoots(p) => assert_eq!(p, PathBuf::from("/etc/passwd")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sibling_prefix_is_rejected() {
        // `/rootkit` shares a textual prefix with `/root` but is not inside it.
        assert!(matches!(
            assert_safe_path(Path::new("/rootkit/x"), &["/root"]),
            Err(FsError::PathOutsideAllowedRoots(_))
        ));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            assert_safe_path(Path::new(""), &["/root"]),
            Err(FsError::EmptyPath)
        ));
    }

    #[test]
    fn any_root_may_match() {
        let roots = [PathBuf::from("/a"), PathBuf::from("/b")];
        assert!(assert_safe_path(Path::new("/b/x"), &roots).is_ok());
        assert!(assert_safe_path(Path::new("/c/x"), &roots).is_err());
    }

    #[test]
    fn registration_requires_marker_dir() {
        let dir = tempfile::tempdir().unwrap();
        let id = ProjectId::new("-work-app");
        assert!(!project_registered(dir.path(), &id));

        fs::create_dir_all(dir.path().join(PROJECTS_DIR).join("-work-app")).unwrap();
        assert!(project_registered(dir.path(), &id));
        assert_eq!(
            resolve_project_path(dir.path(), &id).unwrap(),
            PathBuf::from("/work/app")
        );
    }

    #[test]
    fn registration_marker_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(PROJECTS_DIR)).unwrap();
        fs::write(dir.path().join(PROJECTS_DIR).join("-file"), b"").unwrap();
        assert!(!project_registered(dir.path(), &ProjectId::new("-file")));
    }

    #[test]
    fn traversal_ids_are_never_registered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(PROJECTS_DIR)).unwrap();
        assert!(!project_registered(dir.path(), &ProjectId::new("..")));
        assert!(!project_registered(dir.path(), &ProjectId::new("../projects")));
    }

    #[test]
    fn unregistered_project_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_project_path(dir.path(), &ProjectId::new("-nope")),
            Err(FsError::ProjectNotRegistered(_))
        ));
        assert!(matches!(
            resolve_project_path(dir.path(), &ProjectId::new("")),
            Err(FsError::Type(TypeError::EmptyPath))
        ));
    }

    #[test]
    fn allowed_roots_collects_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("home");
        fs::create_dir_all(root.join(PROJECTS_DIR).join("-srv-api")).unwrap();
        fs::create_dir_all(root.join(PROJECTS_DIR).join("-")).unwrap();

        let list = dir.path().join("projects.json");
        fs::write(&list, br#"["/srv/api", "/opt/tool", ""]"#).unwrap();

        let roots = allowed_roots(&root, Some(&list));
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/opt/tool"),
                PathBuf::from("/srv/api"),
                normalize(&root).unwrap(),
            ]
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn allowed_roots_ignores_malformed_project_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("projects.json");
        fs::write(&list, b"{\"not\": \"an array\"}").unwrap();
        let roots = allowed_roots(dir.path(), Some(&list));
        assert_eq!(roots, vec![normalize(dir.path()).unwrap()]);
    }
}
