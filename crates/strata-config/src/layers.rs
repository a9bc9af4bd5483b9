use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use strata_jsonpath::get_at_path;
use strata_types::{parse_object, JsonObject, JsonValue, LayerSource};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Directory inside a project that holds its settings and resources.
pub const PROJECT_CONFIG_DIR: &str = ".claude";

/// One settings file as read from disk.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    pub source: LayerSource,
    pub file_path: PathBuf,
    /// Whether the file exists, even if its content is unusable.
    pub exists: bool,
    /// Parsed content; `None` when the file is missing, unparseable, or not
    /// a JSON object.
    pub content: Option<JsonObject>,
}

impl ConfigLayer {
    /// Read one layer. Never fails.
    pub fn read(source: LayerSource, file_path: PathBuf) -> Self {
        let (exists, content) = match fs::read(&file_path) {
            Ok(bytes) => (true, parse_object(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (false, None),
            // Present but unreadable counts as broken, not absent.
            Err(_) => (true, None),
        };
        if exists && content.is_none() {
            debug!(path = %file_path.display(), %source, "settings layer exists but is not a JSON object");
        }
        Self { source, file_path, exists, content }
    }

    /// File present with unusable content.
    pub fn is_broken(&self) -> bool {
        self.exists && self.content.is_none()
    }
}

/// Merged view over every layer plus the layers themselves.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub merged: JsonObject,
    /// Layers in merge order, lowest priority first.
    pub layers: Vec<ConfigLayer>,
}

impl EffectiveConfig {
    /// Merged value at a dotted key path.
    pub fn get(&self, key_path: &str) -> Option<&JsonValue> {
        get_at_path(&self.merged, key_path)
    }

    /// The highest-priority layer that defines `key_path`.
    pub fn provenance(&self, key_path: &str) -> Option<LayerSource> {
        self.layers
            .iter()
            .rev()
            .find(|layer| {
                layer
                    .content
                    .as_ref()
                    .is_some_and(|c| get_at_path(c, key_path).is_some())
            })
            .map(|layer| layer.source)
    }

    pub fn layer(&self, source: LayerSource) -> Option<&ConfigLayer> {
        self.layers.iter().find(|l| l.source == source)
    }
}

/// Reader for the settings layers under one configuration root.
#[derive(Clone, Debug)]
pub struct ConfigLayers {
    root: PathBuf,
}

impl ConfigLayers {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the settings file for `source`.
    pub fn layer_path(&self, source: LayerSource, project: Option<&Path>) -> ConfigResult<PathBuf> {
        resolve_layer_path(&self.root, source, project)
    }

    /// Read the global layers and, when `project` is given, the project
    /// layers, then deep-merge them in priority order.
    pub fn merge(&self, project: Option<&Path>) -> EffectiveConfig {
        let project = project.filter(|p| !p.as_os_str().is_empty());

        let layers: Vec<ConfigLayer> = LayerSource::ALL
            .into_iter()
            .filter_map(|source| {
                resolve_layer_path(&self.root, source, project)
                    .ok()
                    .map(|path| ConfigLayer::read(source, path))
            })
            .collect();

        let merged = layers
            .iter()
            .filter_map(|layer| layer.content.as_ref())
            .fold(JsonObject::new(), deep_merge);

        EffectiveConfig { merged, layers }
    }
}

/// Map a layer to its file. Project layers need `project`.
pub fn resolve_layer_path(
    root: &Path,
    source: LayerSource,
    project: Option<&Path>,
) -> ConfigResult<PathBuf> {
    if !source.is_project_scoped() {
        return Ok(root.join(source.file_name()));
    }
    match project {
        Some(p) if !p.as_os_str().is_empty() => {
            Ok(p.join(PROJECT_CONFIG_DIR).join(source.file_name()))
        }
        _ => Err(ConfigError::ProjectRequired(source.to_string())),
    }
}

/// Merge `overlay` into `base`.
///
/// Where both sides hold an object the merge recurses; in every other case,
/// arrays included, the overlay's value replaces the base's.
pub fn deep_merge(mut base: JsonObject, overlay: &JsonObject) -> JsonObject {
    for (key, incoming) in overlay {
        if let (Some(JsonValue::Object(existing)), JsonValue::Object(nested)) =
            (base.get_mut(key), incoming)
        {
            let merged = deep_merge(std::mem::take(existing), nested);
            *existing = merged;
            continue;
        }
        base.insert(key.clone(), incoming.clone());
    }
    base
}
