//! Hook definitions stored under the `hooks` key of a settings file.
//!
//! ```json
//! {"hooks": {"PreToolUse": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "lint"}]}]}}
//! ```
//!
//! A hook is addressed by its event and its position in that event's list
//! ([`HookId`], written `PreToolUse:0`). Positions shift when an earlier hook
//! is removed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use strata_backup::BackupManager;
use strata_fs::{read_json_object_lossy, write_json_pretty};
use strata_types::{BackupOperation, JsonObject, JsonValue};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Settings key holding the hooks map.
pub const HOOKS_KEY: &str = "hooks";

/// Command type written for new hook commands.
const COMMAND_TYPE: &str = "command";

/// Lifecycle events a hook can attach to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookEvent {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    Notification,
    Stop,
    SubagentStop,
}

impl HookEvent {
    pub const ALL: [HookEvent; 7] = [
        Self::SessionStart,
        Self::UserPromptSubmit,
        Self::PreToolUse,
        Self::PostToolUse,
        Self::Notification,
        Self::Stop,
        Self::SubagentStop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "SessionStart",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::Notification => "Notification",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidHookEvent(s.to_string()))
    }
}

/// One entry in a definition's `hooks` list.
///
/// Only `type` is required. Non-command hooks carry no `command`, and fields
/// this type does not name (`timeout`, `prompt`, ...) are kept in `extra`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl HookCommand {
    /// A shell command hook.
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            kind: COMMAND_TYPE.to_string(),
            command: Some(command.into()),
            extra: JsonObject::new(),
        }
    }
}

/// A matcher plus the commands it triggers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDefinition {
    #[serde(default)]
    pub hooks: Vec<HookCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl HookDefinition {
    /// Definition running `commands` as shell hooks. An empty matcher is
    /// stored as no matcher.
    pub fn from_commands<I, S>(commands: I, matcher: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hooks: commands.into_iter().map(HookCommand::shell).collect(),
            matcher: matcher.filter(|m| !m.is_empty()),
            extra: JsonObject::new(),
        }
    }
}

/// Position of a hook: `<event>:<index>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId {
    pub event: HookEvent,
    pub index: usize,
}

impl HookId {
    pub fn new(event: HookEvent, index: usize) -> Self {
        Self { event, index }
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.event, self.index)
    }
}

impl FromStr for HookId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (event, index) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidHookId(s.to_string()))?;
        let index = index
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidHookId(s.to_string()))?;
        Ok(Self::new(event.parse()?, index))
    }
}

impl Serialize for HookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A hook as listed: its id plus its definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HookEntry {
    pub id: HookId,
    #[serde(flatten)]
    pub definition: HookDefinition,
}

/// CRUD over the hooks of one settings file.
///
/// Only the event being changed is rewritten; keys this store does not
/// understand are carried through untouched.
#[derive(Clone, Debug)]
pub struct HookStore {
    backups: BackupManager,
}

impl HookStore {
    pub fn new(backups: BackupManager) -> Self {
        Self { backups }
    }

    /// Every hook in `file`, in event order then position.
    ///
    /// A missing file or a missing `hooks` key contributes nothing. An event
    /// list that does not parse is an error.
    pub fn list(&self, file: &Path) -> ConfigResult<Vec<HookEntry>> {
        let hooks = hooks_object(&read_json_object_lossy(file));
        let mut entries = Vec::new();
        for event in HookEvent::ALL {
            let defs = definitions(&hooks, event)?;
            entries.extend(defs.into_iter().enumerate().map(|(index, definition)| HookEntry {
                id: HookId::new(event, index),
                definition,
            }));
        }
        Ok(entries)
    }

    /// Append a hook to `event` and return its id.
    pub fn add(&self, file: &Path, event: HookEvent, definition: HookDefinition) -> ConfigResult<HookId> {
        let mut settings = read_json_object_lossy(file);
        let mut hooks = hooks_object(&settings);
        let mut defs = definitions(&hooks, event)?;
        defs.push(definition);
        let id = HookId::new(event, defs.len() - 1);

        put_definitions(&mut hooks, event, defs)?;
        self.commit(file, &mut settings, hooks)?;
        debug!(path = %file.display(), hook = %id, "hook added");
        Ok(id)
    }

    /// Replace the hook at `id`.
    pub fn update(&self, file: &Path, id: HookId, definition: HookDefinition) -> ConfigResult<()> {
        let mut settings = read_json_object_lossy(file);
        let mut hooks = hooks_object(&settings);
        let mut defs = definitions(&hooks, id.event)?;
        let slot = defs
            .get_mut(id.index)
            .ok_or_else(|| ConfigError::HookNotFound(id.to_string()))?;
        *slot = definition;

        put_definitions(&mut hooks, id.event, defs)?;
        self.commit(file, &mut settings, hooks)?;
        debug!(path = %file.display(), hook = %id, "hook updated");
        Ok(())
    }

    /// Remove the hook at `id`. An event left with no hooks is dropped.
    pub fn remove(&self, file: &Path, id: HookId) -> ConfigResult<HookDefinition> {
        let mut settings = read_json_object_lossy(file);
        let mut hooks = hooks_object(&settings);
        let mut defs = definitions(&hooks, id.event)?;
        if id.index >= defs.len() {
            return Err(ConfigError::HookNotFound(id.to_string()));
        }
        let removed = defs.remove(id.index);

        put_definitions(&mut hooks, id.event, defs)?;
        self.commit(file, &mut settings, hooks)?;
        debug!(path = %file.display(), hook = %id, "hook removed");
        Ok(removed)
    }

    fn commit(&self, file: &Path, settings: &mut JsonObject, hooks: JsonObject) -> ConfigResult<()> {
        if hooks.is_empty() {
            settings.remove(HOOKS_KEY);
        } else {
            settings.insert(HOOKS_KEY.to_string(), JsonValue::Object(hooks));
        }
        self.backups.backup(file, BackupOperation::Update);
        write_json_pretty(file, settings)?;
        Ok(())
    }
}

fn hooks_object(settings: &JsonObject) -> JsonObject {
    match settings.get(HOOKS_KEY) {
        Some(JsonValue::Object(hooks)) => hooks.clone(),
        _ => JsonObject::new(),
    }
}

/// Parsed definitions of `event`. Absent or `null` is an empty list; anything
/// else that is not a list of definitions is refused so it is never
/// overwritten.
fn definitions(hooks: &JsonObject, event: HookEvent) -> ConfigResult<Vec<HookDefinition>> {
    match hooks.get(event.as_str()) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| ConfigError::MalformedHooks {
            event: event.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn put_definitions(hooks: &mut JsonObject, event: HookEvent, defs: Vec<HookDefinition>) -> ConfigResult<()> {
    if defs.is_empty() {
        hooks.remove(event.as_str());
    } else {
        hooks.insert(event.as_str().to_string(), serde_json::to_value(defs)?);
    }
    Ok(())
}
