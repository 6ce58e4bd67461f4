//! Typed views over Claude Code settings JSON.
//!
//! The document itself stays an order-preserving `serde_json::Map` so keys we
//! don't own keep their content and position. Only `hooks` and `statusLine`
//! are lifted into records. Each record keeps the object it was read from and
//! writes its typed fields back over it, so foreign keys, their order, and
//! explicit `null`s come back out unchanged.

use crate::error::{Result, VibeLogError};
use crate::settings::Scope;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};

/// Old lowercase event keys written by earlier releases. Deleted on every write.
pub const LEGACY_EVENT_KEYS: [&str; 2] = ["stop", "preCompact"];

const HOOKS_KEY: &str = "hooks";
const STATUS_LINE_KEY: &str = "statusLine";

// ═══════════════════════════════════════════════════════════════════════════════
// Record Fields
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads a typed field out of a raw record. Absent and `null` both read as
/// `None`; a value of the wrong type fails the whole record.
fn read_field<T, E>(raw: &Map<String, Value>, key: &str) -> std::result::Result<Option<T>, E>
where
    T: DeserializeOwned,
    E: serde::de::Error,
{
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| E::custom(format!("{key}: {e}"))),
    }
}

/// Writes a typed field over a raw record. A value replaces the old one in
/// place (or appends). `None` drops a key we cleared but leaves a `null` the
/// file already had.
fn write_field(raw: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            raw.insert(key.to_string(), value);
        }
        None => {
            if raw.get(key).is_some_and(|existing| !existing.is_null()) {
                raw.shift_remove(key);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Hook Records
// ═══════════════════════════════════════════════════════════════════════════════

/// A single hook command: `{"type": "command", "command": "...", "timeout": 30}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HookEntry {
    pub hook_type: Option<String>,
    pub command: Option<String>,
    pub timeout: Option<Number>,
    raw: Map<String, Value>,
}

impl HookEntry {
    /// A `type: command` entry.
    pub fn command(command: impl Into<String>, timeout: Option<u64>) -> Self {
        Self {
            hook_type: Some("command".to_string()),
            command: Some(command.into()),
            timeout: timeout.map(Number::from),
            raw: Map::new(),
        }
    }

    pub fn command_str(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Field outside `type`/`command`/`timeout`, as read from the file.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        match key {
            "type" | "command" | "timeout" => None,
            _ => self.raw.get(key),
        }
    }
}

impl Serialize for HookEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut fields = self.raw.clone();
        write_field(&mut fields, "type", self.hook_type.clone().map(Value::String));
        write_field(&mut fields, "command", self.command.clone().map(Value::String));
        write_field(&mut fields, "timeout", self.timeout.clone().map(Value::Number));
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HookEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            hook_type: read_field::<_, D::Error>(&raw, "type")?,
            command: read_field::<_, D::Error>(&raw, "command")?,
            timeout: read_field::<_, D::Error>(&raw, "timeout")?,
            raw,
        })
    }
}

/// `{"matcher": "...", "hooks": [...]}`. Several groups may exist per event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HookGroup {
    pub matcher: Option<String>,
    pub hooks: Option<Vec<HookEntry>>,
    raw: Map<String, Value>,
}

impl HookGroup {
    pub fn new(matcher: Option<&str>, entry: HookEntry) -> Self {
        Self {
            matcher: matcher.map(str::to_string),
            hooks: Some(vec![entry]),
            raw: Map::new(),
        }
    }

    pub fn entries(&self) -> &[HookEntry] {
        self.hooks.as_deref().unwrap_or_default()
    }
}

impl Serialize for HookGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let hooks = self
            .hooks
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(S::Error::custom)?;
        let mut fields = self.raw.clone();
        write_field(&mut fields, "matcher", self.matcher.clone().map(Value::String));
        write_field(&mut fields, "hooks", hooks);
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HookGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            matcher: read_field::<_, D::Error>(&raw, "matcher")?,
            hooks: read_field::<_, D::Error>(&raw, "hooks")?,
            raw,
        })
    }
}

/// Value stored under one event name.
///
/// Anything that doesn't match the documented group shape is kept as-is so
/// it can be written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventHooks {
    Groups(Vec<HookGroup>),
    Opaque(Value),
}

/// Ordered map from event name to its hook groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookTable(IndexMap<String, EventHooks>);

impl HookTable {
    /// Parses the `hooks` value of a settings file. A missing or non-object
    /// value yields an empty table.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(value @ Value::Object(_)) => {
                serde_json::from_value(value.clone()).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_event(&self, event: &str) -> bool {
        self.0.contains_key(event)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventHooks)> {
        self.0.iter().map(|(event, hooks)| (event.as_str(), hooks))
    }

    pub fn get(&self, event: &str) -> Option<&EventHooks> {
        self.0.get(event)
    }

    /// Sets an event's value, keeping its position when it already exists.
    pub fn insert(&mut self, event: impl Into<String>, hooks: EventHooks) {
        self.0.insert(event.into(), hooks);
    }

    pub fn remove_event(&mut self, event: &str) -> Option<EventHooks> {
        self.0.shift_remove(event)
    }

    /// Groups for an event, or `None` when absent or opaque.
    pub fn groups(&self, event: &str) -> Option<&[HookGroup]> {
        match self.0.get(event)? {
            EventHooks::Groups(groups) => Some(groups),
            EventHooks::Opaque(_) => None,
        }
    }

    pub fn groups_mut(&mut self, event: &str) -> Option<&mut Vec<HookGroup>> {
        match self.0.get_mut(event)? {
            EventHooks::Groups(groups) => Some(groups),
            EventHooks::Opaque(_) => None,
        }
    }

    /// Groups for an event, creating an empty list when absent.
    /// Returns `None` when the event holds an opaque value.
    pub fn groups_or_insert(&mut self, event: &str) -> Option<&mut Vec<HookGroup>> {
        let hooks = self
            .0
            .entry(event.to_string())
            .or_insert_with(|| EventHooks::Groups(Vec::new()));
        match hooks {
            EventHooks::Groups(groups) => Some(groups),
            EventHooks::Opaque(_) => None,
        }
    }

    /// Every entry registered for `event`, in file order.
    pub fn entries<'a>(&'a self, event: &str) -> impl Iterator<Item = &'a HookEntry> + 'a {
        self.groups(event)
            .unwrap_or_default()
            .iter()
            .flat_map(|group| group.entries().iter())
    }

    /// Every entry in the table with its event name, in file order.
    pub fn iter_entries(&self) -> impl Iterator<Item = (&str, &HookEntry)> {
        self.0.iter().flat_map(|(event, hooks)| {
            let groups: &[HookGroup] = match hooks {
                EventHooks::Groups(groups) => groups,
                EventHooks::Opaque(_) => &[],
            };
            groups
                .iter()
                .flat_map(move |group| group.entries().iter().map(move |e| (event.as_str(), e)))
        })
    }

    /// Mutable access to every entry, in file order.
    pub fn for_each_entry_mut<F: FnMut(&str, &mut HookEntry)>(&mut self, mut f: F) {
        for (event, hooks) in self.0.iter_mut() {
            if let EventHooks::Groups(groups) = hooks {
                for entry in groups.iter_mut().filter_map(|g| g.hooks.as_mut()).flatten() {
                    f(event, entry);
                }
            }
        }
    }

    /// Keeps only entries for which `keep` returns true and returns how many
    /// were removed.
    ///
    /// A group that loses its last entry is dropped, an event that loses its
    /// last group is dropped. Groups or events that were already empty are
    /// left alone.
    pub fn retain_entries<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str, &HookEntry) -> bool,
    {
        let mut removed = 0;
        let mut emptied_events = Vec::new();

        for (event, hooks) in self.0.iter_mut() {
            let EventHooks::Groups(groups) = hooks else {
                continue;
            };
            let mut removed_here = 0;
            groups.retain_mut(|group| {
                let Some(entries) = group.hooks.as_mut() else {
                    return true;
                };
                let before = entries.len();
                entries.retain(|entry| keep(event, entry));
                let dropped = before - entries.len();
                removed_here += dropped;
                !(dropped > 0 && entries.is_empty())
            });
            removed += removed_here;
            if removed_here > 0 && groups.is_empty() {
                emptied_events.push(event.clone());
            }
        }

        for event in emptied_events {
            self.0.shift_remove(&event);
        }
        removed
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Line
// ═══════════════════════════════════════════════════════════════════════════════

/// `{"type": "command", "command": "...", "padding": 0}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusLine {
    pub line_type: Option<String>,
    pub command: Option<String>,
    pub padding: Option<Number>,
    raw: Map<String, Value>,
}

impl StatusLine {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            line_type: Some("command".to_string()),
            command: Some(command.into()),
            padding: Some(Number::from(0)),
            raw: Map::new(),
        }
    }
}

impl Serialize for StatusLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut fields = self.raw.clone();
        write_field(&mut fields, "type", self.line_type.clone().map(Value::String));
        write_field(&mut fields, "command", self.command.clone().map(Value::String));
        write_field(&mut fields, "padding", self.padding.clone().map(Value::Number));
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatusLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            line_type: read_field::<_, D::Error>(&raw, "type")?,
            command: read_field::<_, D::Error>(&raw, "command")?,
            padding: read_field::<_, D::Error>(&raw, "padding")?,
            raw,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Settings Document
// ═══════════════════════════════════════════════════════════════════════════════

/// One settings file as read from a single scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument {
    scope: Scope,
    path: PathBuf,
    root: Map<String, Value>,
}

impl SettingsDocument {
    pub fn empty(scope: Scope, path: impl Into<PathBuf>) -> Self {
        Self::from_map(scope, path, Map::new())
    }

    pub fn from_map(scope: Scope, path: impl Into<PathBuf>, root: Map<String, Value>) -> Self {
        Self {
            scope,
            path: path.into(),
            root,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_root(self) -> Map<String, Value> {
        self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// True only when `key` holds the boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.root.get(key) == Some(&Value::Bool(true))
    }

    pub fn hooks(&self) -> HookTable {
        HookTable::from_value(self.root.get(HOOKS_KEY))
    }

    /// Replaces the `hooks` object. An empty table removes the key.
    pub fn set_hooks(&mut self, table: &HookTable) -> Result<()> {
        if table.is_empty() {
            if matches!(self.root.get(HOOKS_KEY), Some(Value::Object(_))) {
                self.root.shift_remove(HOOKS_KEY);
            }
            return Ok(());
        }
        let value = serde_json::to_value(table).map_err(|source| VibeLogError::Serialize {
            context: "hooks".to_string(),
            source,
        })?;
        self.root.insert(HOOKS_KEY.to_string(), value);
        Ok(())
    }

    pub fn status_line(&self) -> Option<StatusLine> {
        self.root
            .get(STATUS_LINE_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Replaces or removes the `statusLine` object.
    pub fn set_status_line(&mut self, status_line: Option<&StatusLine>) -> Result<()> {
        match status_line {
            Some(line) => {
                let value =
                    serde_json::to_value(line).map_err(|source| VibeLogError::Serialize {
                        context: "statusLine".to_string(),
                        source,
                    })?;
                self.root.insert(STATUS_LINE_KEY.to_string(), value);
            }
            None => {
                self.root.shift_remove(STATUS_LINE_KEY);
            }
        }
        Ok(())
    }

    /// Deletes legacy lowercase event keys, and `hooks` itself if that
    /// leaves it empty. Returns true if anything was removed.
    pub fn strip_legacy_events(&mut self) -> bool {
        let Some(Value::Object(hooks)) = self.root.get_mut(HOOKS_KEY) else {
            return false;
        };
        let mut stripped = false;
        for key in LEGACY_EVENT_KEYS {
            stripped |= hooks.shift_remove(key).is_some();
        }
        if stripped && hooks.is_empty() {
            self.root.shift_remove(HOOKS_KEY);
        }
        stripped
    }
}
