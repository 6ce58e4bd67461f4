//! Effective settings across the four scopes.
//!
//! Precedence, lowest first: global → project-shared → project-local →
//! enterprise.
//!
//! - Non-hook keys deep-merge: objects merge key by key, anything else is
//!   replaced by the higher scope.
//! - `hooks` merge per event: when two scopes define the same event, the
//!   higher scope's group list replaces the lower one wholesale.
//!
//! The result is a read-only view for status reporting. It is never written.

use crate::settings::{EventHooks, HookTable, Scope, SettingsDocument, SettingsStore};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::Path;

const HOOKS_KEY: &str = "hooks";

/// Merged view of every scope that applies to a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveSettings {
    /// Merged non-hook keys
    pub settings: Map<String, Value>,
    /// Merged hook table
    pub hooks: HookTable,
    /// Scope that supplied each event's hook list
    pub hook_sources: IndexMap<String, Scope>,
    /// Scopes whose file existed and parsed, lowest precedence first
    pub scopes_present: Vec<Scope>,
}

impl EffectiveSettings {
    /// The merged document as a single JSON object.
    pub fn to_value(&self) -> Value {
        let mut merged = self.settings.clone();
        if !self.hooks.is_empty() {
            if let Ok(hooks) = serde_json::to_value(&self.hooks) {
                merged.insert(HOOKS_KEY.to_string(), hooks);
            }
        }
        Value::Object(merged)
    }

    pub fn source_of(&self, event: &str) -> Option<Scope> {
        self.hook_sources.get(event).copied()
    }
}

/// Computes `EffectiveSettings` for a project.
pub struct ScopeMergeResolver<'a> {
    store: &'a SettingsStore,
}

impl<'a> ScopeMergeResolver<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    /// Reads every scope for `project` and merges them.
    pub fn resolve(&self, project: &Path) -> EffectiveSettings {
        let documents: Vec<SettingsDocument> = Scope::ASCENDING
            .iter()
            .filter_map(|&scope| self.store.read_scope(scope, Some(project)))
            .collect();
        merge_documents(&documents)
    }

    /// The merged document for `project` as plain JSON.
    pub fn merged_settings_for_project(&self, project: &Path) -> Value {
        self.resolve(project).to_value()
    }
}

/// Merges documents given in any order; precedence comes from each
/// document's scope.
pub fn merge_documents(documents: &[SettingsDocument]) -> EffectiveSettings {
    let mut ordered: Vec<&SettingsDocument> = documents.iter().collect();
    ordered.sort_by_key(|doc| doc.scope().precedence());

    let mut effective = EffectiveSettings::default();
    for doc in ordered {
        effective.scopes_present.push(doc.scope());

        for (key, value) in doc.root() {
            if key == HOOKS_KEY {
                continue;
            }
            match effective.settings.get_mut(key) {
                Some(existing) => merge_json_values(existing, value),
                None => {
                    effective.settings.insert(key.clone(), value.clone());
                }
            }
        }

        for (event, hooks) in doc.hooks().iter() {
            effective.hooks.insert(event, hooks.clone());
            effective.hook_sources.insert(event.to_string(), doc.scope());
        }
    }
    effective
}

/// Deep-merges `overlay` into `base`. Objects merge recursively; any other
/// overlay value replaces the base value.
pub fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Number of entries an event contributes in the merged view.
pub fn event_entry_count(hooks: &EventHooks) -> usize {
    match hooks {
        EventHooks::Groups(groups) => groups.iter().map(|g| g.entries().len()).sum(),
        EventHooks::Opaque(_) => 0,
    }
}
