//! Tracking mode: which projects auto-sync is active for.
//!
//! Nothing records the mode directly. It is inferred from settings contents
//! on every call:
//!
//! 1. Enterprise policy: `disableAllHooks` → `none`; a managed auto-sync
//!    hook → `all`.
//! 2. A managed `--all` entry in global settings → `all` (skips step 3).
//! 3. Any project-local settings with a managed entry → `selected`.
//! 4. Otherwise `none`.

use crate::hooks::predicate::{has_all_flag, is_managed, is_sync_hook};
use crate::projects::{ProjectDiscovery, ProjectIdentity};
use crate::settings::{Scope, SettingsDocument, SettingsStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Global hooks with `--all`; every project syncs.
    All,
    /// Hooks in chosen projects' local settings.
    Selected,
    /// No auto-sync hooks anywhere.
    None,
}

impl TrackingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingMode::All => "all",
            TrackingMode::Selected => "selected",
            TrackingMode::None => "none",
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TrackingMode::All),
            "selected" => Ok(TrackingMode::Selected),
            "none" => Ok(TrackingMode::None),
            _ => Err(format!("unknown tracking mode: {s}")),
        }
    }
}

/// Infers the tracking mode from settings contents.
pub struct TrackingModeResolver<'a> {
    store: &'a SettingsStore,
    discovery: &'a dyn ProjectDiscovery,
}

impl<'a> TrackingModeResolver<'a> {
    pub fn new(store: &'a SettingsStore, discovery: &'a dyn ProjectDiscovery) -> Self {
        Self { store, discovery }
    }

    pub fn mode(&self) -> TrackingMode {
        if let Some(mode) = self.enterprise_override() {
            tracing::debug!(mode = %mode, "Tracking mode set by enterprise policy");
            return mode;
        }
        if self.global_tracks_all() {
            return TrackingMode::All;
        }
        if self.scan_projects().is_empty() {
            TrackingMode::None
        } else {
            TrackingMode::Selected
        }
    }

    /// Folder keys of projects whose local settings hold a managed entry.
    /// Empty unless the mode is `selected`.
    pub fn tracked_projects(&self) -> Vec<String> {
        self.tracked_project_identities()
            .into_iter()
            .map(|project| project.key)
            .collect()
    }

    /// Same as `tracked_projects`, with full identities.
    pub fn tracked_project_identities(&self) -> Vec<ProjectIdentity> {
        if self.enterprise_override().is_some() || self.global_tracks_all() {
            return Vec::new();
        }
        self.scan_projects()
    }

    fn enterprise_override(&self) -> Option<TrackingMode> {
        let enterprise = self.store.read_scope(Scope::Enterprise, None)?;
        if enterprise.flag("disableAllHooks") {
            return Some(TrackingMode::None);
        }
        let has_sync_hook = enterprise
            .hooks()
            .iter_entries()
            .filter_map(|(_, entry)| entry.command_str())
            .any(is_sync_hook);
        has_sync_hook.then_some(TrackingMode::All)
    }

    fn global_tracks_all(&self) -> bool {
        self.store
            .read_scope(Scope::Global, None)
            .is_some_and(|doc| document_has(&doc, has_all_flag))
    }

    fn scan_projects(&self) -> Vec<ProjectIdentity> {
        self.discovery
            .discover()
            .into_iter()
            .filter(|project| {
                self.store
                    .read_scope(Scope::ProjectLocal, Some(&project.path))
                    .is_some_and(|doc| document_has(&doc, is_managed))
            })
            .collect()
    }
}

fn document_has(doc: &SettingsDocument, predicate: fn(&str) -> bool) -> bool {
    doc.hooks()
        .iter_entries()
        .filter_map(|(_, entry)| entry.command_str())
        .any(predicate)
}
