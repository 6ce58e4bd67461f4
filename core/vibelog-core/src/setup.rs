//! Read-only reporting on what vibe-log has installed.
//!
//! This module handles:
//! - Detecting policy flags that block hook installation
//! - Per-feature install / enabled / version state
//! - Per-project view of the merged hook table
//!
//! Nothing here writes. The lifecycle controller consults
//! `check_policy_blocks` before any install.

use crate::hooks::composer::{hook_version, needs_update, HookEvent, HookVersion};
use crate::hooks::mode::{TrackingMode, TrackingModeResolver};
use crate::hooks::predicate::{is_disabled, is_managed, ManagedFeature};
use crate::projects::ProjectDiscovery;
use crate::settings::{Scope, ScopeMergeResolver, SettingsDocument, SettingsStore};
use std::path::{Path, PathBuf};

/// Returns a reason when settings forbid user hooks.
///
/// Checks `disableAllHooks` and `allowManagedHooksOnly` in the global
/// settings, the user-level `settings.local.json`, and enterprise policy.
pub fn check_policy_blocks(store: &SettingsStore) -> Option<String> {
    let storage = store.storage();
    let mut candidates = vec![
        (Scope::Global, storage.global_settings_file()),
        (
            Scope::Global,
            storage.claude_root().join("settings.local.json"),
        ),
    ];
    if let Some(enterprise) = storage.enterprise_settings_file() {
        candidates.push((Scope::Enterprise, enterprise.to_path_buf()));
    }

    for (scope, path) in candidates {
        let Some(settings) = store.read(scope, &path) else {
            continue;
        };
        if settings.flag("disableAllHooks") {
            return Some(format!(
                "Hooks disabled by disableAllHooks in {}",
                path.display()
            ));
        }
        if settings.flag("allowManagedHooksOnly") {
            return Some(format!(
                "Only managed hooks allowed by allowManagedHooksOnly in {}",
                path.display()
            ));
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Types
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureState {
    pub feature: ManagedFeature,
    pub installed: bool,
    pub enabled: bool,
    /// Embedded hook version (auto-sync only)
    pub version: Option<HookVersion>,
    pub needs_update: bool,
    /// Settings file the entry was found in
    pub location: Option<PathBuf>,
}

impl FeatureState {
    fn absent(feature: ManagedFeature) -> Self {
        Self {
            feature,
            installed: false,
            enabled: false,
            version: None,
            needs_update: false,
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStatus {
    pub mode: TrackingMode,
    pub tracked_projects: Vec<String>,
    pub features: Vec<FeatureState>,
    pub policy_block: Option<String>,
}

impl FeatureStatus {
    pub fn feature(&self, feature: ManagedFeature) -> Option<&FeatureState> {
        self.features.iter().find(|state| state.feature == feature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHookStatus {
    pub event: HookEvent,
    /// Scope whose hook list won the merge
    pub source: Option<Scope>,
    pub managed: usize,
    pub foreign: usize,
    /// At least one managed entry without `--disabled`
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHookStatus {
    pub project: PathBuf,
    pub scopes_present: Vec<Scope>,
    pub events: Vec<EventHookStatus>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Checker
// ═══════════════════════════════════════════════════════════════════════════════

pub struct SetupChecker<'a> {
    store: &'a SettingsStore,
    discovery: &'a dyn ProjectDiscovery,
}

impl<'a> SetupChecker<'a> {
    pub fn new(store: &'a SettingsStore, discovery: &'a dyn ProjectDiscovery) -> Self {
        Self { store, discovery }
    }

    pub fn feature_status(&self) -> FeatureStatus {
        let resolver = TrackingModeResolver::new(self.store, self.discovery);
        let mode = resolver.mode();
        let tracked = resolver.tracked_project_identities();

        let mut documents: Vec<SettingsDocument> =
            self.store.read_scope(Scope::Global, None).into_iter().collect();
        documents.extend(
            tracked
                .iter()
                .filter_map(|project| self.store.read_scope(Scope::ProjectLocal, Some(&project.path))),
        );

        let features = ManagedFeature::ALL
            .into_iter()
            .map(|feature| feature_state(feature, &documents))
            .collect();

        FeatureStatus {
            mode,
            tracked_projects: tracked.into_iter().map(|project| project.key).collect(),
            features,
            policy_block: check_policy_blocks(self.store),
        }
    }

    /// Hook state for one project, as Claude Code would see it after merging
    /// every scope.
    pub fn project_hook_status(&self, project: &Path) -> ProjectHookStatus {
        let effective = ScopeMergeResolver::new(self.store).resolve(project);

        let events = HookEvent::ALL
            .into_iter()
            .filter(|event| effective.hooks.contains_event(event.as_str()))
            .map(|event| {
                let commands: Vec<&str> = effective
                    .hooks
                    .entries(event.as_str())
                    .filter_map(|entry| entry.command_str())
                    .collect();
                let managed: Vec<&str> = commands
                    .iter()
                    .copied()
                    .filter(|command| is_managed(command))
                    .collect();
                EventHookStatus {
                    event,
                    source: effective.source_of(event.as_str()),
                    managed: managed.len(),
                    foreign: commands.len() - managed.len(),
                    enabled: managed.iter().any(|command| !is_disabled(command)),
                }
            })
            .collect();

        ProjectHookStatus {
            project: project.to_path_buf(),
            scopes_present: effective.scopes_present,
            events,
        }
    }
}

fn feature_state(feature: ManagedFeature, documents: &[SettingsDocument]) -> FeatureState {
    let found = documents.iter().find_map(|document| {
        let command = match feature.event() {
            Some(event) => document
                .hooks()
                .entries(event.as_str())
                .filter_map(|entry| entry.command_str())
                .find(|command| feature.matches(command))
                .map(str::to_string),
            None => document
                .status_line()
                .and_then(|line| line.command)
                .filter(|command| feature.matches(command)),
        }?;
        Some((document.path().to_path_buf(), command))
    });

    let Some((location, command)) = found else {
        return FeatureState::absent(feature);
    };
    let is_sync = matches!(feature, ManagedFeature::AutoSync(_));
    FeatureState {
        feature,
        installed: true,
        enabled: !is_disabled(&command),
        version: is_sync.then(|| hook_version(&command)),
        needs_update: is_sync && needs_update(&command),
        location: Some(location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::composer::{TriggerKind, HOOK_VERSION};
    use crate::projects::ProjectIdentity;
    use crate::storage::StorageConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_env() -> (TempDir, SettingsStore) {
        let temp = TempDir::new().unwrap();
        let storage =
            StorageConfig::with_roots(temp.path().join(".vibe-log"), temp.path().join(".claude"))
                .with_enterprise_settings(Some(temp.path().join("managed-settings.json")));
        (temp, SettingsStore::new(storage))
    }

    fn write_json(path: &Path, value: serde_json::Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn test_policy_blocks() {
        let (temp, store) = setup_test_env();
        assert!(check_policy_blocks(&store).is_none());

        write_json(
            &temp.path().join(".claude/settings.local.json"),
            json!({"allowManagedHooksOnly": true}),
        );
        let reason = check_policy_blocks(&store).unwrap();
        assert!(reason.contains("allowManagedHooksOnly"));

        std::fs::remove_file(temp.path().join(".claude/settings.local.json")).unwrap();
        write_json(
            &temp.path().join("managed-settings.json"),
            json!({"disableAllHooks": true}),
        );
        assert!(check_policy_blocks(&store)
            .unwrap()
            .contains("disableAllHooks"));

        write_json(
            &temp.path().join("managed-settings.json"),
            json!({"disableAllHooks": false}),
        );
        assert!(check_policy_blocks(&store).is_none());
    }

    #[test]
    fn test_feature_status_reports_versions() {
        let (_temp, store) = setup_test_env();
        write_json(
            &store.storage().global_settings_file(),
            json!({
                "hooks": {
                    "SessionStart": [{"hooks": [{"type": "command",
                        "command": format!("vibe-log send --hook-trigger=sessionstart --hook-version={} --all", HOOK_VERSION)}]}],
                    "PreCompact": [{"hooks": [{"type": "command",
                        "command": "vibe-log send --hook-trigger=precompact --all --disabled"}]}]
                },
                "statusLine": {"type": "command", "command": "npx vibe-log-cli statusline"}
            }),
        );
        let projects: Vec<ProjectIdentity> = Vec::new();
        let status = SetupChecker::new(&store, &projects).feature_status();

        assert_eq!(status.mode, TrackingMode::All);
        assert!(status.tracked_projects.is_empty());
        assert!(status.policy_block.is_none());

        let start = status
            .feature(ManagedFeature::AutoSync(TriggerKind::SessionStart))
            .unwrap();
        assert!(start.installed && start.enabled && !start.needs_update);
        assert_eq!(start.version, Some(HOOK_VERSION));

        let compact = status
            .feature(ManagedFeature::AutoSync(TriggerKind::PreCompact))
            .unwrap();
        assert!(compact.installed && !compact.enabled && compact.needs_update);

        let end = status
            .feature(ManagedFeature::AutoSync(TriggerKind::SessionEnd))
            .unwrap();
        assert!(!end.installed);

        let line = status.feature(ManagedFeature::StatusLine).unwrap();
        assert!(line.installed);
        assert_eq!(line.version, None);
    }

    #[test]
    fn test_project_hook_status_uses_merged_view() {
        let (temp, store) = setup_test_env();
        let project = temp.path().join("app");
        std::fs::create_dir_all(&project).unwrap();
        write_json(
            &store.storage().global_settings_file(),
            json!({"hooks": {
                "PreCompact": [{"hooks": [{"type": "command", "command": "echo global"}]}],
                "SessionEnd": [{"hooks": [{"type": "command", "command": "echo end"}]}]
            }}),
        );
        write_json(
            &store.storage().project_local_settings_file(&project),
            json!({"hooks": {"PreCompact": [{"hooks": [
                {"type": "command", "command": "vibe-log send --hook-trigger=precompact"},
                {"type": "command", "command": "echo local"}
            ]}]}}),
        );

        let projects: Vec<ProjectIdentity> = Vec::new();
        let status = SetupChecker::new(&store, &projects).project_hook_status(&project);
        assert_eq!(status.scopes_present, vec![Scope::Global, Scope::ProjectLocal]);

        let compact = status
            .events
            .iter()
            .find(|e| e.event == HookEvent::PreCompact)
            .unwrap();
        assert_eq!(compact.source, Some(Scope::ProjectLocal));
        assert_eq!((compact.managed, compact.foreign), (1, 1));
        assert!(compact.enabled);

        let end = status
            .events
            .iter()
            .find(|e| e.event == HookEvent::SessionEnd)
            .unwrap();
        assert_eq!(end.source, Some(Scope::Global));
        assert_eq!((end.managed, end.foreign), (0, 1));
        assert!(!end.enabled);
    }
}
