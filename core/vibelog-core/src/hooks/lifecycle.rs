//! Install, uninstall, toggle, and rewrite vibe-log hooks.
//!
//! Every operation is one read → modify → write of a single settings file.
//! No-ops (already installed, nothing to remove, already in the requested
//! state) never touch the disk. Entries we don't own keep their content and
//! position.

use crate::error::{Result, VibeLogError};
use crate::hooks::composer::{
    build_analysis_command, build_challenge_command, build_sync_command, HookEvent, TriggerKind,
    ANALYSIS_HOOK_TIMEOUT_SECONDS, CHALLENGE_HOOK_TIMEOUT_SECONDS, SYNC_HOOK_TIMEOUT_SECONDS,
};
use crate::hooks::mode::TrackingMode;
use crate::hooks::predicate::{
    is_disabled, is_managed, is_recognizable_cli_path, is_status_line, ManagedFeature,
};
use crate::patterns::{RE_CLI_PREFIX, RE_DISABLED_STRIP};
use crate::projects::ProjectDiscovery;
use crate::settings::{HookEntry, HookGroup, HookTable, Scope, SettingsDocument, SettingsStore};
use crate::setup::check_policy_blocks;
use std::path::{Path, PathBuf};

/// Which settings file an operation edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsTarget {
    /// `~/.claude/settings.json`
    Global,
    /// `<project>/.claude/settings.local.json`
    Project(PathBuf),
}

impl SettingsTarget {
    pub fn scope(&self) -> Scope {
        match self {
            SettingsTarget::Global => Scope::Global,
            SettingsTarget::Project(_) => Scope::ProjectLocal,
        }
    }

    fn resolve(&self, store: &SettingsStore) -> Result<PathBuf> {
        match self {
            SettingsTarget::Global => Ok(store.storage().global_settings_file()),
            SettingsTarget::Project(project) => {
                validate_project(project)?;
                Ok(store.storage().project_local_settings_file(project))
            }
        }
    }
}

fn validate_project(project: &Path) -> Result<()> {
    let reason = if !project.is_absolute() {
        "path must be absolute"
    } else if !project.is_dir() {
        "directory does not exist"
    } else {
        return Ok(());
    };
    Err(VibeLogError::InvalidProjectPath {
        path: project.display().to_string(),
        reason: reason.to_string(),
    })
}

/// Auto-sync triggers to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSelection {
    pub session_start: bool,
    pub pre_compact: bool,
    pub session_end: bool,
}

impl HookSelection {
    pub fn all() -> Self {
        Self {
            session_start: true,
            pre_compact: true,
            session_end: true,
        }
    }

    pub fn only(trigger: TriggerKind) -> Self {
        Self {
            session_start: trigger == TriggerKind::SessionStart,
            pre_compact: trigger == TriggerKind::PreCompact,
            session_end: trigger == TriggerKind::SessionEnd,
        }
    }

    pub fn triggers(&self) -> Vec<TriggerKind> {
        TriggerKind::ALL
            .into_iter()
            .filter(|trigger| match trigger {
                TriggerKind::SessionStart => self.session_start,
                TriggerKind::PreCompact => self.pre_compact,
                TriggerKind::SessionEnd => self.session_end,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers().is_empty()
    }
}

impl Default for HookSelection {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub selection: HookSelection,
    pub cli_path: String,
    pub mode: TrackingMode,
    /// Replace equivalent entries instead of refusing.
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Events that gained a new entry
    pub installed: Vec<HookEvent>,
    /// Events whose existing entry was rewritten (force only)
    pub replaced: Vec<HookEvent>,
    /// Events that already had an equivalent entry (with `force`: an
    /// identical one)
    pub skipped: Vec<HookEvent>,
    /// Events whose value isn't a list of hook groups; left untouched
    pub unrecognized: Vec<HookEvent>,
}

impl InstallOutcome {
    /// True when the settings file was written.
    pub fn changed(&self) -> bool {
        !self.installed.is_empty() || !self.replaced.is_empty()
    }
}

/// Requested end state for `set_tracking_mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChange {
    All,
    Selected(Vec<PathBuf>),
    None,
}

/// Drives hook state transitions against a `SettingsStore`.
pub struct HookLifecycleController<'a> {
    store: &'a SettingsStore,
}

impl<'a> HookLifecycleController<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Install
    // ═══════════════════════════════════════════════════════════════════════════

    /// Adds auto-sync hooks for the selected triggers.
    ///
    /// A trigger counts as installed when any managed entry for it exists,
    /// disabled or pointing at an old CLI path. Without `force`, a request
    /// where every trigger is already installed fails with `AlreadyInstalled`.
    pub fn install(
        &self,
        target: &SettingsTarget,
        request: &InstallRequest,
    ) -> Result<InstallOutcome> {
        self.ensure_not_blocked()?;
        let path = target.resolve(self.store)?;
        let mut document = self.store.load(target.scope(), &path);
        let mut table = document.hooks();
        let mut outcome = InstallOutcome::default();

        for trigger in request.selection.triggers() {
            let command = build_sync_command(trigger, &request.cli_path, request.mode);
            let entry = HookEntry::command(command, Some(SYNC_HOOK_TIMEOUT_SECONDS));
            upsert(
                &mut table,
                trigger.event(),
                entry,
                |cmd| ManagedFeature::AutoSync(trigger).matches(cmd),
                request.force,
                &mut outcome,
            );
        }

        if !outcome.changed() {
            let feature = describe_events("auto-sync", &outcome.skipped);
            return unchanged(outcome, request.force, feature, &path);
        }

        document.set_hooks(&table)?;
        self.store.write(&document)?;
        tracing::info!(
            path = %path.display(),
            mode = %request.mode,
            installed = outcome.installed.len(),
            replaced = outcome.replaced.len(),
            "Installed auto-sync hooks"
        );
        Ok(outcome)
    }

    /// Installs a single feature. Auto-sync features take their mode from the
    /// target: global means all projects, a project target means selected.
    pub fn install_feature(
        &self,
        target: &SettingsTarget,
        feature: ManagedFeature,
        cli_path: &str,
        force: bool,
    ) -> Result<InstallOutcome> {
        let (command, timeout) = match feature {
            ManagedFeature::AutoSync(trigger) => {
                let mode = match target {
                    SettingsTarget::Global => TrackingMode::All,
                    SettingsTarget::Project(_) => TrackingMode::Selected,
                };
                let request = InstallRequest {
                    selection: HookSelection::only(trigger),
                    cli_path: cli_path.to_string(),
                    mode,
                    force,
                };
                return self.install(target, &request);
            }
            ManagedFeature::StatusLine => {
                return Err(VibeLogError::UnsupportedFeature {
                    feature: feature.name().to_string(),
                })
            }
            _ if !is_recognizable_cli_path(cli_path) => {
                return Err(VibeLogError::UnrecognizedCliPath {
                    cli_path: cli_path.trim().to_string(),
                    feature: feature.name().to_string(),
                })
            }
            ManagedFeature::PromptAnalysis => {
                (build_analysis_command(cli_path), ANALYSIS_HOOK_TIMEOUT_SECONDS)
            }
            ManagedFeature::Challenge => {
                (build_challenge_command(cli_path), CHALLENGE_HOOK_TIMEOUT_SECONDS)
            }
        };

        self.ensure_not_blocked()?;
        let path = target.resolve(self.store)?;
        let mut document = self.store.load(target.scope(), &path);
        let mut table = document.hooks();
        let mut outcome = InstallOutcome::default();

        upsert(
            &mut table,
            HookEvent::UserPromptSubmit,
            HookEntry::command(command, Some(timeout)),
            |cmd| feature.matches(cmd),
            force,
            &mut outcome,
        );

        if !outcome.changed() {
            return unchanged(outcome, force, feature.name().to_string(), &path);
        }

        document.set_hooks(&table)?;
        self.store.write(&document)?;
        tracing::info!(path = %path.display(), feature = %feature, "Installed hook");
        Ok(outcome)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Uninstall
    // ═══════════════════════════════════════════════════════════════════════════

    /// Removes every managed hook entry from the target file.
    pub fn uninstall(&self, target: &SettingsTarget) -> Result<usize> {
        let path = target.resolve(self.store)?;
        let removed = self.remove_entries(target.scope(), &path, |cmd| is_managed(cmd))?;
        if removed == 0 {
            return Err(VibeLogError::NoManagedEntries { path });
        }
        Ok(removed)
    }

    /// Removes only the entries implementing the given features.
    pub fn uninstall_features(
        &self,
        target: &SettingsTarget,
        features: &[ManagedFeature],
    ) -> Result<usize> {
        let path = target.resolve(self.store)?;
        let removed = self.remove_entries(target.scope(), &path, |cmd| {
            features.iter().any(|feature| feature.matches(cmd))
        })?;
        if removed == 0 {
            return Err(VibeLogError::NoManagedEntries { path });
        }
        Ok(removed)
    }

    /// Removes entries matching `owned`, writing only when something went.
    fn remove_entries<F>(&self, scope: Scope, path: &Path, owned: F) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        let Some(mut document) = self.store.read(scope, path) else {
            return Ok(0);
        };
        let mut table = document.hooks();
        let removed =
            table.retain_entries(|_, entry| !entry.command_str().is_some_and(|cmd| owned(cmd)));
        if removed == 0 {
            return Ok(0);
        }

        document.set_hooks(&table)?;
        self.store.write(&document)?;
        tracing::info!(path = %path.display(), removed, "Removed hook entries");
        Ok(removed)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Toggle
    // ═══════════════════════════════════════════════════════════════════════════

    /// Enables or disables the first managed entry for `event`. Returns false
    /// when it was already in the requested state.
    pub fn toggle(&self, target: &SettingsTarget, event: HookEvent, enable: bool) -> Result<bool> {
        let path = target.resolve(self.store)?;
        let not_installed = || VibeLogError::HookNotInstalled {
            event: event.to_string(),
        };
        let mut document = self
            .store
            .read(target.scope(), &path)
            .ok_or_else(not_installed)?;
        let mut table = document.hooks();

        let entry = table
            .groups_mut(event.as_str())
            .and_then(|groups| {
                groups
                    .iter_mut()
                    .filter_map(|group| group.hooks.as_mut())
                    .flatten()
                    .find(|entry| entry.command_str().is_some_and(is_managed))
            })
            .ok_or_else(not_installed)?;

        let Some(command) = entry.command.as_mut() else {
            return Err(not_installed());
        };
        if is_disabled(command) != enable {
            return Ok(false);
        }
        let updated = if enable {
            RE_DISABLED_STRIP.replace_all(command, "$1").into_owned()
        } else {
            format!("{} --disabled", command)
        };
        *command = updated;

        document.set_hooks(&table)?;
        self.store.write(&document)?;
        tracing::info!(path = %path.display(), event = %event, enable, "Toggled hook");
        Ok(true)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLI Path
    // ═══════════════════════════════════════════════════════════════════════════

    /// Points every managed hook and the status line at a new CLI invocation,
    /// keeping each command's subcommand and flags. Returns how many commands
    /// changed.
    ///
    /// Auto-sync hooks stay recognizable under any path. Prompt hooks and
    /// the status line don't, so a path without the vibe-log name is refused
    /// while the file still holds one of those.
    pub fn update_cli_path(&self, target: &SettingsTarget, cli_path: &str) -> Result<usize> {
        let path = target.resolve(self.store)?;
        let Some(mut document) = self.store.read(target.scope(), &path) else {
            return Ok(0);
        };
        let cli_path = cli_path.trim();
        let recognizable = is_recognizable_cli_path(cli_path);
        let mut rewritten = 0;
        let mut stranded = None;

        let mut table = document.hooks();
        table.for_each_entry_mut(|_, entry| {
            let Some(command) = entry.command.as_mut() else {
                return;
            };
            let Some(feature) = ManagedFeature::classify(command) else {
                return;
            };
            if !recognizable && !matches!(feature, ManagedFeature::AutoSync(_)) {
                stranded.get_or_insert(feature);
                return;
            }
            if let Some(updated) = replace_cli_prefix(command, cli_path) {
                *command = updated;
                rewritten += 1;
            }
        });

        let mut status_line = document.status_line();
        if let Some(command) = status_line
            .as_mut()
            .and_then(|line| line.command.as_mut())
            .filter(|command| is_status_line(command))
        {
            if !recognizable {
                stranded.get_or_insert(ManagedFeature::StatusLine);
            } else if let Some(updated) = replace_cli_prefix(command, cli_path) {
                *command = updated;
                rewritten += 1;
            }
        }

        if let Some(feature) = stranded {
            return Err(VibeLogError::UnrecognizedCliPath {
                cli_path: cli_path.to_string(),
                feature: feature.name().to_string(),
            });
        }
        if rewritten == 0 {
            return Ok(0);
        }
        document.set_hooks(&table)?;
        if status_line.is_some() {
            document.set_status_line(status_line.as_ref())?;
        }
        self.store.write(&document)?;
        tracing::info!(path = %path.display(), cli_path, rewritten, "Updated CLI path");
        Ok(rewritten)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Tracking Mode
    // ═══════════════════════════════════════════════════════════════════════════

    /// Moves auto-sync hooks so the inferred tracking mode becomes `change`.
    ///
    /// - `All`: install globally with `--all`, clear every discovered project.
    /// - `Selected`: clear global, install into each listed project, clear
    ///   discovered projects that aren't listed.
    /// - `None`: clear global and every discovered project.
    ///
    /// Returns the settings files that were written.
    pub fn set_tracking_mode(
        &self,
        change: &ModeChange,
        selection: HookSelection,
        cli_path: &str,
        discovery: &dyn ProjectDiscovery,
    ) -> Result<Vec<PathBuf>> {
        if !matches!(change, ModeChange::None) {
            self.ensure_not_blocked()?;
        }

        let listed: Vec<PathBuf> = match change {
            ModeChange::Selected(projects) => projects.clone(),
            _ => Vec::new(),
        };
        for project in &listed {
            validate_project(project)?;
        }

        let mut written = Vec::new();
        let global = self.store.storage().global_settings_file();

        match change {
            ModeChange::All => {
                let request = InstallRequest {
                    selection,
                    cli_path: cli_path.to_string(),
                    mode: TrackingMode::All,
                    force: true,
                };
                if self.install(&SettingsTarget::Global, &request)?.changed() {
                    written.push(global);
                }
            }
            ModeChange::Selected(_) | ModeChange::None => {
                if self.remove_entries(Scope::Global, &global, is_auto_sync)? > 0 {
                    written.push(global);
                }
            }
        }

        for project in discovery.discover() {
            if listed.contains(&project.path) {
                continue;
            }
            let path = self.store.storage().project_local_settings_file(&project.path);
            if self.remove_entries(Scope::ProjectLocal, &path, is_auto_sync)? > 0 {
                written.push(path);
            }
        }

        for project in listed {
            let request = InstallRequest {
                selection,
                cli_path: cli_path.to_string(),
                mode: TrackingMode::Selected,
                force: true,
            };
            if self
                .install(&SettingsTarget::Project(project.clone()), &request)?
                .changed()
            {
                written.push(self.store.storage().project_local_settings_file(&project));
            }
        }

        tracing::info!(files = written.len(), "Changed tracking mode");
        Ok(written)
    }

    fn ensure_not_blocked(&self) -> Result<()> {
        match check_policy_blocks(self.store) {
            Some(reason) => Err(VibeLogError::PolicyBlocked { reason }),
            None => Ok(()),
        }
    }
}

fn is_auto_sync(command: &str) -> bool {
    ManagedFeature::AUTO_SYNC
        .iter()
        .any(|feature| feature.matches(command))
}

/// Adds `entry` under `event` unless an entry matching `equivalent` exists.
/// With `force`, matching entries get the new command and timeout instead.
fn upsert<F>(
    table: &mut HookTable,
    event: HookEvent,
    entry: HookEntry,
    equivalent: F,
    force: bool,
    outcome: &mut InstallOutcome,
) where
    F: Fn(&str) -> bool,
{
    let Some(groups) = table.groups_or_insert(event.as_str()) else {
        tracing::warn!(event = %event, "Hook event holds an unrecognized value, leaving it alone");
        outcome.unrecognized.push(event);
        return;
    };

    let exists = groups
        .iter()
        .flat_map(|group| group.entries())
        .any(|e| e.command_str().is_some_and(&equivalent));

    if exists {
        let up_to_date = groups
            .iter()
            .flat_map(|group| group.entries())
            .filter(|e| e.command_str().is_some_and(&equivalent))
            .all(|e| e.command == entry.command && e.timeout == entry.timeout);
        if !force || up_to_date {
            outcome.skipped.push(event);
            return;
        }
        let current = groups
            .iter_mut()
            .filter_map(|group| group.hooks.as_mut())
            .flatten()
            .filter(|e| e.command_str().is_some_and(&equivalent));
        for current in current {
            current.command = entry.command.clone();
            current.timeout = entry.timeout.clone();
        }
        outcome.replaced.push(event);
        return;
    }

    match groups.first_mut() {
        Some(group) => group.hooks.get_or_insert_with(Vec::new).push(entry),
        None => groups.push(HookGroup::new(event.default_matcher(), entry)),
    }
    outcome.installed.push(event);
}

/// Result of an install that wrote nothing. An unrecognized event value
/// wins over "already installed"; a forced request that found everything
/// up to date is fine.
fn unchanged(
    outcome: InstallOutcome,
    force: bool,
    feature: String,
    path: &Path,
) -> Result<InstallOutcome> {
    if !outcome.unrecognized.is_empty() {
        return Err(VibeLogError::UnrecognizedHookValue {
            events: describe_events("hooks", &outcome.unrecognized),
            path: path.to_path_buf(),
        });
    }
    if outcome.skipped.is_empty() || force {
        return Ok(outcome);
    }
    Err(VibeLogError::AlreadyInstalled { feature })
}

fn replace_cli_prefix(command: &str, cli_path: &str) -> Option<String> {
    let caps = RE_CLI_PREFIX.captures(command)?;
    let updated = format!("{} {}", cli_path, &caps["rest"]);
    (updated != command).then_some(updated)
}

fn describe_events(feature: &str, events: &[HookEvent]) -> String {
    let names: Vec<&str> = events.iter().map(|event| event.as_str()).collect();
    format!("{} ({})", feature, names.join(", "))
}

/// Convenience for callers that only have a document in hand.
pub fn managed_entry_count(document: &SettingsDocument) -> usize {
    document
        .hooks()
        .iter_entries()
        .filter(|(_, entry)| entry.command_str().is_some_and(is_managed))
        .count()
}
