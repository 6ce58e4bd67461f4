//! Ownership of hook and status-line commands.
//!
//! Claude Code stores hooks as bare shell strings with no id field, so
//! "ours" is decided every time a file is read. A command is ours when it
//! names the binary or package, or when it carries the auto-sync flag pair
//! (`--hook-trigger=<kind>` with `--hook-version=`), which covers auto-sync
//! hooks installed under any CLI path. Prompt and status-line commands have
//! no such pair, so they can only be installed under a CLI path that names
//! vibe-log (see `is_recognizable_cli_path`).
//!
//! These predicates are the only place the decision is made; keep them in
//! step with the builders in `composer`.

use crate::hooks::composer::{HookEvent, TriggerKind};
use crate::patterns::{RE_ALL_FLAG, RE_DISABLED_FLAG, RE_HOOK_TRIGGER, RE_HOOK_VERSION};
use std::fmt;

/// Binary name token.
pub const BINARY_TOKEN: &str = "vibe-log";
/// Scoped npm package alias.
pub const PACKAGE_ALIAS: &str = "@vibe-log";

/// True when the command belongs to vibe-log.
pub fn is_managed(command: &str) -> bool {
    names_vibe_log(command) || has_sync_flags(command)
}

/// True when commands built on `cli_path` are recognized without relying on
/// the auto-sync flags.
pub fn is_recognizable_cli_path(cli_path: &str) -> bool {
    names_vibe_log(cli_path)
}

fn names_vibe_log(command: &str) -> bool {
    command.contains(BINARY_TOKEN) || command.contains(PACKAGE_ALIAS)
}

/// A known `--hook-trigger=<kind>` together with `--hook-version=x.y.z`.
fn has_sync_flags(command: &str) -> bool {
    trigger_flag(command).is_some() && RE_HOOK_VERSION.is_match(command)
}

fn trigger_flag(command: &str) -> Option<TriggerKind> {
    let caps = RE_HOOK_TRIGGER.captures(command)?;
    TriggerKind::parse(&caps[1])
}

pub fn is_prompt_analysis(command: &str) -> bool {
    is_managed(command) && command.contains("analyze-prompt") && command.contains("--stdin")
}

pub fn is_status_line(command: &str) -> bool {
    is_managed(command) && command.contains("statusline")
}

pub fn is_challenge(command: &str) -> bool {
    is_managed(command) && command.contains("pushup-challenge")
}

/// Auto-sync hook for one trigger kind.
pub fn is_sync_trigger(command: &str, trigger: TriggerKind) -> bool {
    is_managed(command) && command.contains(&trigger.flag())
}

/// Any auto-sync hook, whatever its trigger.
pub fn is_sync_hook(command: &str) -> bool {
    sync_trigger(command).is_some()
}

/// Trigger kind of a managed auto-sync hook.
pub fn sync_trigger(command: &str) -> Option<TriggerKind> {
    if !is_managed(command) {
        return None;
    }
    trigger_flag(command)
}

/// Managed command carrying the all-projects marker.
pub fn has_all_flag(command: &str) -> bool {
    is_managed(command) && RE_ALL_FLAG.is_match(command)
}

pub fn is_disabled(command: &str) -> bool {
    RE_DISABLED_FLAG.is_match(command)
}

/// A capability vibe-log can install into Claude Code settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedFeature {
    AutoSync(TriggerKind),
    PromptAnalysis,
    StatusLine,
    Challenge,
}

impl ManagedFeature {
    pub const ALL: [ManagedFeature; 6] = [
        ManagedFeature::AutoSync(TriggerKind::SessionStart),
        ManagedFeature::AutoSync(TriggerKind::PreCompact),
        ManagedFeature::AutoSync(TriggerKind::SessionEnd),
        ManagedFeature::PromptAnalysis,
        ManagedFeature::StatusLine,
        ManagedFeature::Challenge,
    ];

    pub const AUTO_SYNC: [ManagedFeature; 3] = [
        ManagedFeature::AutoSync(TriggerKind::SessionStart),
        ManagedFeature::AutoSync(TriggerKind::PreCompact),
        ManagedFeature::AutoSync(TriggerKind::SessionEnd),
    ];

    pub fn name(self) -> &'static str {
        match self {
            ManagedFeature::AutoSync(TriggerKind::SessionStart) => "auto-sync-session-start",
            ManagedFeature::AutoSync(TriggerKind::PreCompact) => "auto-sync-precompact",
            ManagedFeature::AutoSync(TriggerKind::SessionEnd) => "auto-sync-session-end",
            ManagedFeature::PromptAnalysis => "prompt-analysis-hook",
            ManagedFeature::StatusLine => "status-line-display",
            ManagedFeature::Challenge => "challenge-hook",
        }
    }

    /// Hook event the feature lives under; `None` for the status line.
    pub fn event(self) -> Option<HookEvent> {
        match self {
            ManagedFeature::AutoSync(trigger) => Some(trigger.event()),
            ManagedFeature::PromptAnalysis | ManagedFeature::Challenge => {
                Some(HookEvent::UserPromptSubmit)
            }
            ManagedFeature::StatusLine => None,
        }
    }

    pub fn matches(self, command: &str) -> bool {
        match self {
            ManagedFeature::AutoSync(trigger) => is_sync_trigger(command, trigger),
            ManagedFeature::PromptAnalysis => is_prompt_analysis(command),
            ManagedFeature::StatusLine => is_status_line(command),
            ManagedFeature::Challenge => is_challenge(command),
        }
    }

    /// Which feature a managed command implements, if any.
    pub fn classify(command: &str) -> Option<ManagedFeature> {
        Self::ALL.into_iter().find(|feature| feature.matches(command))
    }
}

impl fmt::Display for ManagedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
