//! Canonical hook commands and matchers.
//!
//! Auto-sync grammar:
//!
//! ```text
//! <cli> send --silent --background --hook-trigger=<trigger> --hook-version=<x.y.z> [--all | --claude-project-dir="$CLAUDE_PROJECT_DIR"]
//! ```
//!
//! The project-dir placeholder is left for the host shell to expand when the
//! hook runs, never at install time.

use crate::hooks::mode::TrackingMode;
use crate::patterns::RE_HOOK_VERSION;
use std::fmt;
use std::str::FromStr;

/// Version stamped into every auto-sync command. Bump when the command
/// grammar changes so installed hooks report as outdated.
pub const HOOK_VERSION: HookVersion = HookVersion::new(1, 0, 0);

pub const PROJECT_DIR_PLACEHOLDER: &str = "$CLAUDE_PROJECT_DIR";

pub const SYNC_HOOK_TIMEOUT_SECONDS: u64 = 30;
pub const ANALYSIS_HOOK_TIMEOUT_SECONDS: u64 = 10;
pub const CHALLENGE_HOOK_TIMEOUT_SECONDS: u64 = 5;

/// Host lifecycle events vibe-log registers hooks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    SessionStart,
    PreCompact,
    SessionEnd,
    UserPromptSubmit,
}

impl HookEvent {
    pub const ALL: [HookEvent; 4] = [
        HookEvent::SessionStart,
        HookEvent::PreCompact,
        HookEvent::SessionEnd,
        HookEvent::UserPromptSubmit,
    ];

    /// Key under `hooks` in settings.json.
    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::SessionStart => "SessionStart",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::SessionEnd => "SessionEnd",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
        }
    }

    /// Matcher used when vibe-log creates the event's first group.
    pub fn default_matcher(self) -> Option<&'static str> {
        match self {
            HookEvent::SessionStart => Some("startup|clear"),
            HookEvent::PreCompact => Some("auto"),
            HookEvent::SessionEnd => Some("clear|logout|prompt_input_exit|other"),
            HookEvent::UserPromptSubmit => None,
        }
    }

    /// Auto-sync trigger fired from this event, if any.
    pub fn trigger(self) -> Option<TriggerKind> {
        match self {
            HookEvent::SessionStart => Some(TriggerKind::SessionStart),
            HookEvent::PreCompact => Some(TriggerKind::PreCompact),
            HookEvent::SessionEnd => Some(TriggerKind::SessionEnd),
            HookEvent::UserPromptSubmit => None,
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SessionStart" | "sessionstart" | "session-start" => Ok(HookEvent::SessionStart),
            "PreCompact" | "precompact" | "pre-compact" => Ok(HookEvent::PreCompact),
            "SessionEnd" | "sessionend" | "session-end" => Ok(HookEvent::SessionEnd),
            "UserPromptSubmit" | "userpromptsubmit" | "user-prompt-submit" => {
                Ok(HookEvent::UserPromptSubmit)
            }
            _ => Err(format!("unknown hook event: {s}")),
        }
    }
}

/// The auto-sync purpose encoded by `--hook-trigger=<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    SessionStart,
    PreCompact,
    SessionEnd,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::SessionStart,
        TriggerKind::PreCompact,
        TriggerKind::SessionEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::SessionStart => "sessionstart",
            TriggerKind::PreCompact => "precompact",
            TriggerKind::SessionEnd => "sessionend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn event(self) -> HookEvent {
        match self {
            TriggerKind::SessionStart => HookEvent::SessionStart,
            TriggerKind::PreCompact => HookEvent::PreCompact,
            TriggerKind::SessionEnd => HookEvent::SessionEnd,
        }
    }

    /// `--hook-trigger=<kind>`
    pub fn flag(self) -> String {
        format!("--hook-trigger={}", self.as_str())
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Versions
// ═══════════════════════════════════════════════════════════════════════════════

/// `major.minor.patch` stamped into hook commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HookVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HookVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for HookVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version tag embedded in a command. Commands without one predate
/// versioning and report `0.0.0`.
pub fn hook_version(command: &str) -> HookVersion {
    RE_HOOK_VERSION
        .captures(command)
        .and_then(|caps| {
            Some(HookVersion::new(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            ))
        })
        .unwrap_or_default()
}

/// True when the command was composed by an older release.
pub fn needs_update(command: &str) -> bool {
    hook_version(command) < HOOK_VERSION
}

// ═══════════════════════════════════════════════════════════════════════════════
// Command Builders
// ═══════════════════════════════════════════════════════════════════════════════

/// Auto-sync command for `trigger`.
pub fn build_sync_command(trigger: TriggerKind, cli_path: &str, mode: TrackingMode) -> String {
    let mut command = format!(
        "{} send --silent --background {} --hook-version={}",
        cli_path.trim(),
        trigger.flag(),
        HOOK_VERSION
    );
    if mode == TrackingMode::All {
        command.push_str(" --all");
    } else {
        command.push_str(&format!(
            " --claude-project-dir=\"{}\"",
            PROJECT_DIR_PLACEHOLDER
        ));
    }
    command
}

/// UserPromptSubmit hook that pipes the prompt into the analyzer.
pub fn build_analysis_command(cli_path: &str) -> String {
    format!("{} analyze-prompt --silent --stdin", cli_path.trim())
}

/// UserPromptSubmit hook for the push-up challenge.
pub fn build_challenge_command(cli_path: &str) -> String {
    format!("{} pushup-challenge --stdin", cli_path.trim())
}

/// `statusLine.command` value.
pub fn build_status_line_command(cli_path: &str) -> String {
    format!("{} statusline", cli_path.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_mode_command() {
        let cmd = build_sync_command(TriggerKind::PreCompact, "/bin/tool", TrackingMode::All);
        assert_eq!(
            cmd,
            "/bin/tool send --silent --background --hook-trigger=precompact --hook-version=1.0.0 --all"
        );
        assert!(!cmd.contains("--claude-project-dir"));
    }

    #[test]
    fn test_selected_mode_command_keeps_placeholder_unexpanded() {
        let cmd = build_sync_command(
            TriggerKind::SessionStart,
            "npx vibe-log-cli",
            TrackingMode::Selected,
        );
        assert!(cmd.starts_with("npx vibe-log-cli send --silent --background"));
        assert!(cmd.ends_with("--claude-project-dir=\"$CLAUDE_PROJECT_DIR\""));
        assert!(!cmd.contains("--all"));
    }

    #[test]
    fn test_default_matchers() {
        assert_eq!(HookEvent::PreCompact.default_matcher(), Some("auto"));
        assert_eq!(HookEvent::SessionStart.default_matcher(), Some("startup|clear"));
        assert_eq!(HookEvent::UserPromptSubmit.default_matcher(), None);
    }

    #[test]
    fn test_hook_version_extraction() {
        assert_eq!(
            hook_version("x send --hook-version=2.10.1"),
            HookVersion::new(2, 10, 1)
        );
        assert_eq!(hook_version("x send --hook-trigger=precompact"), HookVersion::default());
    }

    #[test]
    fn test_needs_update_compares_numerically() {
        assert!(needs_update("x send"));
        assert!(needs_update("x send --hook-version=0.9.12"));
        assert!(!needs_update(&format!("x send --hook-version={}", HOOK_VERSION)));
        assert!(!needs_update("x send --hook-version=1.0.10"));
    }

    #[test]
    fn test_event_and_trigger_parsing() {
        assert_eq!("precompact".parse::<HookEvent>(), Ok(HookEvent::PreCompact));
        assert_eq!("SessionEnd".parse::<HookEvent>(), Ok(HookEvent::SessionEnd));
        assert!("stop".parse::<HookEvent>().is_err());
        assert_eq!(TriggerKind::parse("sessionend"), Some(TriggerKind::SessionEnd));
        assert_eq!(TriggerKind::PreCompact.event(), HookEvent::PreCompact);
    }
}
