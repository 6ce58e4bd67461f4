//! vibe-log: install and manage vibe-log hooks in Claude Code settings.
//!
//! ## Subcommands
//!
//! - `hooks install|uninstall|toggle|status|mode|update-cli-path`
//! - `statusline install|uninstall`
//!
//! Exit codes: 0 on success, 2 when the request can't be satisfied as asked
//! (already installed, nothing to remove, blocked by policy), 1 otherwise.

mod hooks;
mod logging;
mod statusline;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use vibelog_core::{
    HookEvent, ManagedFeature, SettingsStore, StorageConfig, ToolConfig, TrackingMode,
    TriggerKind, VibeLogError,
};

#[derive(Parser, Debug)]
#[command(name = "vibe-log")]
#[command(about = "Manage vibe-log hooks in Claude Code settings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Auto-sync and prompt hooks
    #[command(subcommand)]
    Hooks(HooksCommand),

    /// Claude Code status line
    #[command(subcommand)]
    Statusline(StatuslineCommand),
}

#[derive(Subcommand, Debug)]
enum HooksCommand {
    /// Install hooks (global with --all semantics, or into one project)
    Install {
        /// Install into <PROJECT>/.claude/settings.local.json
        #[arg(long, value_name = "PROJECT")]
        project: Option<PathBuf>,

        /// Triggers to install (default: all three)
        #[arg(long = "trigger", value_enum)]
        triggers: Vec<TriggerArg>,

        /// Install a prompt hook instead of auto-sync
        #[arg(long, value_enum, conflicts_with = "triggers")]
        feature: Option<FeatureArg>,

        /// CLI invocation for the hook commands (default: configured cliPath)
        #[arg(long)]
        cli_path: Option<String>,

        /// Replace hooks that are already installed
        #[arg(long)]
        force: bool,
    },

    /// Remove vibe-log hooks
    Uninstall {
        #[arg(long, value_name = "PROJECT")]
        project: Option<PathBuf>,

        /// Only remove these features (default: every vibe-log hook)
        #[arg(long = "feature", value_enum)]
        features: Vec<FeatureArg>,
    },

    /// Enable or disable the hook for one event
    #[command(group(ArgGroup::new("state").required(true).args(["enable", "disable"])))]
    Toggle {
        #[arg(value_enum)]
        event: EventArg,

        #[arg(long)]
        enable: bool,

        #[arg(long)]
        disable: bool,

        #[arg(long, value_name = "PROJECT")]
        project: Option<PathBuf>,
    },

    /// Show installed features and tracking mode
    Status {
        /// Show the merged hook view for one project
        #[arg(long, value_name = "PROJECT")]
        project: Option<PathBuf>,

        /// Print the project's fully merged settings as JSON
        #[arg(long, requires = "project")]
        merged: bool,
    },

    /// Show or change which projects auto-sync
    Mode {
        /// New mode; omit to print the current one
        #[arg(value_enum)]
        mode: Option<ModeArg>,

        /// Projects to track when the mode is `selected`
        #[arg(
            long = "project",
            value_name = "PROJECT",
            required_if_eq("mode", "selected")
        )]
        projects: Vec<PathBuf>,

        #[arg(long)]
        cli_path: Option<String>,
    },

    /// Point every vibe-log hook at a new CLI invocation
    UpdateCliPath {
        cli_path: String,

        #[arg(long, value_name = "PROJECT")]
        project: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum StatuslineCommand {
    /// Install the vibe-log status line, backing up any existing one
    Install {
        #[arg(long)]
        cli_path: Option<String>,

        #[arg(long)]
        force: bool,
    },

    /// Remove the vibe-log status line and restore the backup
    Uninstall,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TriggerArg {
    SessionStart,
    PreCompact,
    SessionEnd,
}

impl From<TriggerArg> for TriggerKind {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::SessionStart => TriggerKind::SessionStart,
            TriggerArg::PreCompact => TriggerKind::PreCompact,
            TriggerArg::SessionEnd => TriggerKind::SessionEnd,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FeatureArg {
    PromptAnalysis,
    Challenge,
}

impl From<FeatureArg> for ManagedFeature {
    fn from(arg: FeatureArg) -> Self {
        match arg {
            FeatureArg::PromptAnalysis => ManagedFeature::PromptAnalysis,
            FeatureArg::Challenge => ManagedFeature::Challenge,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EventArg {
    SessionStart,
    PreCompact,
    SessionEnd,
    UserPromptSubmit,
}

impl From<EventArg> for HookEvent {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::SessionStart => HookEvent::SessionStart,
            EventArg::PreCompact => HookEvent::PreCompact,
            EventArg::SessionEnd => HookEvent::SessionEnd,
            EventArg::UserPromptSubmit => HookEvent::UserPromptSubmit,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    All,
    Selected,
    None,
}

impl From<ModeArg> for TrackingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::All => TrackingMode::All,
            ModeArg::Selected => TrackingMode::Selected,
            ModeArg::None => TrackingMode::None,
        }
    }
}

/// Everything a subcommand needs, built once per run.
pub struct Context {
    pub store: SettingsStore,
    pub config: ToolConfig,
}

impl Context {
    fn new(storage: StorageConfig) -> Self {
        let config = ToolConfig::load(&storage);
        Self {
            store: SettingsStore::new(storage),
            config,
        }
    }

    /// Explicit `--cli-path`, else the configured one.
    pub fn cli_path(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| self.config.effective_cli_path())
            .to_string()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let storage = match StorageConfig::from_env() {
        Ok(storage) => storage,
        Err(e) => {
            let _logging_guard = logging::init(None);
            return report(e);
        }
    };
    let _logging_guard = logging::init(Some(storage.logs_dir().as_path()));
    let ctx = Context::new(storage);

    let result = match cli.command {
        Commands::Hooks(command) => hooks::run(&ctx, command),
        Commands::Statusline(command) => statusline::run(&ctx, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

fn report(error: VibeLogError) -> ExitCode {
    eprintln!("Error: {error}");
    if error.is_user_actionable() {
        tracing::debug!(error = %error, "vibe-log request not applied");
        ExitCode::from(2)
    } else {
        tracing::error!(error = %error, "vibe-log failed");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_with_triggers() {
        let cli = Cli::try_parse_from([
            "vibe-log",
            "hooks",
            "install",
            "--trigger",
            "pre-compact",
            "--trigger",
            "session-end",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::Hooks(HooksCommand::Install {
                triggers,
                force,
                project,
                feature,
                ..
            }) => {
                assert_eq!(triggers, vec![TriggerArg::PreCompact, TriggerArg::SessionEnd]);
                assert!(force);
                assert!(project.is_none());
                assert!(feature.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_toggle_requires_a_state() {
        assert!(Cli::try_parse_from(["vibe-log", "hooks", "toggle", "pre-compact"]).is_err());
        assert!(Cli::try_parse_from([
            "vibe-log",
            "hooks",
            "toggle",
            "pre-compact",
            "--enable",
            "--disable"
        ])
        .is_err());

        let cli =
            Cli::try_parse_from(["vibe-log", "hooks", "toggle", "session-start", "--disable"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Hooks(HooksCommand::Toggle {
                event: EventArg::SessionStart,
                disable: true,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_mode_with_projects() {
        let cli = Cli::try_parse_from([
            "vibe-log", "hooks", "mode", "selected", "--project", "/a", "--project", "/b",
        ])
        .unwrap();
        match cli.command {
            Commands::Hooks(HooksCommand::Mode { mode, projects, .. }) => {
                assert_eq!(mode, Some(ModeArg::Selected));
                assert_eq!(projects, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_selected_mode_requires_projects() {
        let err = Cli::try_parse_from(["vibe-log", "hooks", "mode", "selected"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        assert!(Cli::try_parse_from(["vibe-log", "hooks", "mode", "all"]).is_ok());
        assert!(Cli::try_parse_from(["vibe-log", "hooks", "mode"]).is_ok());
    }

    #[test]
    fn test_feature_conflicts_with_triggers() {
        assert!(Cli::try_parse_from([
            "vibe-log",
            "hooks",
            "install",
            "--feature",
            "challenge",
            "--trigger",
            "pre-compact"
        ])
        .is_err());
    }

    #[test]
    fn test_merged_requires_project() {
        assert!(Cli::try_parse_from(["vibe-log", "hooks", "status", "--merged"]).is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(TriggerKind::from(TriggerArg::PreCompact), TriggerKind::PreCompact);
        assert_eq!(
            ManagedFeature::from(FeatureArg::PromptAnalysis),
            ManagedFeature::PromptAnalysis
        );
        assert_eq!(TrackingMode::from(ModeArg::None), TrackingMode::None);
        assert_eq!(HookEvent::from(EventArg::UserPromptSubmit), HookEvent::UserPromptSubmit);
    }
}
