//! `vibe-log hooks ...` subcommands.

use crate::{Context, HooksCommand, ModeArg};
use std::path::{Path, PathBuf};
use vibelog_core::{
    ClaudeProjectsDiscovery, FeatureStatus, HookEvent, HookLifecycleController, HookSelection,
    InstallOutcome, InstallRequest, ManagedFeature, ModeChange, ProjectHookStatus,
    ProjectIdentity, Result, ScopeMergeResolver, SettingsTarget, SetupChecker, TrackingMode,
    TrackingModeResolver, TriggerKind, VibeLogError,
};

pub(crate) fn run(ctx: &Context, command: HooksCommand) -> Result<()> {
    match command {
        HooksCommand::Install {
            project,
            triggers,
            feature,
            cli_path,
            force,
        } => {
            let cli_path = ctx.cli_path(cli_path.as_deref());
            install(
                ctx,
                target(project)?,
                triggers.into_iter().map(Into::into).collect(),
                feature.map(Into::into),
                &cli_path,
                force,
            )
        }
        HooksCommand::Uninstall { project, features } => uninstall(
            ctx,
            target(project)?,
            features.into_iter().map(Into::into).collect(),
        ),
        HooksCommand::Toggle {
            event,
            enable,
            project,
            ..
        } => toggle(ctx, target(project)?, event.into(), enable),
        HooksCommand::Status { project, merged } => match project {
            Some(project) => {
                let project = absolute(project)?;
                if merged {
                    print_merged(ctx, &project)
                } else {
                    let no_discovery: Vec<ProjectIdentity> = Vec::new();
                    let checker = SetupChecker::new(&ctx.store, &no_discovery);
                    print_project_status(&checker.project_hook_status(&project));
                    Ok(())
                }
            }
            None => {
                let discovery = ClaudeProjectsDiscovery::new(ctx.store.storage());
                print_feature_status(&SetupChecker::new(&ctx.store, &discovery).feature_status());
                Ok(())
            }
        },
        HooksCommand::Mode {
            mode,
            projects,
            cli_path,
        } => {
            let cli_path = ctx.cli_path(cli_path.as_deref());
            set_or_show_mode(ctx, mode, projects, &cli_path)
        }
        HooksCommand::UpdateCliPath { cli_path, project } => {
            update_cli_path(ctx, target(project)?, &cli_path)
        }
    }
}

fn target(project: Option<PathBuf>) -> Result<SettingsTarget> {
    Ok(match project {
        Some(project) => SettingsTarget::Project(absolute(project)?),
        None => SettingsTarget::Global,
    })
}

/// Relative project paths resolve against the working directory.
fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .map_err(|e| VibeLogError::InvalidProjectPath {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn install(
    ctx: &Context,
    target: SettingsTarget,
    triggers: Vec<TriggerKind>,
    feature: Option<ManagedFeature>,
    cli_path: &str,
    force: bool,
) -> Result<()> {
    let controller = HookLifecycleController::new(&ctx.store);

    let outcome = match feature {
        Some(feature) => controller.install_feature(&target, feature, cli_path, force)?,
        None => {
            let selection = if triggers.is_empty() {
                HookSelection::all()
            } else {
                HookSelection {
                    session_start: triggers.contains(&TriggerKind::SessionStart),
                    pre_compact: triggers.contains(&TriggerKind::PreCompact),
                    session_end: triggers.contains(&TriggerKind::SessionEnd),
                }
            };
            let mode = match target {
                SettingsTarget::Global => TrackingMode::All,
                SettingsTarget::Project(_) => TrackingMode::Selected,
            };
            let request = InstallRequest {
                selection,
                cli_path: cli_path.to_string(),
                mode,
                force,
            };
            controller.install(&target, &request)?
        }
    };

    print_install_outcome(&outcome);
    Ok(())
}

fn print_install_outcome(outcome: &InstallOutcome) {
    for event in &outcome.installed {
        println!("Installed {event} hook");
    }
    for event in &outcome.replaced {
        println!("Reinstalled {event} hook");
    }
    for event in &outcome.skipped {
        println!("{event} hook already installed");
    }
    for event in &outcome.unrecognized {
        println!("{event} left alone: its settings value is not a list of hook groups");
    }
}

fn uninstall(ctx: &Context, target: SettingsTarget, features: Vec<ManagedFeature>) -> Result<()> {
    let controller = HookLifecycleController::new(&ctx.store);
    let removed = if features.is_empty() {
        controller.uninstall(&target)?
    } else {
        controller.uninstall_features(&target, &features)?
    };
    println!("Removed {removed} vibe-log hook(s)");
    Ok(())
}

fn toggle(ctx: &Context, target: SettingsTarget, event: HookEvent, enable: bool) -> Result<()> {
    let changed = HookLifecycleController::new(&ctx.store).toggle(&target, event, enable)?;
    let state = if enable { "enabled" } else { "disabled" };
    if changed {
        println!("{event} hook {state}");
    } else {
        println!("{event} hook already {state}");
    }
    Ok(())
}

fn set_or_show_mode(
    ctx: &Context,
    mode: Option<ModeArg>,
    projects: Vec<PathBuf>,
    cli_path: &str,
) -> Result<()> {
    let discovery = ClaudeProjectsDiscovery::new(ctx.store.storage());

    let Some(mode) = mode else {
        let resolver = TrackingModeResolver::new(&ctx.store, &discovery);
        println!("Tracking mode: {}", resolver.mode());
        for key in resolver.tracked_projects() {
            println!("  {key}");
        }
        return Ok(());
    };

    let change = match TrackingMode::from(mode) {
        TrackingMode::All => ModeChange::All,
        TrackingMode::None => ModeChange::None,
        TrackingMode::Selected => {
            let projects = projects
                .into_iter()
                .map(absolute)
                .collect::<Result<Vec<_>>>()?;
            ModeChange::Selected(projects)
        }
    };

    let written = HookLifecycleController::new(&ctx.store).set_tracking_mode(
        &change,
        HookSelection::all(),
        cli_path,
        &discovery,
    )?;
    for path in &written {
        println!("Updated {}", path.display());
    }
    println!("Tracking mode: {}", TrackingMode::from(mode));
    Ok(())
}

fn update_cli_path(ctx: &Context, target: SettingsTarget, cli_path: &str) -> Result<()> {
    let rewritten = HookLifecycleController::new(&ctx.store).update_cli_path(&target, cli_path)?;

    let mut config = ctx.config.clone();
    config.cli_path = Some(cli_path.trim().to_string());
    config.save(ctx.store.storage())?;

    println!("Rewrote {rewritten} command(s) to use {}", cli_path.trim());
    Ok(())
}

fn print_feature_status(status: &FeatureStatus) {
    println!("Tracking mode: {}", status.mode);
    for key in &status.tracked_projects {
        println!("  {key}");
    }
    if let Some(reason) = &status.policy_block {
        println!("Blocked: {reason}");
    }
    for state in &status.features {
        let label = if !state.installed {
            "not installed".to_string()
        } else {
            let mut label = if state.enabled { "enabled" } else { "disabled" }.to_string();
            if let Some(version) = state.version {
                label.push_str(&format!(", v{version}"));
            }
            if state.needs_update {
                label.push_str(", update available");
            }
            label
        };
        println!("{:<26} {}", state.feature.name(), label);
    }
}

fn print_project_status(status: &ProjectHookStatus) {
    println!("{}", status.project.display());
    if status.events.is_empty() {
        println!("  no hooks configured");
    }
    for event in &status.events {
        let source = event
            .source
            .map(|scope| scope.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<18} from {:<15} vibe-log: {} ({}), other: {}",
            event.event.as_str(),
            source,
            event.managed,
            if event.enabled { "enabled" } else { "disabled" },
            event.foreign
        );
    }
}

fn print_merged(ctx: &Context, project: &Path) -> Result<()> {
    let merged = ScopeMergeResolver::new(&ctx.store).merged_settings_for_project(project);
    let rendered =
        serde_json::to_string_pretty(&merged).map_err(|source| VibeLogError::Serialize {
            context: "merged settings".to_string(),
            source,
        })?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vibelog_core::{SettingsStore, StorageConfig, ToolConfig};

    fn context(temp: &TempDir) -> Context {
        let storage =
            StorageConfig::with_roots(temp.path().join(".vibe-log"), temp.path().join(".claude"));
        Context {
            store: SettingsStore::new(storage),
            config: ToolConfig::default(),
        }
    }

    #[test]
    fn test_install_then_update_cli_path_saves_config() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        install(
            &ctx,
            SettingsTarget::Global,
            vec![TriggerKind::PreCompact],
            None,
            "npx vibe-log-cli",
            false,
        )
        .unwrap();
        update_cli_path(&ctx, SettingsTarget::Global, "/opt/vibe-log").unwrap();

        let config = ToolConfig::load(ctx.store.storage());
        assert_eq!(config.effective_cli_path(), "/opt/vibe-log");
        let content = std::fs::read_to_string(ctx.store.storage().global_settings_file()).unwrap();
        assert!(content.contains("/opt/vibe-log send"));
    }

    #[test]
    fn test_update_cli_path_refusal_keeps_config() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        install(
            &ctx,
            SettingsTarget::Global,
            Vec::new(),
            Some(ManagedFeature::PromptAnalysis),
            "npx vibe-log-cli",
            false,
        )
        .unwrap();

        let err = update_cli_path(&ctx, SettingsTarget::Global, "/bin/tool").unwrap_err();
        assert!(matches!(err, VibeLogError::UnrecognizedCliPath { .. }));
        assert!(err.is_user_actionable());
        assert_eq!(ToolConfig::load(ctx.store.storage()).cli_path, None);
    }

    #[test]
    fn test_selected_mode_tracks_listed_project() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let project = temp.path().join("app");
        std::fs::create_dir_all(&project).unwrap();

        set_or_show_mode(&ctx, Some(ModeArg::Selected), vec![project.clone()], "vibe-log")
            .unwrap();
        let local = ctx.store.storage().project_local_settings_file(&project);
        let content = std::fs::read_to_string(local).unwrap();
        assert!(content.contains("--hook-trigger=sessionstart"));
        assert!(!ctx.store.storage().global_settings_file().exists());
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let path = std::env::temp_dir();
        assert_eq!(absolute(path.clone()).unwrap(), path);
    }
}
