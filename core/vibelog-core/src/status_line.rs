//! The `statusLine` entry in global settings.
//!
//! Claude Code allows one status line. Installing ours over someone else's
//! moves theirs into `ToolConfig::status_line_backup`; uninstalling puts it
//! back.

use crate::config::ToolConfig;
use crate::error::{Result, VibeLogError};
use crate::hooks::composer::build_status_line_command;
use crate::hooks::predicate::{is_recognizable_cli_path, is_status_line, ManagedFeature};
use crate::settings::{Scope, SettingsStore, StatusLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLineOutcome {
    Installed { backed_up: bool },
    Removed { restored: bool },
}

pub struct StatusLineManager<'a> {
    store: &'a SettingsStore,
}

impl<'a> StatusLineManager<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    /// Current status line command, whoever owns it.
    pub fn current(&self) -> Option<StatusLine> {
        self.store
            .read_scope(Scope::Global, None)
            .and_then(|document| document.status_line())
    }

    /// Installs our status line. A foreign one is saved to the config first;
    /// if the settings write then fails, the config is put back.
    pub fn install(&self, cli_path: &str, force: bool) -> Result<StatusLineOutcome> {
        if !is_recognizable_cli_path(cli_path) {
            return Err(VibeLogError::UnrecognizedCliPath {
                cli_path: cli_path.trim().to_string(),
                feature: ManagedFeature::StatusLine.name().to_string(),
            });
        }

        let path = self.store.storage().global_settings_file();
        let mut document = self.store.load(Scope::Global, &path);

        let mut previous_config = None;
        match document.status_line() {
            Some(line) if line.command.as_deref().is_some_and(is_status_line) => {
                if !force {
                    return Err(VibeLogError::AlreadyInstalled {
                        feature: ManagedFeature::StatusLine.name().to_string(),
                    });
                }
            }
            Some(foreign) => {
                let config = ToolConfig::load(self.store.storage());
                let mut updated = config.clone();
                updated.status_line_backup = Some(foreign);
                updated.save(self.store.storage())?;
                previous_config = Some(config);
                tracing::info!("Backed up existing status line");
            }
            None => {}
        }

        let line = StatusLine::command(build_status_line_command(cli_path));
        document.set_status_line(Some(&line))?;
        if let Err(err) = self.store.write(&document) {
            if let Some(config) = &previous_config {
                if let Err(restore) = config.save(self.store.storage()) {
                    tracing::warn!(error = %restore, "Could not roll back status line backup");
                }
            }
            return Err(err);
        }
        tracing::info!(path = %path.display(), "Installed status line");
        Ok(StatusLineOutcome::Installed {
            backed_up: previous_config.is_some(),
        })
    }

    pub fn uninstall(&self) -> Result<StatusLineOutcome> {
        let path = self.store.storage().global_settings_file();
        let mut document = self
            .store
            .read(Scope::Global, &path)
            .filter(|document| {
                document
                    .status_line()
                    .and_then(|line| line.command)
                    .is_some_and(|command| is_status_line(&command))
            })
            .ok_or_else(|| VibeLogError::NoManagedEntries { path: path.clone() })?;

        let mut config = ToolConfig::load(self.store.storage());
        let backup = config.status_line_backup.take();
        let restored = backup.is_some();

        document.set_status_line(backup.as_ref())?;
        self.store.write(&document)?;
        if restored {
            config.save(self.store.storage())?;
        }
        tracing::info!(path = %path.display(), restored, "Removed status line");
        Ok(StatusLineOutcome::Removed { restored })
    }
}
