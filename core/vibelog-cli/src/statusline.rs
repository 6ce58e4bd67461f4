//! `vibe-log statusline ...` subcommands.

use crate::{Context, StatuslineCommand};
use vibelog_core::{Result, StatusLineManager, StatusLineOutcome};

pub(crate) fn run(ctx: &Context, command: StatuslineCommand) -> Result<()> {
    let manager = StatusLineManager::new(&ctx.store);
    match command {
        StatuslineCommand::Install { cli_path, force } => {
            let cli_path = ctx.cli_path(cli_path.as_deref());
            if let StatusLineOutcome::Installed { backed_up: true } =
                manager.install(&cli_path, force)?
            {
                println!("Saved your previous status line; uninstall restores it");
            }
            println!("Status line installed");
        }
        StatuslineCommand::Uninstall => {
            if let StatusLineOutcome::Removed { restored: true } = manager.uninstall()? {
                println!("Restored your previous status line");
            }
            println!("Status line removed");
        }
    }
    Ok(())
}
