//! vibe-log's own configuration (`~/.vibe-log/config.json`).
//!
//! Holds the CLI invocation hooks should call and the user's previous status
//! line while ours is installed. Other keys in the file belong to the rest
//! of the tool and are carried through untouched.

use crate::error::{Result, VibeLogError};
use crate::settings::store::write_json_atomic;
use crate::settings::StatusLine;
use crate::storage::StorageConfig;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Invocation used when no CLI path has been configured.
pub const DEFAULT_CLI_PATH: &str = "npx vibe-log-cli";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_line_backup: Option<StatusLine>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ToolConfig {
    /// Loads the config, returning defaults if the file is missing or invalid.
    pub fn load(storage: &StorageConfig) -> Self {
        let path = storage.config_file();
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring invalid config");
            Self::default()
        })
    }

    pub fn save(&self, storage: &StorageConfig) -> Result<()> {
        let value = serde_json::to_value(self).map_err(|source| VibeLogError::Serialize {
            context: "config".to_string(),
            source,
        })?;
        write_json_atomic(&storage.config_file(), &value)
    }

    /// Configured CLI path, or the npx default.
    pub fn effective_cli_path(&self) -> &str {
        self.cli_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_CLI_PATH)
    }
}
