//! Storage configuration and path management for vibe-log.
//!
//! `StorageConfig` is the single place that knows where every settings scope
//! lives on disk. Components never call `dirs::home_dir()` themselves; they
//! receive a `StorageConfig` so tests can point everything at a temp dir.
//!
//! ## Layout
//!
//! ```text
//! ~/.claude/settings.json                 global scope
//! <project>/.claude/settings.json         project-shared scope
//! <project>/.claude/settings.local.json   project-local scope
//! <platform path>/managed-settings.json   enterprise scope (optional)
//! ~/.vibe-log/config.json                 tool configuration
//! ```

use crate::error::{Result, VibeLogError};
use crate::settings::Scope;
use std::env;
use std::path::{Path, PathBuf};

/// Overrides the Claude root directory (useful for sandboxes and CI).
pub const CLAUDE_DIR_ENV: &str = "VIBELOG_CLAUDE_DIR";

#[cfg(target_os = "macos")]
const ENTERPRISE_SETTINGS_PATH: Option<&str> =
    Some("/Library/Application Support/ClaudeCode/managed-settings.json");
#[cfg(target_os = "linux")]
const ENTERPRISE_SETTINGS_PATH: Option<&str> = Some("/etc/claude-code/managed-settings.json");
#[cfg(target_os = "windows")]
const ENTERPRISE_SETTINGS_PATH: Option<&str> =
    Some(r"C:\ProgramData\ClaudeCode\managed-settings.json");
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const ENTERPRISE_SETTINGS_PATH: Option<&str> = None;

/// Central configuration for all paths vibe-log reads or writes.
///
/// Production code uses `StorageConfig::from_env()`.
/// Tests use `StorageConfig::with_roots(...)` for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for vibe-log's own data (default: ~/.vibe-log)
    root: PathBuf,
    /// Root directory for Claude Code data (default: ~/.claude)
    claude_root: PathBuf,
    /// Enterprise-managed settings file, if the platform defines one
    enterprise_settings: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves paths from the current user's home directory, honoring
    /// `VIBELOG_CLAUDE_DIR`.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(VibeLogError::HomeDirNotFound)?;
        let claude_root = env::var_os(CLAUDE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".claude"));

        Ok(Self {
            root: home.join(".vibe-log"),
            claude_root,
            enterprise_settings: ENTERPRISE_SETTINGS_PATH.map(PathBuf::from),
        })
    }

    /// Creates a StorageConfig with custom roots and no enterprise policy.
    /// Used for testing with temp directories.
    pub fn with_roots(root: PathBuf, claude_root: PathBuf) -> Self {
        Self {
            root,
            claude_root,
            enterprise_settings: None,
        }
    }

    /// Replaces the enterprise-managed settings path.
    pub fn with_enterprise_settings(mut self, path: Option<PathBuf>) -> Self {
        self.enterprise_settings = path;
        self
    }

    /// Returns the root directory for vibe-log data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the root directory for Claude Code data.
    pub fn claude_root(&self) -> &Path {
        &self.claude_root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // vibe-log Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to config.json (tool preferences, status line backup).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to the logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Claude Code Paths
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to Claude Code's global settings file.
    pub fn global_settings_file(&self) -> PathBuf {
        self.claude_root.join("settings.json")
    }

    /// Path to Claude Code's projects directory (JSONL transcripts).
    /// Read-only for us.
    pub fn claude_projects_dir(&self) -> PathBuf {
        self.claude_root.join("projects")
    }

    /// Path to the enterprise-managed settings file, if any.
    pub fn enterprise_settings_file(&self) -> Option<&Path> {
        self.enterprise_settings.as_deref()
    }

    /// Path to a project's shared (committed) settings file.
    pub fn project_shared_settings_file(&self, project: &Path) -> PathBuf {
        project.join(".claude").join("settings.json")
    }

    /// Path to a project's local (uncommitted) settings file.
    pub fn project_local_settings_file(&self, project: &Path) -> PathBuf {
        project.join(".claude").join("settings.local.json")
    }

    /// Path to the settings file for `scope`. Project scopes need a project;
    /// the enterprise scope may have no path at all.
    pub fn settings_file(&self, scope: Scope, project: Option<&Path>) -> Option<PathBuf> {
        match scope {
            Scope::Global => Some(self.global_settings_file()),
            Scope::Enterprise => self.enterprise_settings.clone(),
            Scope::ProjectShared => project.map(|p| self.project_shared_settings_file(p)),
            Scope::ProjectLocal => project.map(|p| self.project_local_settings_file(p)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Path Encoding/Decoding
    // ─────────────────────────────────────────────────────────────────────────────

    /// Encodes a filesystem path the way Claude Code names project folders:
    /// every character that is not ASCII alphanumeric becomes `-`.
    /// Example: `/Users/pete/Code/my_project` -> `-Users-pete-Code-my-project`
    pub fn encode_path(path: &str) -> String {
        path.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }

    /// Attempts to resolve an encoded folder name to a real filesystem path.
    /// Checks the filesystem to handle ambiguous cases (paths with `-` in names).
    pub fn try_resolve_encoded_path(encoded: &str) -> Option<PathBuf> {
        let without_leading = encoded.strip_prefix('-')?;
        if without_leading.is_empty() {
            return None;
        }
        let parts: Vec<&str> = without_leading.split('-').collect();
        resolve_parts(PathBuf::from("/"), &parts)
    }
}

/// Depth-first search over the ways `parts` can be split into path segments.
fn resolve_parts(base: PathBuf, parts: &[&str]) -> Option<PathBuf> {
    if parts.is_empty() {
        return base.exists().then_some(base);
    }

    for take in 1..=parts.len() {
        let segment = parts[..take].join("-");
        if segment.is_empty() {
            continue;
        }
        let candidate = base.join(&segment);
        if candidate.exists() {
            if let Some(found) = resolve_parts(candidate, &parts[take..]) {
                return Some(found);
            }
        }
    }

    None
}
