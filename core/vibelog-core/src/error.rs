//! Error types for vibelog-core operations.
//!
//! Read-side failures (missing or malformed settings files) never show up
//! here: the store absorbs them and reports the document as absent.

use std::path::PathBuf;

/// All errors that can surface from vibelog-core operations.
#[derive(Debug, thiserror::Error)]
pub enum VibeLogError {
    // ─────────────────────────────────────────────────────────────────────
    // Precondition Errors (user-actionable)
    // ─────────────────────────────────────────────────────────────────────
    #[error("{feature} is already installed (use --force to reinstall)")]
    AlreadyInstalled { feature: String },

    #[error("No vibe-log entries found in {}", path.display())]
    NoManagedEntries { path: PathBuf },

    #[error("No vibe-log hook installed for {event}")]
    HookNotInstalled { event: String },

    #[error("Hooks are blocked by policy: {reason}")]
    PolicyBlocked { reason: String },

    #[error("{feature} is not installed through hooks")]
    UnsupportedFeature { feature: String },

    #[error("CLI path `{cli_path}` must contain \"vibe-log\" to manage {feature}")]
    UnrecognizedCliPath { cli_path: String, feature: String },

    #[error("{events} in {} is not a list of hook groups; fix or remove it first", path.display())]
    UnrecognizedHookValue { events: String, path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────
    // Environment Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("Invalid project path: {path}: {reason}")]
    InvalidProjectPath { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors (fatal)
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl VibeLogError {
    /// True for errors the user can resolve by changing their request
    /// (as opposed to filesystem failures).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            VibeLogError::AlreadyInstalled { .. }
                | VibeLogError::NoManagedEntries { .. }
                | VibeLogError::HookNotInstalled { .. }
                | VibeLogError::PolicyBlocked { .. }
                | VibeLogError::UnsupportedFeature { .. }
                | VibeLogError::UnrecognizedCliPath { .. }
                | VibeLogError::UnrecognizedHookValue { .. }
                | VibeLogError::InvalidProjectPath { .. }
        )
    }
}

/// Convenience type alias for Results using VibeLogError.
pub type Result<T> = std::result::Result<T, VibeLogError>;
