//! Claude Code settings files: model, persistence, and scope merging.
//!
//! - `types`: order-preserving document plus typed hook/status-line records
//! - `store`: absent-tolerant reads and atomic writes
//! - `merge`: effective view across the four scopes

pub mod merge;
pub mod store;
pub mod types;

pub use merge::{EffectiveSettings, ScopeMergeResolver};
pub use store::SettingsStore;
pub use types::{
    EventHooks, HookEntry, HookGroup, HookTable, SettingsDocument, StatusLine, LEGACY_EVENT_KEYS,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the layered configuration locations Claude Code reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// ~/.claude/settings.json
    Global,
    /// <project>/.claude/settings.json
    ProjectShared,
    /// <project>/.claude/settings.local.json
    ProjectLocal,
    /// Platform-defined managed-settings.json
    Enterprise,
}

impl Scope {
    /// Scopes ordered from lowest to highest precedence.
    pub const ASCENDING: [Scope; 4] = [
        Scope::Global,
        Scope::ProjectShared,
        Scope::ProjectLocal,
        Scope::Enterprise,
    ];

    /// Higher wins when the same key appears in several scopes.
    pub fn precedence(self) -> u8 {
        match self {
            Scope::Global => 0,
            Scope::ProjectShared => 1,
            Scope::ProjectLocal => 2,
            Scope::Enterprise => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::ProjectShared => "project-shared",
            Scope::ProjectLocal => "project-local",
            Scope::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_matches_precedence() {
        let ranks: Vec<u8> = Scope::ASCENDING.iter().map(|s| s.precedence()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_scope_serializes_kebab_case() {
        let json = serde_json::to_string(&Scope::ProjectLocal).unwrap();
        assert_eq!(json, "\"project-local\"");
        assert_eq!(Scope::ProjectShared.to_string(), "project-shared");
    }
}
