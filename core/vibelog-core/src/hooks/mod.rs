//! vibe-log hooks inside Claude Code settings.
//!
//! - `composer`: canonical command strings and matchers
//! - `predicate`: substring-based ownership checks
//! - `lifecycle`: install / uninstall / toggle / rewrite
//! - `mode`: tracking mode inferred from settings contents

pub mod composer;
pub mod lifecycle;
pub mod mode;
pub mod predicate;

pub use composer::{HookEvent, HookVersion, TriggerKind, HOOK_VERSION};
pub use lifecycle::{
    HookLifecycleController, HookSelection, InstallOutcome, InstallRequest, ModeChange,
    SettingsTarget,
};
pub use mode::{TrackingMode, TrackingModeResolver};
pub use predicate::{is_managed, is_recognizable_cli_path, ManagedFeature};
