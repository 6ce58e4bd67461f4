//! # vibelog-core
//!
//! Hook lifecycle management for vibe-log inside Claude Code's layered
//! settings files.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Every operation is a short
//!   read → compute → write of one file.
//! - **Sidecar**: Only entries recognized as vibe-log's are ever changed;
//!   everything else in a settings file keeps its content and key order.
//! - **Graceful degradation**: Missing or malformed settings read as absent.
//!   Only writes and precondition violations return errors.
//! - **Injected roots**: All paths come from a `StorageConfig`, so tests run
//!   against temp directories.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vibelog_core::{
//!     HookLifecycleController, HookSelection, InstallRequest, SettingsStore, SettingsTarget,
//!     StorageConfig, TrackingMode,
//! };
//!
//! let store = SettingsStore::new(StorageConfig::from_env()?);
//! HookLifecycleController::new(&store).install(
//!     &SettingsTarget::Global,
//!     &InstallRequest {
//!         selection: HookSelection::all(),
//!         cli_path: "npx vibe-log-cli".into(),
//!         mode: TrackingMode::All,
//!         force: false,
//!     },
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod patterns;
pub mod projects;
pub mod settings;
pub mod setup;
pub mod status_line;
pub mod storage;

pub use config::{ToolConfig, DEFAULT_CLI_PATH};
pub use error::{Result, VibeLogError};
pub use hooks::{
    HookEvent, HookLifecycleController, HookSelection, HookVersion, InstallOutcome,
    InstallRequest, ManagedFeature, ModeChange, SettingsTarget, TrackingMode,
    TrackingModeResolver, TriggerKind, HOOK_VERSION,
};
pub use projects::{ClaudeProjectsDiscovery, ProjectDiscovery, ProjectIdentity};
pub use settings::{
    EffectiveSettings, Scope, ScopeMergeResolver, SettingsDocument, SettingsStore, StatusLine,
};
pub use setup::{
    check_policy_blocks, EventHookStatus, FeatureState, FeatureStatus, ProjectHookStatus,
    SetupChecker,
};
pub use status_line::{StatusLineManager, StatusLineOutcome};
pub use storage::StorageConfig;
