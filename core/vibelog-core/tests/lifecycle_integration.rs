//! End-to-end behavior of hook installation against real settings files.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vibelog_core::{
    HookLifecycleController, HookSelection, InstallRequest, ProjectIdentity, Scope,
    SettingsStore, SettingsTarget, StorageConfig, TrackingMode, TrackingModeResolver,
    TriggerKind, VibeLogError,
};

struct Fixture {
    temp: TempDir,
    store: SettingsStore,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let storage =
            StorageConfig::with_roots(temp.path().join(".vibe-log"), temp.path().join(".claude"));
        Self {
            store: SettingsStore::new(storage),
            temp,
        }
    }

    fn global_path(&self) -> PathBuf {
        self.store.storage().global_settings_file()
    }

    fn write(&self, path: &Path, value: Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn read(&self, path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn project(&self, name: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

fn install_request(selection: HookSelection, mode: TrackingMode) -> InstallRequest {
    InstallRequest {
        selection,
        cli_path: "/bin/tool".to_string(),
        mode,
        force: false,
    }
}

fn commands(value: &Value, event: &str) -> Vec<String> {
    value["hooks"][event]
        .as_array()
        .map(|groups| {
            groups
                .iter()
                .flat_map(|group| group["hooks"].as_array().cloned().unwrap_or_default())
                .filter_map(|entry| entry["command"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_uninstall_example_scenario() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({"hooks":{"PreCompact":[{"matcher":"","hooks":[
            {"type":"command","command":"echo keep"},
            {"type":"command","command":"vibe-log send --hook-trigger=precompact"}
        ]}]}}),
    );

    HookLifecycleController::new(&fixture.store)
        .uninstall(&SettingsTarget::Global)
        .unwrap();

    assert_eq!(
        fixture.read(&path),
        json!({"hooks":{"PreCompact":[{"matcher":"","hooks":[
            {"type":"command","command":"echo keep"}
        ]}]}})
    );
}

#[test]
fn test_install_example_scenario() {
    let fixture = Fixture::new();

    HookLifecycleController::new(&fixture.store)
        .install(
            &SettingsTarget::Global,
            &install_request(
                HookSelection::only(TriggerKind::PreCompact),
                TrackingMode::All,
            ),
        )
        .unwrap();

    let written = fixture.read(&fixture.global_path());
    let command = written["hooks"]["PreCompact"][0]["hooks"][0]["command"]
        .as_str()
        .unwrap();
    assert!(command.contains("--hook-trigger=precompact"));
    assert!(command.contains("--all"));
    assert!(!command.contains("--claude-project-dir"));
}

#[test]
fn test_uninstall_preserves_foreign_entries_in_order() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({
            "model": "opus",
            "hooks": {
                "SessionStart": [
                    {"matcher": "startup", "hooks": [
                        {"type": "command", "command": "echo one"},
                        {"type": "command", "command": "npx vibe-log-cli send --hook-trigger=sessionstart"},
                        {"type": "command", "command": "echo two"}
                    ]},
                    {"matcher": "clear", "hooks": [
                        {"type": "command", "command": "echo three", "timeout": 5}
                    ]}
                ],
                "Stop": [{"hooks": [{"type": "command", "command": "echo stop"}]}],
                "UserPromptSubmit": [{"hooks": [
                    {"type": "command", "command": "npx @vibe-log/cli analyze-prompt --silent --stdin"},
                    {"type": "command", "command": "echo four"}
                ]}]
            },
            "permissions": {"allow": ["Bash"]}
        }),
    );

    let removed = HookLifecycleController::new(&fixture.store)
        .uninstall(&SettingsTarget::Global)
        .unwrap();
    assert_eq!(removed, 2);

    let written = fixture.read(&path);
    assert_eq!(
        commands(&written, "SessionStart"),
        vec!["echo one", "echo two", "echo three"]
    );
    assert_eq!(commands(&written, "Stop"), vec!["echo stop"]);
    assert_eq!(commands(&written, "UserPromptSubmit"), vec!["echo four"]);
    assert_eq!(written["hooks"]["SessionStart"][1]["hooks"][0]["timeout"], json!(5));
    assert_eq!(written["model"], json!("opus"));
    assert_eq!(written["permissions"], json!({"allow": ["Bash"]}));

    let content = std::fs::read_to_string(&path).unwrap();
    let keys = ["\"model\"", "\"hooks\"", "\"permissions\""].map(|key| content.find(key).unwrap());
    assert!(keys[0] < keys[1] && keys[1] < keys[2]);
}

#[test]
fn test_install_is_idempotent_and_never_duplicates() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({"hooks": {"PreCompact": [{"hooks": [{"type": "command", "command": "echo keep"}]}]}}),
    );
    let controller = HookLifecycleController::new(&fixture.store);
    let request = install_request(HookSelection::all(), TrackingMode::All);

    controller.install(&SettingsTarget::Global, &request).unwrap();
    let after_first = fixture.read(&path);

    let err = controller
        .install(&SettingsTarget::Global, &request)
        .unwrap_err();
    assert!(matches!(err, VibeLogError::AlreadyInstalled { .. }));
    assert_eq!(fixture.read(&path), after_first);

    controller
        .install(
            &SettingsTarget::Global,
            &InstallRequest {
                force: true,
                ..request
            },
        )
        .unwrap();
    let after_force = fixture.read(&path);
    assert_eq!(after_force, after_first);

    for event in ["SessionStart", "PreCompact", "SessionEnd"] {
        let managed = commands(&after_force, event)
            .into_iter()
            .filter(|cmd| cmd.contains("/bin/tool send"))
            .count();
        assert_eq!(managed, 1, "{event} should hold exactly one managed entry");
    }
    assert_eq!(commands(&after_force, "PreCompact")[0], "echo keep");
}

#[test]
fn test_read_write_round_trip_is_stable() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({
            "env": {"B": "2", "A": "1"},
            "hooks": {"SessionEnd": [{"matcher": "logout", "hooks": [
                {"type": "command", "command": "echo bye", "async": true}
            ]}]},
            "statusLine": {"type": "command", "command": "my-line", "padding": 1}
        }),
    );

    let first = fixture.store.read(Scope::Global, &path).unwrap();
    fixture.store.write(&first).unwrap();
    let once = std::fs::read_to_string(&path).unwrap();

    let second = fixture.store.read(Scope::Global, &path).unwrap();
    fixture.store.write(&second).unwrap();
    let twice = std::fs::read_to_string(&path).unwrap();

    assert_eq!(once, twice);
    assert_eq!(
        fixture.read(&path)["hooks"]["SessionEnd"][0]["hooks"][0]["async"],
        json!(true)
    );
}

#[test]
fn test_all_mode_takes_precedence_over_projects() {
    let fixture = Fixture::new();
    let project = fixture.project("tracked");
    let controller = HookLifecycleController::new(&fixture.store);

    controller
        .install(
            &SettingsTarget::Project(project.clone()),
            &install_request(HookSelection::all(), TrackingMode::Selected),
        )
        .unwrap();
    let projects = vec![ProjectIdentity::from_path(&project)];
    let resolver = TrackingModeResolver::new(&fixture.store, &projects);
    assert_eq!(resolver.mode(), TrackingMode::Selected);
    assert_eq!(
        resolver.tracked_projects(),
        vec![StorageConfig::encode_path(&project.to_string_lossy())]
    );

    controller
        .install(
            &SettingsTarget::Global,
            &install_request(HookSelection::all(), TrackingMode::All),
        )
        .unwrap();
    assert_eq!(resolver.mode(), TrackingMode::All);
    assert!(resolver.tracked_projects().is_empty());
}

#[test]
fn test_uninstall_prunes_emptied_containers() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({
            "model": "opus",
            "hooks": {"PreCompact": [{"matcher": "auto", "hooks": [
                {"type": "command", "command": "vibe-log send --hook-trigger=precompact --all"}
            ]}]}
        }),
    );

    HookLifecycleController::new(&fixture.store)
        .uninstall(&SettingsTarget::Global)
        .unwrap();

    assert_eq!(fixture.read(&path), json!({"model": "opus"}));
}

#[test]
fn test_legacy_keys_removed_on_any_write() {
    let fixture = Fixture::new();
    let path = fixture.global_path();
    fixture.write(
        &path,
        json!({"hooks": {
            "stop": [{"hooks": [{"type": "command", "command": "vibe-log send"}]}],
            "preCompact": [{"hooks": [{"type": "command", "command": "echo old"}]}]
        }}),
    );

    HookLifecycleController::new(&fixture.store)
        .install(
            &SettingsTarget::Global,
            &install_request(
                HookSelection::only(TriggerKind::SessionEnd),
                TrackingMode::All,
            ),
        )
        .unwrap();

    let written = fixture.read(&path);
    let hooks = written["hooks"].as_object().unwrap();
    assert_eq!(hooks.keys().collect::<Vec<_>>(), vec!["SessionEnd"]);
}
