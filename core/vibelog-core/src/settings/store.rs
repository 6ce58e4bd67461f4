//! Reading and writing settings files.
//!
//! Reads never fail: a missing file, an unreadable file, malformed JSON, or a
//! non-object root all come back as "absent". Writes are atomic (write
//! `<path>.tmp`, then rename over the target) and propagate I/O errors.
//!
//! There is no lock around read → modify → write. Claude Code doesn't lock
//! these files either, so two concurrent writers race and the last rename wins.

use crate::error::{Result, VibeLogError};
use crate::settings::{Scope, SettingsDocument};
use crate::storage::StorageConfig;
use chrono::Utc;
use fs_err as fs;
use serde_json::Value;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

enum RawRead {
    Loaded(serde_json::Map<String, Value>),
    Missing,
    Malformed(String),
}

/// Settings file access rooted at an injected `StorageConfig`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    storage: StorageConfig,
}

impl SettingsStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Reads and parses a settings file. `None` when missing or malformed.
    pub fn read(&self, scope: Scope, path: &Path) -> Option<SettingsDocument> {
        match read_raw(path) {
            RawRead::Loaded(root) => {
                tracing::debug!(scope = %scope, path = %path.display(), "Loaded settings");
                Some(SettingsDocument::from_map(scope, path, root))
            }
            RawRead::Missing => None,
            RawRead::Malformed(reason) => {
                tracing::warn!(
                    scope = %scope,
                    path = %path.display(),
                    reason = %reason,
                    "Ignoring malformed settings file"
                );
                None
            }
        }
    }

    /// Reads a settings file, falling back to an empty document.
    pub fn load(&self, scope: Scope, path: &Path) -> SettingsDocument {
        self.read(scope, path)
            .unwrap_or_else(|| SettingsDocument::empty(scope, path))
    }

    /// Reads the file for `scope`. `None` when the scope has no path (project
    /// scopes without a project, or no enterprise policy) or the file is absent.
    pub fn read_scope(&self, scope: Scope, project: Option<&Path>) -> Option<SettingsDocument> {
        let path = self.storage.settings_file(scope, project)?;
        self.read(scope, &path)
    }

    /// Persists a document atomically.
    ///
    /// Legacy lowercase event keys are dropped. If the file being replaced
    /// exists but doesn't parse, its bytes are copied aside first.
    pub fn write(&self, document: &SettingsDocument) -> Result<()> {
        let mut document = document.clone();
        if document.strip_legacy_events() {
            tracing::info!(path = %document.path().display(), "Removed legacy hook event keys");
        }

        let scope = document.scope();
        let path = document.path().to_path_buf();
        if let RawRead::Malformed(_) = read_raw(&path) {
            let backup = backup_corrupt_file(&path)?;
            tracing::warn!(
                path = %path.display(),
                backup = %backup.display(),
                "Backed up malformed settings before overwriting"
            );
        }

        write_json_atomic(&path, &Value::Object(document.into_root()))?;
        tracing::info!(scope = %scope, path = %path.display(), "Wrote settings");
        Ok(())
    }
}

fn read_raw(path: &Path) -> RawRead {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return RawRead::Missing,
        Err(err) => return RawRead::Malformed(err.to_string()),
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(root)) => RawRead::Loaded(root),
        Ok(_) => RawRead::Malformed("top-level value is not an object".to_string()),
        Err(err) => RawRead::Malformed(err.to_string()),
    }
}

fn backup_corrupt_file(path: &Path) -> Result<PathBuf> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%SZ")));
    let backup = PathBuf::from(backup);
    fs::copy(path, &backup).map_err(|source| VibeLogError::WriteFailure {
        path: backup.clone(),
        source,
    })?;
    Ok(backup)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp: OsString = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}

/// Serializes `value` with 2-space indentation to `<path>.tmp`, then renames
/// it over `path`. Creates the parent directory when needed.
pub(crate) fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let write_failure = |source: std::io::Error| VibeLogError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failure)?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|source| VibeLogError::Serialize {
        context: path.display().to_string(),
        source,
    })?;

    let temp = temp_path(path);
    fs::write(&temp, content).map_err(write_failure)?;
    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(write_failure(err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_env() -> (TempDir, SettingsStore) {
        let temp = TempDir::new().unwrap();
        let storage =
            StorageConfig::with_roots(temp.path().join(".vibe-log"), temp.path().join(".claude"));
        (temp, SettingsStore::new(storage))
    }

    #[test]
    fn test_read_missing_is_absent() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        assert!(store.read(Scope::Global, &path).is_none());
        assert!(store.load(Scope::Global, &path).root().is_empty());
    }

    #[test]
    fn test_read_malformed_is_absent() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ invalid json }").unwrap();
        assert!(store.read(Scope::Global, &path).is_none());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.read(Scope::Global, &path).is_none());
    }

    #[test]
    fn test_write_creates_parent_and_uses_two_space_indent() {
        let (temp, store) = setup_test_env();
        let path = temp.path().join("project/.claude/settings.local.json");
        let mut doc = SettingsDocument::empty(Scope::ProjectLocal, &path);
        doc.set_status_line(Some(&crate::settings::StatusLine::command("x")))
            .unwrap();

        store.write(&doc).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \"statusLine\": {\n    \"type\""));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_preserves_key_order() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"zeta": 1, "alpha": {"b": 2, "a": 1}, "mid": [3, 1]}"#).unwrap();

        let doc = store.read(Scope::Global, &path).unwrap();
        store.write(&doc).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let zeta = content.find("zeta").unwrap();
        let alpha = content.find("alpha").unwrap();
        let mid = content.find("mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
        assert!(content.find("\"b\"").unwrap() < content.find("\"a\"").unwrap());
    }

    #[test]
    fn test_write_drops_legacy_keys() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"hooks": {"stop": [], "preCompact": [], "SessionEnd": []}}"#,
        )
        .unwrap();

        let doc = store.read(Scope::Global, &path).unwrap();
        store.write(&doc).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"hooks": {"SessionEnd": []}}));
    }

    #[test]
    fn test_write_backs_up_corrupt_file() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        let dir = path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let doc = store.load(Scope::Global, &path);
        store.write(&doc).unwrap();

        let backups: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(backups[0].path()).unwrap(),
            "{ not json"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let (_temp, store) = setup_test_env();
        let path = store.storage().global_settings_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"hooks":{"PreCompact":[{"matcher":"","hooks":[{"type":"command","command":"echo keep"}]}]},"model":"opus"}"#,
        )
        .unwrap();

        let first = store.read(Scope::Global, &path).unwrap();
        store.write(&first).unwrap();
        let once = std::fs::read_to_string(&path).unwrap();

        let second = store.read(Scope::Global, &path).unwrap();
        store.write(&second).unwrap();
        let twice = std::fs::read_to_string(&path).unwrap();

        assert_eq!(once, twice);
    }
}
