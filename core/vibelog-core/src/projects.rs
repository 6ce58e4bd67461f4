//! Discovery of the projects Claude Code knows about.
//!
//! Claude Code keeps one folder per project under `~/.claude/projects/`,
//! named by encoding the project path. The encoding is lossy, so the real
//! path comes from the `cwd` field recorded in the folder's JSONL transcripts,
//! with filesystem-guided decoding of the folder name as a fallback.

use crate::storage::StorageConfig;
use chrono::{DateTime, Utc};
use fs_err as fs;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Transcript lines inspected when looking for a `cwd` field.
const CWD_SCAN_LINE_LIMIT: usize = 50;

/// A project's real path plus the folder key Claude Code files it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub path: PathBuf,
    pub key: String,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ProjectIdentity {
    /// Identity for a path, with the key derived by encoding it.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let key = StorageConfig::encode_path(&path.to_string_lossy());
        Self {
            path,
            key,
            last_activity: None,
        }
    }
}

/// Enumerates host-known projects.
pub trait ProjectDiscovery {
    fn discover(&self) -> Vec<ProjectIdentity>;
}

/// Fixed project list, for callers that already know their projects.
impl ProjectDiscovery for Vec<ProjectIdentity> {
    fn discover(&self) -> Vec<ProjectIdentity> {
        self.clone()
    }
}

/// Scans `<claude_root>/projects/`.
#[derive(Debug, Clone)]
pub struct ClaudeProjectsDiscovery {
    projects_dir: PathBuf,
}

impl ClaudeProjectsDiscovery {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            projects_dir: storage.claude_projects_dir(),
        }
    }
}

impl ProjectDiscovery for ClaudeProjectsDiscovery {
    fn discover(&self) -> Vec<ProjectIdentity> {
        if !self.projects_dir.is_dir() {
            return Vec::new();
        }

        let mut projects: Vec<ProjectIdentity> = WalkDir::new(&self.projects_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let key = entry.file_name().to_string_lossy().to_string();
                let project = load_project(entry.path(), key);
                if project.is_none() {
                    tracing::debug!(folder = %entry.path().display(), "Skipping unresolvable project folder");
                }
                project
            })
            .collect();

        let mut seen = HashSet::new();
        projects.retain(|project| seen.insert(project.path.clone()));
        projects
    }
}

fn load_project(folder: &Path, key: String) -> Option<ProjectIdentity> {
    let transcripts = transcripts_newest_first(folder);

    let path = transcripts
        .iter()
        .find_map(|(path, _)| cwd_from_transcript(path))
        .or_else(|| StorageConfig::try_resolve_encoded_path(&key))?;

    if !path.is_dir() {
        return None;
    }

    Some(ProjectIdentity {
        path,
        key,
        last_activity: transcripts.first().map(|(_, modified)| *modified),
    })
}

fn transcripts_newest_first(folder: &Path) -> Vec<(PathBuf, DateTime<Utc>)> {
    let mut transcripts: Vec<(PathBuf, DateTime<Utc>)> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jsonl"))
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((entry.into_path(), DateTime::<Utc>::from(modified)))
        })
        .collect();
    transcripts.sort_by(|a, b| b.1.cmp(&a.1));
    transcripts
}

fn cwd_from_transcript(path: &Path) -> Option<PathBuf> {
    let file = fs::File::open(path).ok()?;
    BufReader::new(file)
        .lines()
        .take(CWD_SCAN_LINE_LIMIT)
        .map_while(Result::ok)
        .find_map(|line| {
            let value: Value = serde_json::from_str(&line).ok()?;
            let cwd = value.get("cwd")?.as_str()?;
            (!cwd.is_empty()).then(|| PathBuf::from(cwd))
        })
}
