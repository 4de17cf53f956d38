//! Core [`ImplicationStore`] struct: file-backed implication list with optional hot-reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ImplicationError, Result};
use crate::resolver::Resolver;
use crate::rule::{Rule, RuleSpec};

use super::watcher::handle_fs_event;

/// On-disk shape of the implications file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImplicationsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub implications: Vec<RuleSpec>,
}

/// File-backed store for the implication list.
pub struct ImplicationStore {
    path: PathBuf,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl ImplicationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _watcher: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted list in stored order.
    ///
    /// A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<RuleSpec>> {
        read_specs(&self.path)
    }

    /// Atomically write `rules` to the file.
    ///
    /// Writes to a `.tmp` file next to the target first, then renames it into
    /// place to avoid partial writes on crash.
    pub fn save(&self, rules: &[Rule]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = ImplicationsFile {
            saved_at: Some(Utc::now()),
            implications: rules.iter().map(Rule::to_spec).collect(),
        };
        let yaml = serde_yaml::to_string(&file)?;

        let tmp_path = tmp_path_for(&self.path);
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(path = %self.path.display(), rules = rules.len(), "wrote implications file");
        Ok(())
    }

    /// Start reloading `resolver` whenever the file changes on disk.
    ///
    /// The parent directory is watched so that editors which replace the
    /// file by rename are picked up. A file that fails to parse or contains
    /// a cycle is logged and the active rules are kept.
    pub fn watch(&mut self, resolver: Arc<Resolver>) -> Result<()> {
        let path = self.path.clone();
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => handle_fs_event(&event, &path, &resolver),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            }
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.path.display(), "watching implications file for changes");
        self._watcher = Some(watcher);
        Ok(())
    }
}

pub(super) fn read_specs(path: &Path) -> Result<Vec<RuleSpec>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ImplicationError::Io(e)),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: ImplicationsFile = serde_yaml::from_str(&contents)?;
    Ok(file.implications)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("implications.yml");
    path.with_file_name(format!(".{}.tmp", name))
}
