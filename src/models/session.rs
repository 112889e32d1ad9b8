//! Shell Session Model
//!
//! Per-session state the pipeline reads and updates on every run: the
//! session label, the shell's own view, the working directory used to
//! resolve relative paths, and the bounded history of runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::RunRecord;
use crate::host::{ContextId, Host, OutputSink};

/// Default label of a fresh session
pub const DEFAULT_LABEL: &str = "*shell*";

/// State of one shell session
#[derive(Debug, Clone, Serialize)]
pub struct ShellSession {
    /// Session identifier
    pub id: String,

    /// Human-visible label, renamable mid-session
    pub label: String,

    /// The shell's own view
    pub view: ContextId,

    /// Directory relative paths are resolved against
    pub working_directory: PathBuf,

    /// When session started
    pub start_time: DateTime<Utc>,

    /// Completed runs, oldest first
    history: VecDeque<RunRecord>,

    /// Maximum number of runs to keep
    max_history_size: usize,
}

impl ShellSession {
    /// Create a new session
    pub fn new(label: impl Into<String>, view: ContextId, working_directory: PathBuf) -> Self {
        Self::with_max_history(label, view, working_directory, 1000)
    }

    /// Create a new session with specified max history size
    pub fn with_max_history(
        label: impl Into<String>,
        view: ContextId,
        working_directory: PathBuf,
        max_history_size: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            view,
            working_directory,
            start_time: Utc::now(),
            history: VecDeque::new(),
            max_history_size,
        }
    }

    /// Replace the label, returning the previous one
    pub fn rename(&mut self, label: impl Into<String>) -> String {
        std::mem::replace(&mut self.label, label.into())
    }

    /// Resolve a user-supplied path against the working directory
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        }
    }

    /// Add a finished run to the history
    pub fn record(&mut self, run: RunRecord) {
        self.history.push_back(run);

        // Enforce history size limit
        while self.history.len() > self.max_history_size {
            self.history.pop_front();
        }
    }

    /// Completed runs, oldest first
    pub fn history(&self) -> impl Iterator<Item = &RunRecord> {
        self.history.iter()
    }

    /// Most recent run
    pub fn last_run(&self) -> Option<&RunRecord> {
        self.history.back()
    }

    pub fn run_count(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Get session duration
    pub fn session_duration(&self) -> std::time::Duration {
        Utc::now()
            .signed_duration_since(self.start_time)
            .to_std()
            .unwrap_or_default()
    }
}

/// Context object passed into every pipeline run
pub struct Session<'a> {
    /// Session state owned by the caller
    pub shell: &'a mut ShellSession,
    /// Host services for this session
    pub host: &'a mut dyn Host,
}

impl<'a> Session<'a> {
    pub fn new(shell: &'a mut ShellSession, host: &'a mut dyn Host) -> Self {
        Self { shell, host }
    }

    /// Append a line to the shell's own view
    pub fn print(&mut self, text: &str) {
        let view = self.shell.view;
        self.host.append(view, text);
    }
}
