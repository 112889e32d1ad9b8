//! Run Record Model
//!
//! Represents one completed pipeline run: the line the user entered, what
//! preprocessing turned it into, and how the run ended.
//!
//! ## Security Note
//!
//! `RunRecord` implements `Serialize` for debugging and export, but the
//! records live in memory only. Lines typed into a shell can contain secrets,
//! so nothing here is ever written to disk by the pipeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Text sent to the shell when nothing should run this turn
pub const NOOP: &str = "";

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The preprocessed command was sent to the shell
    Forwarded(String),
    /// A processor handled the command locally
    Suppressed {
        /// Preprocessed command that was intercepted
        command: String,
        /// Name of the processor that handled it
        processor: String,
    },
    /// A preprocessor vetoed the command
    Aborted {
        /// Name of the preprocessor that stopped the chain
        step: String,
        /// Diagnostic shown to the user, if any
        reason: Option<String>,
    },
}

impl Outcome {
    /// Text the shell channel receives for this outcome
    pub fn shell_input(&self) -> &str {
        match self {
            Outcome::Forwarded(command) => command,
            Outcome::Suppressed { .. } | Outcome::Aborted { .. } => NOOP,
        }
    }

    pub fn is_forwarded(&self) -> bool {
        matches!(self, Outcome::Forwarded(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Outcome::Suppressed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted { .. })
    }
}

/// One completed pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique identifier for the run
    pub id: String,

    /// Raw line as entered
    pub line: String,

    /// Command after preprocessing (None if the chain aborted)
    pub command: Option<String>,

    /// How the run ended
    pub outcome: Outcome,

    /// When the run started (in local time)
    pub timestamp: DateTime<Local>,

    /// How long the run took
    pub duration: Duration,
}

impl RunRecord {
    /// Create a record for a finished run
    pub fn new(line: String, outcome: Outcome, timestamp: DateTime<Local>, duration: Duration) -> Self {
        let command = match &outcome {
            Outcome::Forwarded(command) => Some(command.clone()),
            Outcome::Suppressed { command, .. } => Some(command.clone()),
            Outcome::Aborted { .. } => None,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            line,
            command,
            outcome,
            timestamp,
            duration,
        }
    }

    /// Whether the shell received the command itself
    pub fn reached_shell(&self) -> bool {
        self.outcome.is_forwarded()
    }
}
