//! Built-in preprocessors

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::command_name;
use crate::error::Result;
use crate::host::{LabelNamer, LabelRegistry};
use crate::models::Session;
use crate::pipeline::{Preprocessor, Step};

/// Commands that need elevated privileges unless configured otherwise
pub const DEFAULT_PRIVILEGED_PATTERN: &str =
    r"^(apt-get|apt|dnf|yum|pacman|systemctl|mount|umount)\b";

static DEFAULT_PRIVILEGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_PRIVILEGED_PATTERN).expect("default privileged pattern is valid")
});

/// Prepends an elevation prefix to privileged commands
#[derive(Debug, Clone)]
pub struct CredentialPrefix {
    pattern: Regex,
    prefix: String,
}

impl CredentialPrefix {
    pub const NAME: &'static str = "credential_prefix";

    /// Build from a privileged-command pattern and an elevation command
    pub fn new(pattern: &str, prefix: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            prefix: prefix.into(),
        })
    }
}

impl Default for CredentialPrefix {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PRIVILEGED.clone(),
            prefix: "sudo".to_string(),
        }
    }
}

impl Preprocessor for CredentialPrefix {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn preprocess(&self, command: &str, _session: &mut Session<'_>) -> Step {
        let trimmed = command.trim_start();
        if command_name(trimmed) == Some(self.prefix.as_str()) || !self.pattern.is_match(trimmed) {
            return Step::Continue(command.to_string());
        }
        Step::Continue(format!("{} {}", self.prefix, trimmed))
    }
}

/// Replaces a leading sigil with a full command name
#[derive(Debug, Clone)]
pub struct SigilSubstitution {
    sigil: char,
    command: String,
}

impl SigilSubstitution {
    pub const NAME: &'static str = "substitution";

    pub fn new(sigil: char, command: impl Into<String>) -> Self {
        Self {
            sigil,
            command: command.into(),
        }
    }
}

impl Default for SigilSubstitution {
    fn default() -> Self {
        Self::new('<', "cat")
    }
}

impl Preprocessor for SigilSubstitution {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn preprocess(&self, command: &str, _session: &mut Session<'_>) -> Step {
        match command.strip_prefix(self.sigil) {
            Some(rest) => Step::Continue(format!("{} {}", self.command, rest)),
            None => Step::Continue(command.to_string()),
        }
    }
}

/// Renames the session when certain commands run
///
/// This step has a side effect: it changes the session label. The new label
/// outlives the command that triggered it.
pub struct SessionRelabel {
    seeds: HashMap<String, String>,
    namer: Arc<dyn LabelNamer>,
}

impl SessionRelabel {
    pub const NAME: &'static str = "session_relabel";

    /// `seeds` maps command names to the seed passed to `namer`
    pub fn new(seeds: HashMap<String, String>, namer: Arc<dyn LabelNamer>) -> Self {
        Self { seeds, namer }
    }
}

impl std::fmt::Debug for SessionRelabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRelabel")
            .field("seeds", &self.seeds)
            .finish_non_exhaustive()
    }
}

impl Preprocessor for SessionRelabel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn preprocess(&self, command: &str, session: &mut Session<'_>) -> Step {
        let pass = || Step::Continue(command.to_string());

        let Some(seed) = command_name(command).and_then(|name| self.seeds.get(name)) else {
            return pass();
        };
        let Some(candidate) = self.namer.compute_label(seed) else {
            return pass();
        };
        if candidate == session.shell.label {
            return pass();
        }
        if session.host.label_in_use(&candidate) {
            warn!("Not relabeling session: '{}' is already in use", candidate);
            return Step::Abort(Some(format!("a session named {} already exists", candidate)));
        }

        let old = session.shell.rename(candidate.clone());
        session.host.session_renamed(&old, &candidate);
        info!("Session '{}' renamed to '{}'", old, candidate);
        pass()
    }
}
