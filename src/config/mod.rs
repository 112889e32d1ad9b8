//! Configuration management for shellgate
//!
//! The configuration describes which shell to run and how the pipeline in
//! front of it is assembled: the ordered preprocessor list, the processor
//! bindings, and the settings of each built-in handler.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use loader::{ConfigFormat, ConfigLoader, LoadOptions};

use crate::handlers::preprocessors::DEFAULT_PRIVILEGED_PATTERN;
use crate::host::LabelTemplate;
use crate::models::DEFAULT_LABEL;

/// Main configuration structure for shellgate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell process configuration
    pub shell: ShellConfig,

    /// Pipeline assembly
    pub pipeline: PipelineConfig,

    /// Credential-prefix preprocessor settings
    pub credential: CredentialConfig,

    /// Substitution preprocessor settings
    pub substitution: SubstitutionConfig,

    /// Session relabel preprocessor settings
    pub relabel: RelabelConfig,
}

/// Shell process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell executable
    pub program: PathBuf,

    /// Shell arguments
    pub args: Vec<String>,

    /// Working directory for the shell; defaults to the current directory
    pub working_directory: Option<PathBuf>,

    /// Number of runs kept in the session history
    pub max_history: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: std::env::var_os("SHELL")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/bin/sh")),
            args: Vec::new(),
            working_directory: None,
            max_history: 1000,
        }
    }
}

/// Built-in preprocessors that can appear in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessorKind {
    CredentialPrefix,
    Substitution,
    SessionRelabel,
}

impl fmt::Display for PreprocessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreprocessorKind::CredentialPrefix => "credential_prefix",
            PreprocessorKind::Substitution => "substitution",
            PreprocessorKind::SessionRelabel => "session_relabel",
        };
        f.write_str(name)
    }
}

/// Built-in processors that can be bound to a command name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    FileOpen,
    ExpressionEval,
    CalculatorEval,
    DocumentationLookup,
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessorKind::FileOpen => "file_open",
            ProcessorKind::ExpressionEval => "expression_eval",
            ProcessorKind::CalculatorEval => "calculator_eval",
            ProcessorKind::DocumentationLookup => "documentation_lookup",
        };
        f.write_str(name)
    }
}

/// Binds a command name to a processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorBinding {
    pub command: String,
    pub handler: ProcessorKind,
}

impl ProcessorBinding {
    pub fn new(command: impl Into<String>, handler: ProcessorKind) -> Self {
        Self {
            command: command.into(),
            handler,
        }
    }
}

/// Pipeline assembly
///
/// Bindings are a list rather than a map so that a command bound twice is
/// expressible; the first binding wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Preprocessors in the order they run
    pub preprocessors: Vec<PreprocessorKind>,

    /// Processor bindings in registration order
    pub processors: Vec<ProcessorBinding>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocessors: vec![
                PreprocessorKind::CredentialPrefix,
                PreprocessorKind::Substitution,
                PreprocessorKind::SessionRelabel,
            ],
            processors: vec![
                ProcessorBinding::new("ff", ProcessorKind::FileOpen),
                ProcessorBinding::new("eval", ProcessorKind::ExpressionEval),
                ProcessorBinding::new("calc", ProcessorKind::CalculatorEval),
                ProcessorBinding::new("man", ProcessorKind::DocumentationLookup),
            ],
        }
    }
}

/// Credential-prefix settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Regex matched against the command line
    pub pattern: String,

    /// Elevation command prepended to matching commands
    pub prefix: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PRIVILEGED_PATTERN.to_string(),
            prefix: "sudo".to_string(),
        }
    }
}

/// Substitution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionConfig {
    /// Leading character that triggers the rewrite
    pub sigil: String,

    /// Command the sigil expands to
    pub command: String,
}

impl Default for SubstitutionConfig {
    fn default() -> Self {
        Self {
            sigil: "<".to_string(),
            command: "cat".to_string(),
        }
    }
}

impl SubstitutionConfig {
    /// The sigil as a single character, if it is one
    pub fn sigil_char(&self) -> Option<char> {
        let mut chars = self.sigil.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

/// Session relabel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelabelConfig {
    /// Command name to label seed
    pub seeds: BTreeMap<String, String>,

    /// Label template; `{seed}` is replaced by the seed
    pub template: String,

    /// Label of a fresh session
    pub initial_label: String,
}

impl Default for RelabelConfig {
    fn default() -> Self {
        Self {
            seeds: BTreeMap::from([
                ("sudo".to_string(), "sudo".to_string()),
                ("ssh".to_string(), "remote".to_string()),
            ]),
            template: "*{seed}-shell*".to_string(),
            initial_label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl RelabelConfig {
    pub fn label_template(&self) -> LabelTemplate {
        LabelTemplate::new(self.template.clone())
    }
}
