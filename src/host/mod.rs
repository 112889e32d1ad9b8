//! Host collaborator traits
//!
//! These traits are the only way the pipeline touches the outside world.
//! The interactive binary implements them with a PTY shell and a terminal
//! host; tests implement them with in-memory recorders.

pub mod terminal;


use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;

pub use terminal::{EditorOpener, ManViewer, TerminalHost};

/// Identifier of a view the host can make visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The underlying shell process input
pub trait ShellChannel {
    /// Send `text` as the next input line to the shell
    fn forward(&mut self, text: &str) -> Result<()>;
}

/// Visible-context service
pub trait ContextService {
    /// Context currently visible to the user
    fn current_context(&self) -> ContextId;

    /// Make `context` the primary visible view
    fn set_visible_context(&mut self, context: ContextId);

    /// Keep `context` reachable in a secondary view
    fn open_secondary_view(&mut self, context: ContextId);

    /// Allocate a new context with a display name
    fn open_context(&mut self, name: &str) -> ContextId;
}

/// Output-append service
pub trait OutputSink {
    /// Append `text` to the output of `context`
    fn append(&mut self, context: ContextId, text: &str);
}

/// Knows which session labels are taken
pub trait LabelRegistry {
    /// Whether another session already uses `label`
    fn label_in_use(&self, label: &str) -> bool;

    /// Called after the current session changed its label
    fn session_renamed(&mut self, _old: &str, _new: &str) {}
}

/// Everything a running pipeline needs from the host
pub trait Host: ContextService + OutputSink + LabelRegistry {}

impl<T: ContextService + OutputSink + LabelRegistry> Host for T {}

/// Computes a session label from a seed
pub trait LabelNamer: Send + Sync {
    fn compute_label(&self, seed: &str) -> Option<String>;
}

impl<F> LabelNamer for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn compute_label(&self, seed: &str) -> Option<String> {
        self(seed)
    }
}

/// Default naming function: substitutes the seed into a template
#[derive(Debug, Clone)]
pub struct LabelTemplate {
    template: String,
}

impl LabelTemplate {
    /// Placeholder replaced by the seed
    pub const PLACEHOLDER: &'static str = "{seed}";

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Default for LabelTemplate {
    fn default() -> Self {
        Self::new("*{seed}-shell*")
    }
}

impl LabelNamer for LabelTemplate {
    fn compute_label(&self, seed: &str) -> Option<String> {
        if seed.is_empty() {
            return None;
        }
        Some(self.template.replace(Self::PLACEHOLDER, seed))
    }
}

/// Evaluates an expression to its textual result
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str) -> Result<String>;

    /// Evaluate with access to the host
    ///
    /// Evaluators that present their result themselves (for example in a
    /// view of their own) override this. The default ignores the host.
    fn evaluate_in(&self, expression: &str, _host: &mut dyn Host) -> Result<String> {
        self.evaluate(expression)
    }
}

/// Opens a file somewhere the user can edit it
pub trait FileOpener: Send + Sync {
    fn open_file(&self, path: &Path, host: &mut dyn Host) -> Result<()>;
}

/// Shows documentation for a topic in a side view
pub trait DocViewer: Send + Sync {
    fn show(&self, topic: &str, host: &mut dyn Host) -> Result<()>;
}
