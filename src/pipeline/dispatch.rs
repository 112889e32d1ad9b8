//! Processor registry and dispatch
//!
//! Maps a command name to exactly one processor. When the same name is
//! registered twice the first registration stays authoritative; the later
//! one is ignored at registration time, so lookups never have to choose.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::host::{ContextId, ContextService};
use crate::models::Session;

/// A name-dispatched command handler
pub trait Processor: Send + Sync {
    /// Name used for diagnostics
    fn name(&self) -> &str;

    /// One-line description for listings
    fn description(&self) -> &str {
        ""
    }

    /// Handle the command's arguments
    ///
    /// Returns `true` when the command was handled here and must not reach
    /// the shell. `args` is the processor's own copy; changing it has no
    /// effect on what is forwarded.
    fn process(&self, args: Vec<String>, session: &mut Session<'_>) -> bool;
}

/// Visible context before and after a processor ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTransition {
    pub before: ContextId,
    pub after: ContextId,
}

impl ContextTransition {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No processor is registered for the command name
    NoMatch,
    /// A processor ran
    Handled {
        /// Name of the processor
        processor: String,
        /// Whether forwarding must be suppressed
        suppress: bool,
        /// What the processor did to the visible context
        transition: ContextTransition,
    },
}

/// Run `processor` on `args`, recording the visible context around the call
///
/// A panicking processor is reported to the user and counts as having
/// handled the command.
pub fn invoke(processor: &dyn Processor, args: Vec<String>, session: &mut Session<'_>) -> Dispatch {
    let before = session.host.current_context();
    let result = catch_unwind(AssertUnwindSafe(|| processor.process(args, session)));
    let suppress = match result {
        Ok(suppress) => suppress,
        Err(_) => {
            error!("Processor '{}' panicked", processor.name());
            session.print(&format!("{}: internal error", processor.name()));
            true
        }
    };
    let after = session.host.current_context();

    Dispatch::Handled {
        processor: processor.name().to_string(),
        suppress,
        transition: ContextTransition { before, after },
    }
}

/// Mapping from command name to processor
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
    /// Command names in registration order
    order: Vec<String>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `command` to `processor`
    ///
    /// Returns `false` and keeps the existing binding if `command` is
    /// already registered.
    pub fn register(&mut self, command: impl Into<String>, processor: Arc<dyn Processor>) -> bool {
        let command = command.into();
        if let Some(existing) = self.processors.get(&command) {
            debug!(
                "Ignoring processor '{}' for '{}': already handled by '{}'",
                processor.name(),
                command,
                existing.name()
            );
            return false;
        }
        self.order.push(command.clone());
        self.processors.insert(command, processor);
        true
    }

    /// Remove the binding for `command`
    pub fn unregister(&mut self, command: &str) -> Option<Arc<dyn Processor>> {
        let removed = self.processors.remove(command)?;
        self.order.retain(|c| c != command);
        Some(removed)
    }

    /// Processor bound to `command`
    pub fn get(&self, command: &str) -> Option<Arc<dyn Processor>> {
        self.processors.get(command).cloned()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.processors.contains_key(command)
    }

    /// Registered command names in registration order
    pub fn commands(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.order
                    .iter()
                    .filter_map(|c| self.processors.get(c).map(|p| (c, p.name()))),
            )
            .finish()
    }
}
