//! Preprocessor chain
//!
//! An ordered sequence of string rewrites applied to the raw command line.
//! Each step sees the previous step's output. Any step may veto the command,
//! in which case the rest of the chain never runs.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::Session;

/// Result of a single preprocessing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Hand this command to the next step
    Continue(String),
    /// Discard the command, optionally telling the user why
    Abort(Option<String>),
}

impl From<Option<String>> for Step {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(command) => Step::Continue(command),
            None => Step::Abort(None),
        }
    }
}

/// A rewrite step in the chain
///
/// Preprocessors are expected to be pure string rewrites. Session relabeling
/// is the exception: it renames the session as a side effect.
pub trait Preprocessor: Send + Sync {
    /// Name used for reconfiguration and diagnostics
    fn name(&self) -> &str;

    /// Rewrite `command` or veto it
    fn preprocess(&self, command: &str, session: &mut Session<'_>) -> Step;
}

/// Adapter turning a plain `&str -> Option<String>` function into a preprocessor
pub struct FnPreprocessor<F> {
    name: String,
    func: F,
}

impl<F> FnPreprocessor<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Preprocessor for FnPreprocessor<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn preprocess(&self, command: &str, _session: &mut Session<'_>) -> Step {
        (self.func)(command).into()
    }
}

/// Wrap a closure as a shareable preprocessor
pub fn from_fn<F>(name: impl Into<String>, func: F) -> Arc<dyn Preprocessor>
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(FnPreprocessor::new(name, func))
}

/// Final state of a chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainResult {
    /// Every step ran; this is the preprocessed command
    Completed(String),
    /// A step vetoed the command
    Aborted {
        /// Name of the step that stopped the chain
        step: String,
        /// Diagnostic for the user, if any
        reason: Option<String>,
    },
}

/// Ordered sequence of preprocessors
#[derive(Clone, Default)]
pub struct PreprocessorChain {
    steps: Vec<Arc<dyn Preprocessor>>,
}

impl PreprocessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to the end of the chain
    pub fn push(&mut self, step: Arc<dyn Preprocessor>) {
        self.steps.push(step);
    }

    /// Insert a step at `index`, clamped to the chain length
    pub fn insert(&mut self, index: usize, step: Arc<dyn Preprocessor>) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, step);
    }

    /// Remove the first step called `name`
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Preprocessor>> {
        let index = self.steps.iter().position(|s| s.name() == name)?;
        Some(self.steps.remove(index))
    }

    /// Move the named steps to the front in the given order
    ///
    /// Steps not mentioned keep their relative order after the named ones.
    /// Fails without changing anything if a name is not in the chain.
    pub fn reorder(&mut self, names: &[&str]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.contains(n)) {
            return Err(Error::UnknownPreprocessor {
                name: missing.to_string(),
            });
        }

        let mut remaining = std::mem::take(&mut self.steps);
        let mut ordered = Vec::with_capacity(remaining.len());
        for name in names {
            if let Some(index) = remaining.iter().position(|s| s.name() == *name) {
                ordered.push(remaining.remove(index));
            }
        }
        ordered.append(&mut remaining);
        self.steps = ordered;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.name() == name)
    }

    /// Step names in chain order
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold the chain over `command`, stopping at the first veto
    ///
    /// An empty result counts as a veto. A step that panics also aborts the
    /// run; the chain itself is left intact for the next command.
    pub fn run(&self, command: &str, session: &mut Session<'_>) -> ChainResult {
        let mut current = command.to_string();

        for step in &self.steps {
            let result = catch_unwind(AssertUnwindSafe(|| step.preprocess(&current, session)));
            match result {
                Ok(Step::Continue(next)) if !next.is_empty() => {
                    if next != current {
                        debug!("Preprocessor '{}' rewrote '{}' -> '{}'", step.name(), current, next);
                    }
                    current = next;
                }
                Ok(Step::Continue(_)) => {
                    return ChainResult::Aborted {
                        step: step.name().to_string(),
                        reason: None,
                    };
                }
                Ok(Step::Abort(reason)) => {
                    return ChainResult::Aborted {
                        step: step.name().to_string(),
                        reason,
                    };
                }
                Err(_) => {
                    error!("Preprocessor '{}' panicked on '{}'", step.name(), current);
                    return ChainResult::Aborted {
                        step: step.name().to_string(),
                        reason: Some(format!("preprocessor {} failed", step.name())),
                    };
                }
            }
        }

        ChainResult::Completed(current)
    }
}

impl std::fmt::Debug for PreprocessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.iter().map(|s| s.name())).finish()
    }
}
