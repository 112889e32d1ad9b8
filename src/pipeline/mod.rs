//! Command interception pipeline
//!
//! A raw command line goes through two stages before anything reaches the
//! shell:
//!
//! 1. **Preprocessing** - the [`PreprocessorChain`] folds a list of string
//!    rewrites over the line. Any step can veto the command.
//! 2. **Processing** - the rewritten line is tokenized and its command name
//!    looked up in the [`ProcessorRegistry`]. A matching processor may handle
//!    the command itself and suppress forwarding.
//!
//! [`Pipeline`] owns the shared configuration (chain and registry) and
//! [`PipelineRunner`] sequences one run per line against a session and a
//! shell channel.
//!
//! ## Concurrency
//!
//! Chain and registry sit behind read-mostly `RwLock`s. Every run takes a
//! snapshot of the handlers it needs and releases the locks before invoking
//! them, so a blocking processor never holds up reconfiguration and a
//! handler can even reconfigure the pipeline it is running in. Changes take
//! effect on the next run.

pub mod dispatch;
pub mod preprocess;
pub mod runner;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::commands::TokenizedCommand;
use crate::error::Result;
use crate::models::Session;

pub use dispatch::{invoke, ContextTransition, Dispatch, Processor, ProcessorRegistry};
pub use preprocess::{from_fn, ChainResult, FnPreprocessor, Preprocessor, PreprocessorChain, Step};
pub use runner::{PipelineRunner, RunState};

/// Shared pipeline configuration
#[derive(Debug, Default)]
pub struct Pipeline {
    chain: RwLock<PreprocessorChain>,
    registry: RwLock<ProcessorRegistry>,
}

impl Pipeline {
    /// Create an empty pipeline: every command is forwarded unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline from an existing chain and registry
    pub fn with_parts(chain: PreprocessorChain, registry: ProcessorRegistry) -> Self {
        Self {
            chain: RwLock::new(chain),
            registry: RwLock::new(registry),
        }
    }

    // Poisoning only means a handler panicked while a guard was held; the
    // data itself is never left half-updated by these methods.
    fn chain(&self) -> RwLockReadGuard<'_, PreprocessorChain> {
        self.chain.read().unwrap_or_else(|e| e.into_inner())
    }

    fn chain_mut(&self) -> RwLockWriteGuard<'_, PreprocessorChain> {
        self.chain.write().unwrap_or_else(|e| e.into_inner())
    }

    fn registry(&self) -> RwLockReadGuard<'_, ProcessorRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, ProcessorRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the chain as it is right now
    pub fn chain_snapshot(&self) -> PreprocessorChain {
        self.chain().clone()
    }

    /// Processor currently bound to `command`
    pub fn processor_for(&self, command: &str) -> Option<Arc<dyn Processor>> {
        self.registry().get(command)
    }

    /// Look up `cmd`'s name and run the matching processor
    ///
    /// The registry lock is released before the processor runs, so the
    /// processor may reconfigure this pipeline.
    pub fn dispatch(&self, cmd: &TokenizedCommand, session: &mut Session<'_>) -> Dispatch {
        match cmd.name().and_then(|name| self.processor_for(name)) {
            Some(processor) => invoke(processor.as_ref(), cmd.args.clone(), session),
            None => Dispatch::NoMatch,
        }
    }

    // -- Preprocessor API --

    pub fn push_preprocessor(&self, step: Arc<dyn Preprocessor>) {
        info!("Adding preprocessor '{}'", step.name());
        self.chain_mut().push(step);
    }

    pub fn insert_preprocessor(&self, index: usize, step: Arc<dyn Preprocessor>) {
        info!("Inserting preprocessor '{}' at {}", step.name(), index);
        self.chain_mut().insert(index, step);
    }

    /// Remove a preprocessor by name, returning whether one was removed
    pub fn remove_preprocessor(&self, name: &str) -> bool {
        let removed = self.chain_mut().remove(name).is_some();
        if removed {
            info!("Removed preprocessor '{}'", name);
        }
        removed
    }

    /// Move the named preprocessors to the front in the given order
    pub fn reorder_preprocessors(&self, names: &[&str]) -> Result<()> {
        self.chain_mut().reorder(names)?;
        info!("Preprocessor order is now {:?}", self.preprocessor_names());
        Ok(())
    }

    pub fn preprocessor_names(&self) -> Vec<String> {
        self.chain().names()
    }

    // -- Processor API --

    /// Bind `command` to `processor`; the first binding for a name wins
    pub fn register_processor(&self, command: impl Into<String>, processor: Arc<dyn Processor>) -> bool {
        self.registry_mut().register(command, processor)
    }

    /// Remove the binding for `command`, returning whether one existed
    pub fn unregister_processor(&self, command: &str) -> bool {
        self.registry_mut().unregister(command).is_some()
    }

    /// Registered command names in registration order
    pub fn processor_names(&self) -> Vec<String> {
        self.registry().commands().to_vec()
    }
}
