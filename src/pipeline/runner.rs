//! Pipeline runner
//!
//! Sequences one pipeline run per command line:
//!
//! ```text
//! Idle -> Preprocessing -> Aborted ------------------------> Idle
//!                       -> Dispatching -> Suppressed ------> Idle
//!                                      -> Forwarded -------> Idle
//! ```
//!
//! Every run ends with exactly one write to the shell channel: the
//! preprocessed command when forwarded, [`crate::models::NOOP`] otherwise.

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

use super::dispatch::{ContextTransition, Dispatch};
use super::preprocess::ChainResult;
use super::Pipeline;
use crate::commands::tokenize;
use crate::error::Result;
use crate::host::{ContextService, ShellChannel};
use crate::models::{Outcome, RunRecord, Session};

/// Where the runner is within a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Waiting for the next line
    #[default]
    Idle,
    /// Running the preprocessor chain
    Preprocessing,
    /// A preprocessor vetoed the command
    Aborted,
    /// Looking up and running a processor
    Dispatching,
    /// A processor handled the command
    Suppressed,
    /// The command is being sent to the shell
    Forwarded,
}

/// Runs command lines through a shared [`Pipeline`]
#[derive(Debug)]
pub struct PipelineRunner {
    pipeline: Arc<Pipeline>,
    state: RunState,
}

impl PipelineRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            state: RunState::Idle,
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Current state; `Idle` between runs
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        trace!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one command line and write the result to `shell`
    ///
    /// The only error returned is a failure to write to the shell channel;
    /// vetoes and handler faults are reported through the outcome and the
    /// session output.
    pub fn run(
        &mut self,
        line: &str,
        session: &mut Session<'_>,
        shell: &mut dyn ShellChannel,
    ) -> Result<Outcome> {
        let started = Instant::now();
        let timestamp = Local::now();

        self.transition(RunState::Preprocessing);
        let outcome = self.process(line, session);

        let sent = shell.forward(outcome.shell_input());
        if let Err(e) = &sent {
            error!("Failed to send '{}' to shell: {}", outcome.shell_input(), e);
        }
        self.transition(RunState::Idle);

        session.shell.record(RunRecord::new(
            line.to_string(),
            outcome.clone(),
            timestamp,
            started.elapsed(),
        ));

        sent?;
        Ok(outcome)
    }

    fn process(&mut self, line: &str, session: &mut Session<'_>) -> Outcome {
        let chain = self.pipeline.chain_snapshot();
        let command = match chain.run(line, session) {
            ChainResult::Completed(command) => command,
            ChainResult::Aborted { step, reason } => {
                self.transition(RunState::Aborted);
                info!("Command '{}' discarded by preprocessor '{}'", line, step);
                if let Some(message) = &reason {
                    session.print(message);
                }
                return Outcome::Aborted { step, reason };
            }
        };

        self.transition(RunState::Dispatching);
        let tokens = tokenize(&command);
        let dispatch = self.pipeline.dispatch(&tokens, session);

        match dispatch {
            Dispatch::Handled {
                processor,
                suppress: true,
                transition,
            } => {
                self.transition(RunState::Suppressed);
                debug!("Command '{}' handled by '{}'", command, processor);
                restore_shell_view(session, transition);
                Outcome::Suppressed { command, processor }
            }
            Dispatch::Handled { .. } | Dispatch::NoMatch => {
                self.transition(RunState::Forwarded);
                Outcome::Forwarded(command)
            }
        }
    }
}

/// Put the shell back in front if a processor switched views
///
/// The view the processor switched to stays reachable as a secondary view.
fn restore_shell_view(session: &mut Session<'_>, transition: ContextTransition) {
    let shell_view = session.shell.view;
    if !transition.changed() || transition.after == shell_view {
        return;
    }
    debug!(
        "Restoring shell view {} (processor switched to {})",
        shell_view, transition.after
    );
    session.host.set_visible_context(shell_view);
    session.host.open_secondary_view(transition.after);
}
