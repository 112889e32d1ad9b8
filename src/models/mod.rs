//! Core data models for shellgate
//!
//! This module contains the data structures the pipeline passes around:
//! the per-session state and context object, and the record of each
//! completed pipeline run.

pub mod run_record;
pub mod session;

// Re-exports for convenience
pub use run_record::{Outcome, RunRecord, NOOP};
pub use session::{Session, ShellSession, DEFAULT_LABEL};
