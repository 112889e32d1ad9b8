//! shellgate - a command interception pipeline in front of a shell
//!
//! Every line typed for the shell first passes through two stages:
//!
//! - **Preprocessing:** an ordered chain of rewrite steps. Any step can veto
//!   the command, in which case the shell only sees a blank line.
//! - **Processing:** the rewritten command name is looked up in a registry.
//!   A matching processor may handle the command itself (open a file,
//!   evaluate an expression, show documentation) and suppress forwarding.
//!
//! Anything not handled is forwarded to the shell verbatim.
//!
//! ## Module Organization
//!
//! - [`pipeline`] - Preprocessor chain, processor registry, runner
//! - [`handlers`] - Built-in preprocessors and processors, pipeline assembly
//! - [`commands`] - Command line tokenization
//! - [`host`] - Traits for everything outside the pipeline, terminal host
//! - [`models`] - Session state and run records
//! - [`pty`] - Shell process in a pseudoterminal via `portable-pty`
//! - [`config`] - Configuration loading and validation
//! - [`eval`] - Arithmetic expression evaluation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use shellgate::handlers::{HandlerServices, PipelineBuilder};
//! use shellgate::host::{ContextService, EditorOpener, ManViewer, TerminalHost};
//! use shellgate::models::{Session, ShellSession};
//! use shellgate::pipeline::PipelineRunner;
//! use shellgate::pty::{PtyShell, SpawnConfig};
//!
//! # fn main() -> shellgate::Result<()> {
//! let config = shellgate::init()?;
//! let services = HandlerServices::new(
//!     Arc::new(EditorOpener::from_env()),
//!     Arc::new(ManViewer::new()),
//! );
//! let pipeline = Arc::new(PipelineBuilder::from_config(&config, services)?);
//!
//! let mut host = TerminalHost::new();
//! let view = host.open_context(&config.relabel.initial_label);
//! host.set_visible_context(view);
//! let mut shell = ShellSession::new(&config.relabel.initial_label, view, PathBuf::from("."));
//! let mut pty = PtyShell::spawn(&SpawnConfig::from(&config.shell))?;
//!
//! let mut runner = PipelineRunner::new(pipeline);
//! let mut session = Session::new(&mut shell, &mut host);
//! runner.run("apt-get update", &mut session, &mut pty)?;
//! # Ok(())
//! # }
//! ```

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod commands;
pub mod config;
pub mod error;
pub mod eval;
pub mod handlers;
pub mod host;
pub mod models;
pub mod pipeline;
pub mod pty;

// Re-exports for core functionality
pub use commands::{tokenize, TokenizedCommand};
pub use config::{Config, ConfigLoader};
pub use error::{Error, Result};
pub use handlers::{HandlerServices, PipelineBuilder};
pub use models::{Outcome, RunRecord, Session, ShellSession};
pub use pipeline::{Pipeline, PipelineRunner, Preprocessor, Processor, Step};

/// The current version of shellgate from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Load configuration from the default locations
///
/// A configuration that cannot be loaded or fails validation is reported
/// and replaced by the defaults, so this only fails if the defaults
/// themselves are invalid.
pub fn init() -> Result<Config> {
    info!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    ConfigLoader::new().validate_config(&config)?;
    Ok(config)
}

/// Load configuration from `config_path`
///
/// Unlike [`init`] there is no fallback: an explicitly named file that
/// cannot be used is an error.
pub fn init_with_config(config_path: &std::path::Path) -> Result<Config> {
    info!(
        "Initializing {} v{} with config: {}",
        NAME,
        VERSION,
        config_path.display()
    );

    let mut loader = ConfigLoader::new();
    loader.load_from_path(config_path).map_err(|e| {
        error!(
            "Failed to load configuration from {}: {}",
            config_path.display(),
            e
        );
        e
    })
}

/// Describe a startup failure with hints for fixing it
pub fn handle_startup_error(error: &Error) -> String {
    match error {
        Error::ConfigLoadFailed { path, reason } => {
            format!(
                "Configuration Error: Failed to load config from '{}': {}\n\nTry:\n• Check the path passed to --config\n• Ensure file permissions are correct",
                path.display(),
                reason
            )
        }
        Error::ConfigParseFailed { format, reason } => {
            format!(
                "Configuration Error: Failed to parse {} config: {}\n\nTry:\n• Check configuration file syntax\n• Run with --print-config to see a valid file",
                format, reason
            )
        }
        Error::ConfigValidationFailed { field, reason } => {
            format!(
                "Configuration Error: Validation failed for '{}': {}",
                field, reason
            )
        }
        Error::PtyCreationFailed { .. } | Error::CommandSpawnFailed { .. } => {
            format!(
                "Shell Error: {}\n\nTry:\n• Check shell.program in the configuration\n• Pass another shell with --shell",
                error
            )
        }
        _ => format!(
            "Unexpected Error: {}\n\nPlease report this issue with --debug logs",
            error
        ),
    }
}

/// Get default configuration
///
/// ```
/// let config = shellgate::default_config();
/// assert_eq!(config.credential.prefix, "sudo");
/// ```
pub fn default_config() -> Config {
    Config::default()
}
