//! shellgate - run an interactive shell behind the command pipeline
//!
//! Reads command lines from stdin, passes each through the configured
//! pipeline and forwards whatever survives to a shell running in a PTY.

use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use shellgate::config::{ConfigFormat, ConfigLoader};
use shellgate::handlers::{HandlerServices, PipelineBuilder};
use shellgate::host::{ContextService, EditorOpener, ManViewer, TerminalHost};
use shellgate::models::{Session, ShellSession};
use shellgate::pipeline::PipelineRunner;
use shellgate::pty::{PtyShell, SpawnConfig};
use shellgate::{Config, Error};

/// Command line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Shell overriding the configured one
    shell: Option<PathBuf>,
    /// Print the effective configuration and exit
    print_config: bool,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> std::result::Result<Self, String> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing config file path".to_string());
                    }
                }
                "--shell" | "-s" => {
                    if i + 1 < args.len() {
                        app_args.shell = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing shell path".to_string());
                    }
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--print-config" => {
                    app_args.print_config = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("{} v{}", shellgate::NAME, shellgate::VERSION);
                    process::exit(0);
                }
                arg => {
                    return Err(format!("Unknown option: {}", arg));
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("shellgate - {}", shellgate::DESCRIPTION);
    println!();
    println!("USAGE:");
    println!("    shellgate [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -s, --shell <PATH>     Shell to run instead of the configured one");
    println!("    -d, --debug            Enable debug logging");
    println!("        --print-config     Print the effective configuration as TOML and exit");
    println!("    -h, --help             Print this help message");
    println!("    -V, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    shellgate looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. $SHELLGATE_CONFIG");
    println!("    3. <config dir>/shellgate/config.toml (or config.json)");
    println!("    4. ~/.shellgate.toml (or .shellgate.json)");
    println!("    5. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    EDITOR, VISUAL         Editor used by the file-open command");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("{}", e);
        print_help();
        process::exit(2);
    });

    let log_level = if args.debug {
        "shellgate=debug"
    } else {
        "shellgate=info"
    };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    debug!("Arguments: {:?}", args);

    let mut config = match load_configuration(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", shellgate::handle_startup_error(&e));
            process::exit(1);
        }
    };
    if let Some(shell) = &args.shell {
        config.shell.program = shell.clone();
    }

    if args.print_config {
        print!("{}", ConfigLoader::render(&config, ConfigFormat::Toml)?);
        return Ok(());
    }

    run(&config)
}

/// Load configuration from file or use defaults
fn load_configuration(args: &AppArgs) -> shellgate::Result<Config> {
    match &args.config_path {
        Some(path) => shellgate::init_with_config(path),
        None => shellgate::init(),
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let services = HandlerServices::new(
        Arc::new(EditorOpener::from_env()),
        Arc::new(ManViewer::new()),
    );
    let pipeline = Arc::new(
        PipelineBuilder::from_config(config, services).context("failed to build pipeline")?,
    );
    info!(
        "Pipeline ready: preprocessors {:?}, commands {:?}",
        pipeline.preprocessor_names(),
        pipeline.processor_names()
    );

    let label = &config.relabel.initial_label;
    let mut host = TerminalHost::new();
    let view = host.open_context(label);
    host.set_visible_context(view);
    host.reserve_label(label.clone());

    let working_directory = match &config.shell.working_directory {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("cannot determine working directory")?,
    };
    let mut shell_state = ShellSession::with_max_history(
        label.clone(),
        view,
        working_directory.clone(),
        config.shell.max_history,
    );

    let mut spawn = SpawnConfig::from(&config.shell);
    spawn.working_directory = Some(working_directory);
    let mut pty = match PtyShell::spawn(&spawn) {
        Ok(pty) => pty,
        Err(e) => {
            eprintln!("{}", shellgate::handle_startup_error(&e));
            process::exit(1);
        }
    };

    let mut runner = PipelineRunner::new(pipeline);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let mut session = Session::new(&mut shell_state, &mut host);
        match runner.run(&line, &mut session, &mut pty) {
            Ok(outcome) => debug!("{:?}", outcome),
            Err(Error::ShellNotRunning) => {
                info!("Shell exited");
                break;
            }
            Err(e) => {
                error!("Giving up: {}", e);
                break;
            }
        }
    }

    if let Err(e) = pty.shutdown() {
        warn!("Failed to stop shell: {}", e);
    }
    info!(
        "Session '{}' finished after {} commands",
        shell_state.label,
        shell_state.run_count()
    );
    Ok(())
}
