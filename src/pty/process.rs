//! PTY Process Spawning
//!
//! Handles the creation and spawning of pseudoterminal processes
//! using the portable-pty crate for cross-platform compatibility.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::config::ShellConfig;
use crate::error::{Error, Result};

/// Process spawning configuration
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Shell executable
    pub program: PathBuf,
    /// Shell arguments
    pub args: Vec<String>,
    /// Terminal size
    pub size: PtySize,
    /// Extra environment variables on top of the inherited environment
    pub env_vars: HashMap<String, String>,
    /// Working directory
    pub working_directory: Option<PathBuf>,
}

impl SpawnConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            size: PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            },
            env_vars: HashMap::new(),
            working_directory: None,
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl From<&ShellConfig> for SpawnConfig {
    fn from(shell: &ShellConfig) -> Self {
        let mut config = Self::new(shell.program.clone());
        config.args = shell.args.clone();
        config.working_directory = shell.working_directory.clone();
        config
    }
}

/// A process running on the slave side of a fresh PTY
pub struct SpawnedPty {
    pub master: Box<dyn MasterPty + Send>,
    pub child: Box<dyn Child + Send + Sync>,
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

/// Spawn a new PTY process
pub fn spawn_pty_process(config: &SpawnConfig) -> Result<SpawnedPty> {
    let command = config.command_line();

    // Create a new PTY pair
    let pair = native_pty_system()
        .openpty(config.size)
        .map_err(|e| Error::PtyCreationFailed {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    // Build the command
    let mut cmd_builder = CommandBuilder::new(&config.program);
    cmd_builder.args(&config.args);
    for (key, value) in &config.env_vars {
        cmd_builder.env(key, value);
    }
    if let Some(dir) = &config.working_directory {
        cmd_builder.cwd(dir);
    }

    let child = pair
        .slave
        .spawn_command(cmd_builder)
        .map_err(|e| Error::CommandSpawnFailed {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| Error::PtyReaderCloneFailed {
            reason: e.to_string(),
        })?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;

    info!(
        "Spawned '{}' in a PTY (pid {})",
        command,
        child.process_id().map_or("?".to_string(), |p| p.to_string())
    );

    Ok(SpawnedPty {
        master: pair.master,
        child,
        reader,
        writer,
    })
}

/// Copy everything `reader` produces into `out` until EOF
///
/// Interrupted and would-block reads are retried; the loop gives up after a
/// run of other errors. Returns the number of bytes copied.
pub fn pump_output<R: Read + ?Sized, W: Write + ?Sized>(reader: &mut R, out: &mut W) -> usize {
    const MAX_CONSECUTIVE_ERRORS: u32 = 5;

    let mut buf = [0u8; 4096];
    let mut consecutive_errors = 0;
    let mut total = 0;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("PTY read EOF - process terminated");
                break;
            }
            Ok(n) => {
                consecutive_errors = 0;
                total += n;
                if let Err(e) = out.write_all(&buf[..n]).and_then(|_| out.flush()) {
                    debug!("PTY output sink closed: {}", e);
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!(
                    "PTY read error ({}): {} (attempt {}/{})",
                    e.kind(),
                    e,
                    consecutive_errors,
                    MAX_CONSECUTIVE_ERRORS
                );
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!("PTY read: too many consecutive errors, stopping reader thread");
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
    total
}

/// Write `data` fully, retrying interrupted writes
pub fn write_retrying<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> std::io::Result<()> {
    const MAX_ATTEMPTS: u32 = 3;

    let mut attempts = 0;
    loop {
        match writer.write_all(data) {
            Ok(()) => return writer.flush(),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock && attempts < MAX_ATTEMPTS => {
                attempts += 1;
                debug!("PTY write would block, retrying ({}/{})", attempts, MAX_ATTEMPTS);
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => return Err(e),
        }
    }
}
