//! Shell process behind a PTY
//!
//! [`PtyShell`] is the [`ShellChannel`] the interactive binary forwards
//! commands to. A background thread copies everything the shell prints to
//! an output sink (stdout by default).

use portable_pty::{Child, ChildKiller, MasterPty};
use std::io::Write;
use std::thread::{self, JoinHandle};

use super::process::{pump_output, spawn_pty_process, write_retrying, SpawnConfig};
use crate::error::{Error, Result};
use crate::host::ShellChannel;

/// An interactive shell running in a pseudoterminal
pub struct PtyShell {
    command: String,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    // Dropping the master closes the PTY, so it lives as long as the shell
    _master: Box<dyn MasterPty + Send>,
    reader_thread: Option<JoinHandle<usize>>,
}

impl PtyShell {
    /// Spawn the shell, echoing its output to stdout
    pub fn spawn(config: &SpawnConfig) -> Result<Self> {
        Self::spawn_with_output(config, std::io::stdout())
    }

    /// Spawn the shell, copying its output into `output`
    pub fn spawn_with_output<W>(config: &SpawnConfig, mut output: W) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let spawned = spawn_pty_process(config)?;
        let mut reader = spawned.reader;

        let reader_thread = thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || {
                let copied = pump_output(&mut reader, &mut output);
                debug!("PTY reader thread exiting after {} bytes", copied);
                copied
            })?;

        Ok(Self {
            command: config.command_line(),
            writer: spawned.writer,
            child: spawned.child,
            _master: spawned.master,
            reader_thread: Some(reader_thread),
        })
    }

    /// Command line the shell was started with
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Whether the shell process is still alive
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill the shell and wait for the output thread to drain
    pub fn shutdown(&mut self) -> Result<()> {
        if self.is_running() {
            info!("Stopping shell '{}'", self.command);
            self.child.kill()?;
            self.child.wait()?;
        }
        if let Some(handle) = self.reader_thread.take() {
            // The reader only ends at EOF, which some platforms never report
            // after the child exits; don't block on it.
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
        Ok(())
    }
}

impl ShellChannel for PtyShell {
    fn forward(&mut self, text: &str) -> Result<()> {
        if !self.is_running() {
            return Err(Error::ShellNotRunning);
        }
        let line = format!("{}\n", text);
        write_retrying(&mut self.writer, line.as_bytes()).map_err(|e| Error::ShellWriteFailed {
            reason: e.to_string(),
        })
    }
}

impl Drop for PtyShell {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to stop shell '{}': {}", self.command, e);
        }
    }
}

impl std::fmt::Debug for PtyShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyShell")
            .field("command", &self.command)
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}
