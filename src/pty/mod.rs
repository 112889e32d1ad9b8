//! Pseudoterminal (PTY) support
//!
//! Spawns the user's shell in a PTY and exposes it as a
//! [`ShellChannel`](crate::host::ShellChannel).

pub mod process;
pub mod shell;

pub use process::{pump_output, spawn_pty_process, SpawnConfig, SpawnedPty};
pub use shell::PtyShell;
