//! Terminal implementation of the host services
//!
//! Views are kept as named transcripts. Only one is primary at a time;
//! secondary views stay listed until closed. Output is echoed to a writer
//! (stdout for the interactive binary) tagged with the view it belongs to
//! when that is not the primary view.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::process::Command;

use super::{ContextId, ContextService, DocViewer, FileOpener, Host, LabelRegistry, OutputSink};
use crate::error::{Error, Result};

struct View {
    name: String,
    lines: Vec<String>,
}

/// Host services for a line-oriented terminal
pub struct TerminalHost {
    views: BTreeMap<ContextId, View>,
    visible: ContextId,
    secondary: Vec<ContextId>,
    labels: HashSet<String>,
    next_id: u64,
    echo: Box<dyn Write + Send>,
}

impl TerminalHost {
    /// Host echoing output to stdout
    pub fn new() -> Self {
        Self::with_echo(Box::new(std::io::stdout()))
    }

    /// Host that only keeps transcripts
    pub fn quiet() -> Self {
        Self::with_echo(Box::new(std::io::sink()))
    }

    pub fn with_echo(echo: Box<dyn Write + Send>) -> Self {
        Self {
            views: BTreeMap::new(),
            visible: ContextId(0),
            secondary: Vec::new(),
            labels: HashSet::new(),
            next_id: 0,
            echo,
        }
    }

    /// Mark `label` as used by some session
    pub fn reserve_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    pub fn release_label(&mut self, label: &str) -> bool {
        self.labels.remove(label)
    }

    /// Display name of `context`
    pub fn view_name(&self, context: ContextId) -> Option<&str> {
        self.views.get(&context).map(|v| v.name.as_str())
    }

    /// Everything appended to `context`
    pub fn transcript(&self, context: ContextId) -> &[String] {
        self.views
            .get(&context)
            .map(|v| v.lines.as_slice())
            .unwrap_or_default()
    }

    /// Views opened alongside the primary one, oldest first
    pub fn secondary_views(&self) -> &[ContextId] {
        &self.secondary
    }

    pub fn close_secondary_view(&mut self, context: ContextId) -> bool {
        let before = self.secondary.len();
        self.secondary.retain(|c| *c != context);
        before != self.secondary.len()
    }

    fn echo_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.echo, "{}", line).and_then(|_| self.echo.flush()) {
            debug!("Terminal echo failed: {}", e);
        }
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextService for TerminalHost {
    fn current_context(&self) -> ContextId {
        self.visible
    }

    fn set_visible_context(&mut self, context: ContextId) {
        if context != self.visible {
            debug!("Visible view is now {} ({:?})", context, self.view_name(context));
        }
        self.secondary.retain(|c| *c != context);
        self.visible = context;
    }

    fn open_secondary_view(&mut self, context: ContextId) {
        if context == self.visible || self.secondary.contains(&context) {
            return;
        }
        debug!("Opening {} as a secondary view", context);
        self.secondary.push(context);
    }

    fn open_context(&mut self, name: &str) -> ContextId {
        let id = ContextId(self.next_id);
        self.next_id += 1;
        self.views.insert(
            id,
            View {
                name: name.to_string(),
                lines: Vec::new(),
            },
        );
        id
    }
}

impl OutputSink for TerminalHost {
    fn append(&mut self, context: ContextId, text: &str) {
        let tagged = match self.views.get(&context) {
            Some(view) if context != self.visible => format!("[{}] {}", view.name, text),
            _ => text.to_string(),
        };
        self.echo_line(&tagged);

        match self.views.get_mut(&context) {
            Some(view) => view.lines.push(text.to_string()),
            None => warn!("Output for unknown view {} dropped from transcript", context),
        }
    }
}

impl LabelRegistry for TerminalHost {
    fn label_in_use(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    fn session_renamed(&mut self, old: &str, new: &str) {
        self.labels.remove(old);
        self.labels.insert(new.to_string());
    }
}

/// Opens files in the user's editor
#[derive(Debug, Clone)]
pub struct EditorOpener {
    editor: String,
}

impl EditorOpener {
    /// Editor from `$VISUAL` or `$EDITOR`, falling back to `vi`
    pub fn from_env() -> Self {
        let editor = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string());
        Self::new(editor)
    }

    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }
}

impl FileOpener for EditorOpener {
    fn open_file(&self, path: &Path, host: &mut dyn Host) -> Result<()> {
        let view = host.open_context(&path.display().to_string());
        host.set_visible_context(view);

        // `$EDITOR` may carry flags, e.g. "code --wait"
        let mut parts = self.editor.split_whitespace();
        let program = parts.next().unwrap_or("vi");
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|e| Error::FileOpenFailed {
                path: path.to_path_buf(),
                reason: format!("cannot run '{}': {}", program, e),
            })?;

        if !status.success() {
            return Err(Error::FileOpenFailed {
                path: path.to_path_buf(),
                reason: format!("'{}' exited with {}", program, status),
            });
        }
        Ok(())
    }
}

/// Shows manual pages in a secondary view
#[derive(Debug, Clone)]
pub struct ManViewer {
    program: String,
}

impl ManViewer {
    pub fn new() -> Self {
        Self::with_program("man")
    }

    /// Use `program <topic>` instead of `man <topic>`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ManViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocViewer for ManViewer {
    fn show(&self, topic: &str, host: &mut dyn Host) -> Result<()> {
        let output = Command::new(&self.program)
            .arg(topic)
            .env("MANPAGER", "cat")
            .env("MANWIDTH", "80")
            .output()
            .map_err(|e| Error::DocumentationFailed {
                topic: topic.to_string(),
                reason: format!("cannot run '{}': {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::DocumentationFailed {
                topic: topic.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let view = host.open_context(&format!("{} {}", self.program, topic));
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            host.append(view, line);
        }
        host.open_secondary_view(view);
        Ok(())
    }
}
