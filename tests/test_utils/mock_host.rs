//! Mock Host Implementation for Testing
//!
//! In-memory stand-ins for every host collaborator, shared by the
//! integration and unit test targets via `#[path]`.

#![allow(dead_code)]

use shellgate::error::{Error, Result};
use shellgate::handlers::HandlerServices;
use shellgate::host::{
    ContextId, ContextService, DocViewer, FileOpener, Host, LabelRegistry, OutputSink,
    ShellChannel,
};
use shellgate::models::ShellSession;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The view every fixture session starts in
pub const SHELL_VIEW: ContextId = ContextId(0);

/// Records every host interaction
#[derive(Debug)]
pub struct MockHost {
    pub visible: ContextId,
    pub secondary: Vec<ContextId>,
    pub output: Vec<(ContextId, String)>,
    pub labels: HashSet<String>,
    next_id: u64,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            visible: SHELL_VIEW,
            secondary: Vec::new(),
            output: Vec::new(),
            labels: HashSet::new(),
            next_id: 1,
        }
    }

    /// Host where another session already uses `label`
    pub fn with_label(label: &str) -> Self {
        let mut host = Self::new();
        host.labels.insert(label.to_string());
        host
    }

    /// Text appended to `context`, in order
    pub fn lines(&self, context: ContextId) -> Vec<&str> {
        self.output
            .iter()
            .filter(|(c, _)| *c == context)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextService for MockHost {
    fn current_context(&self) -> ContextId {
        self.visible
    }

    fn set_visible_context(&mut self, context: ContextId) {
        self.visible = context;
    }

    fn open_secondary_view(&mut self, context: ContextId) {
        self.secondary.push(context);
    }

    fn open_context(&mut self, _name: &str) -> ContextId {
        let id = ContextId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl OutputSink for MockHost {
    fn append(&mut self, context: ContextId, text: &str) {
        self.output.push((context, text.to_string()));
    }
}

impl LabelRegistry for MockHost {
    fn label_in_use(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    fn session_renamed(&mut self, old: &str, new: &str) {
        self.labels.remove(old);
        self.labels.insert(new.to_string());
    }
}

/// Shell channel that remembers what it was sent
#[derive(Debug, Default)]
pub struct MockShell {
    pub sent: Vec<String>,
    pub fail: bool,
}

impl MockShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell whose every write fails
    pub fn broken() -> Self {
        Self {
            sent: Vec::new(),
            fail: true,
        }
    }
}

impl ShellChannel for MockShell {
    fn forward(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::ShellWriteFailed {
                reason: "broken pipe".to_string(),
            });
        }
        self.sent.push(text.to_string());
        Ok(())
    }
}

/// File opener that switches to a new view, like an editor would
#[derive(Debug, Default)]
pub struct MockFileOpener {
    pub opened: Mutex<Vec<PathBuf>>,
}

impl MockFileOpener {
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl FileOpener for MockFileOpener {
    fn open_file(&self, path: &Path, host: &mut dyn Host) -> Result<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let view = host.open_context(&path.display().to_string());
        host.set_visible_context(view);
        Ok(())
    }
}

/// Documentation viewer that opens a secondary view
#[derive(Debug, Default)]
pub struct MockDocViewer {
    pub topics: Mutex<Vec<String>>,
}

impl MockDocViewer {
    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

impl DocViewer for MockDocViewer {
    fn show(&self, topic: &str, host: &mut dyn Host) -> Result<()> {
        self.topics.lock().unwrap().push(topic.to_string());
        let view = host.open_context(topic);
        host.open_secondary_view(view);
        Ok(())
    }
}

/// Handler services backed by the mocks above
pub struct MockServices {
    pub files: Arc<MockFileOpener>,
    pub docs: Arc<MockDocViewer>,
}

impl MockServices {
    pub fn new() -> Self {
        Self {
            files: Arc::new(MockFileOpener::default()),
            docs: Arc::new(MockDocViewer::default()),
        }
    }

    pub fn handler_services(&self) -> HandlerServices {
        HandlerServices::new(self.files.clone(), self.docs.clone())
    }
}

/// A fresh session in the shell view
pub fn shell_session() -> ShellSession {
    ShellSession::new("*shell*", SHELL_VIEW, PathBuf::from("/home/user"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_host_contexts() {
        let mut host = MockHost::new();
        let a = host.open_context("a");
        let b = host.open_context("b");
        assert_ne!(a, b);
        assert_ne!(a, SHELL_VIEW);

        host.set_visible_context(a);
        assert_eq!(host.current_context(), a);
    }

    #[test]
    fn test_mock_host_output() {
        let mut host = MockHost::new();
        host.append(SHELL_VIEW, "one");
        host.append(ContextId(7), "other");
        host.append(SHELL_VIEW, "two");
        assert_eq!(host.lines(SHELL_VIEW), vec!["one", "two"]);
    }

    #[test]
    fn test_mock_shell() {
        let mut shell = MockShell::new();
        shell.forward("ls").unwrap();
        assert_eq!(shell.sent, vec!["ls"]);
        assert!(MockShell::broken().forward("ls").is_err());
    }

    #[test]
    fn test_mock_services() {
        let services = MockServices::new();
        let mut host = MockHost::new();
        services
            .files
            .open_file(Path::new("/tmp/a"), &mut host)
            .unwrap();
        services.docs.show("ls", &mut host).unwrap();
        assert_eq!(services.files.opened(), vec![PathBuf::from("/tmp/a")]);
        assert_eq!(services.docs.topics(), vec!["ls"]);
        assert_eq!(host.secondary.len(), 1);
    }
}
