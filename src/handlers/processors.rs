//! Built-in processors
//!
//! Every built-in handles its command completely and always suppresses
//! forwarding, even when the delegated host service fails. Failures become
//! a one-line diagnostic in the shell's view.

use std::sync::Arc;

use crate::host::{ContextService, DocViewer, Evaluator, FileOpener};
use crate::models::Session;
use crate::pipeline::Processor;

/// Opens the file named by the first argument
pub struct FileOpen {
    opener: Arc<dyn FileOpener>,
}

impl FileOpen {
    pub const NAME: &'static str = "file_open";

    pub fn new(opener: Arc<dyn FileOpener>) -> Self {
        Self { opener }
    }
}

impl Processor for FileOpen {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Open a file in the editor instead of running a command"
    }

    fn process(&self, args: Vec<String>, session: &mut Session<'_>) -> bool {
        let Some(path) = args.first() else {
            session.print("usage: ff <path>");
            return true;
        };

        let path = session.shell.resolve_path(path);
        debug!("Opening file {}", path.display());
        if let Err(e) = self.opener.open_file(&path, &mut *session.host) {
            warn!("File open failed: {}", e);
            session.print(&format!("ff: {}", e));
        }
        true
    }
}

/// Evaluates the arguments as one expression and prints the result
pub struct ExpressionEval {
    evaluator: Arc<dyn Evaluator>,
}

impl ExpressionEval {
    pub const NAME: &'static str = "expression_eval";

    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }
}

impl Processor for ExpressionEval {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Evaluate an expression and print its value"
    }

    fn process(&self, args: Vec<String>, session: &mut Session<'_>) -> bool {
        let expression = args.join(" ");
        let before = session.host.current_context();

        match self.evaluator.evaluate_in(&expression, &mut *session.host) {
            // Evaluation that switched views is showing its own result there
            Ok(value) if session.host.current_context() == before => {
                session.print(&format!("=> {}", value));
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Expression evaluation failed: {}", e);
                session.print(&format!("eval error: {}", e));
            }
        }
        true
    }
}

/// Evaluates the arguments with the calculator and prints the result
pub struct CalculatorEval {
    evaluator: Arc<dyn Evaluator>,
}

impl CalculatorEval {
    pub const NAME: &'static str = "calculator_eval";

    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }
}

impl Processor for CalculatorEval {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Evaluate a calculator expression"
    }

    fn process(&self, args: Vec<String>, session: &mut Session<'_>) -> bool {
        let expression = args.join(" ");
        match self.evaluator.evaluate(&expression) {
            Ok(value) => session.print(&value),
            Err(e) => {
                warn!("Calculator evaluation failed: {}", e);
                session.print(&format!("calc error: {}", e));
            }
        }
        true
    }
}

/// Shows documentation for the topic in the first argument
pub struct DocumentationLookup {
    viewer: Arc<dyn DocViewer>,
}

impl DocumentationLookup {
    pub const NAME: &'static str = "documentation_lookup";

    pub fn new(viewer: Arc<dyn DocViewer>) -> Self {
        Self { viewer }
    }
}

impl Processor for DocumentationLookup {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Show documentation in a side view"
    }

    fn process(&self, args: Vec<String>, session: &mut Session<'_>) -> bool {
        let Some(topic) = args.first() else {
            session.print("usage: man <topic>");
            return true;
        };

        if let Err(e) = self.viewer.show(topic, &mut *session.host) {
            warn!("Documentation lookup failed: {}", e);
            session.print(&format!("man: {}", e));
        }
        true
    }
}
