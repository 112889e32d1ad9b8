//! Integration Tests for Pipeline Flows
//!
//! Runs whole command lines through the default pipeline against mock host
//! services and checks what reaches the shell.

#[path = "../test_utils/mock_host.rs"]
mod mock_host;

use mock_host::{shell_session, MockHost, MockServices, MockShell, SHELL_VIEW};
use shellgate::host::{ContextService, Evaluator, Host, OutputSink};
use shellgate::models::{Outcome, Session, ShellSession, NOOP};
use shellgate::pipeline::{PipelineRunner, RunState};
use shellgate::{Config, Error, PipelineBuilder, Result};
use std::path::PathBuf;
use std::sync::Arc;

struct Harness {
    runner: PipelineRunner,
    services: MockServices,
    session: ShellSession,
    host: MockHost,
    shell: MockShell,
}

impl Harness {
    fn new() -> Self {
        Self::with_host(MockHost::new())
    }

    fn with_host(host: MockHost) -> Self {
        let services = MockServices::new();
        let pipeline =
            PipelineBuilder::from_config(&Config::default(), services.handler_services()).unwrap();
        Self {
            runner: PipelineRunner::new(Arc::new(pipeline)),
            services,
            session: shell_session(),
            host,
            shell: MockShell::new(),
        }
    }

    fn run(&mut self, line: &str) -> Outcome {
        let mut session = Session::new(&mut self.session, &mut self.host);
        self.runner
            .run(line, &mut session, &mut self.shell)
            .unwrap()
    }
}

#[test]
fn test_unhandled_command_is_forwarded_verbatim() {
    let mut h = Harness::new();
    let outcome = h.run("ls -la");

    assert_eq!(outcome, Outcome::Forwarded("ls -la".to_string()));
    assert_eq!(h.shell.sent, vec!["ls -la"]);
    assert!(h.host.output.is_empty());
    assert_eq!(h.runner.state(), RunState::Idle);
}

#[test]
fn test_empty_line_is_forwarded() {
    let mut h = Harness::new();
    let outcome = h.run("   ");
    assert!(outcome.is_forwarded());
    assert_eq!(h.shell.sent, vec!["   "]);
}

#[test]
fn test_man_opens_documentation_and_sends_noop() {
    let mut h = Harness::new();
    let outcome = h.run("man emacs");

    assert!(matches!(outcome, Outcome::Suppressed { ref command, .. } if command == "man emacs"));
    assert_eq!(h.shell.sent, vec![NOOP]);
    assert_eq!(h.services.docs.topics(), vec!["emacs"]);
    assert_eq!(h.host.visible, SHELL_VIEW);
    assert_eq!(h.host.secondary.len(), 1);
}

#[test]
fn test_file_open_restores_shell_view() {
    let mut h = Harness::new();
    let outcome = h.run("ff notes.txt");

    assert!(outcome.is_suppressed());
    assert_eq!(h.shell.sent, vec![NOOP]);
    assert_eq!(
        h.services.files.opened(),
        vec![PathBuf::from("/home/user/notes.txt")]
    );
    // The editor's view stays reachable but the shell is back in front
    assert_eq!(h.host.visible, SHELL_VIEW);
    assert_eq!(h.host.secondary.len(), 1);
    assert_ne!(h.host.secondary[0], SHELL_VIEW);
}

#[test]
fn test_file_open_without_argument() {
    let mut h = Harness::new();
    let outcome = h.run("ff");

    assert!(outcome.is_suppressed());
    assert_eq!(h.host.lines(SHELL_VIEW), vec!["usage: ff <path>"]);
    assert!(h.services.files.opened().is_empty());
}

#[test]
fn test_credential_prefix_then_relabel() {
    let mut h = Harness::new();
    let outcome = h.run("apt-get update");

    assert_eq!(outcome, Outcome::Forwarded("sudo apt-get update".to_string()));
    assert_eq!(h.shell.sent, vec!["sudo apt-get update"]);
    assert_eq!(h.session.label, "*sudo-shell*");
    assert!(h.host.labels.contains("*sudo-shell*"));
}

#[test]
fn test_substitution_rewrite() {
    let mut h = Harness::new();
    assert_eq!(h.run("<file.txt"), Outcome::Forwarded("cat file.txt".to_string()));
    assert_eq!(h.run("cat <file.txt"), Outcome::Forwarded("cat <file.txt".to_string()));
}

#[test]
fn test_relabel_collision_aborts_with_diagnostic() {
    let mut h = Harness::with_host(MockHost::with_label("*sudo-shell*"));
    let outcome = h.run("sudo ls");

    match outcome {
        Outcome::Aborted { step, reason } => {
            assert_eq!(step, "session_relabel");
            assert_eq!(
                reason.as_deref(),
                Some("a session named *sudo-shell* already exists")
            );
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(h.shell.sent, vec![NOOP]);
    assert_eq!(
        h.host.lines(SHELL_VIEW),
        vec!["a session named *sudo-shell* already exists"]
    );
    assert_eq!(h.session.label, "*shell*");
}

#[test]
fn test_relabel_persists_across_commands() {
    let mut h = Harness::new();
    h.run("sudo -i");
    assert_eq!(h.session.label, "*sudo-shell*");

    h.run("ls");
    assert_eq!(h.session.label, "*sudo-shell*");

    // Same label again is not a collision with itself
    assert!(h.run("sudo ls").is_forwarded());
}

#[test]
fn test_eval_prints_result() {
    let mut h = Harness::new();
    let outcome = h.run("eval 1 + 2 * 3");

    assert!(outcome.is_suppressed());
    assert_eq!(h.shell.sent, vec![NOOP]);
    assert_eq!(h.host.lines(SHELL_VIEW), vec!["=> 7"]);
}

#[test]
fn test_eval_error_degrades_to_diagnostic() {
    let mut h = Harness::new();
    assert!(h.run("eval 1 / 0").is_suppressed());
    let lines = h.host.lines(SHELL_VIEW);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("eval error:"));
}

#[test]
fn test_eval_in_own_view_is_not_echoed() {
    /// Evaluator that shows its result in a view of its own
    struct ResultView;

    impl Evaluator for ResultView {
        fn evaluate(&self, expression: &str) -> Result<String> {
            Ok(expression.to_string())
        }

        fn evaluate_in(&self, expression: &str, host: &mut dyn Host) -> Result<String> {
            let view = host.open_context("*result*");
            host.append(view, expression);
            host.set_visible_context(view);
            Ok(expression.to_string())
        }
    }

    let services = MockServices::new();
    let mut handler_services = services.handler_services();
    handler_services.expression = Arc::new(ResultView);
    let pipeline = PipelineBuilder::from_config(&Config::default(), handler_services).unwrap();
    let mut runner = PipelineRunner::new(Arc::new(pipeline));
    let mut state = shell_session();
    let mut host = MockHost::new();
    let mut shell = MockShell::new();

    let mut session = Session::new(&mut state, &mut host);
    let outcome = runner.run("eval (car x)", &mut session, &mut shell).unwrap();

    assert!(outcome.is_suppressed());
    assert!(host.lines(SHELL_VIEW).is_empty());
    assert_eq!(host.visible, SHELL_VIEW);
    assert_eq!(host.secondary.len(), 1);
    assert_eq!(host.lines(host.secondary[0]), vec!["(car x)"]);
}

#[test]
fn test_calc() {
    let mut h = Harness::new();
    h.run("calc 2^8");
    h.run("calc oops");
    let lines = h.host.lines(SHELL_VIEW);
    assert_eq!(lines[0], "256");
    assert!(lines[1].starts_with("calc error:"));
    assert_eq!(h.shell.sent, vec![NOOP, NOOP]);
}

#[test]
fn test_deeply_nested_calc_is_a_diagnostic() {
    let mut h = Harness::new();
    let line = format!("calc {}", "(".repeat(200_000));
    let outcome = h.run(&line);

    assert!(outcome.is_suppressed());
    assert_eq!(h.shell.sent, vec![NOOP]);
    let lines = h.host.lines(SHELL_VIEW);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("calc error:"));
    assert!(lines[0].contains("nested deeper than"));

    // The session keeps working
    assert_eq!(h.run("ls"), Outcome::Forwarded("ls".to_string()));
}

#[test]
fn test_deeply_nested_eval_is_a_diagnostic() {
    let mut h = Harness::new();
    let outcome = h.run(&format!("eval {}1", "-".repeat(200_000)));

    assert!(outcome.is_suppressed());
    let lines = h.host.lines(SHELL_VIEW);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("eval error:"));
}

#[test]
fn test_exactly_one_forward_per_run() {
    let mut h = Harness::new();
    let lines = ["ls", "man ls", "ff a", "eval 1", "<x", "", "apt update"];
    for line in lines {
        h.run(line);
    }
    assert_eq!(h.shell.sent.len(), lines.len());
}

#[test]
fn test_history_records_every_run() {
    let mut h = Harness::new();
    h.run("ls");
    h.run("man ls");

    assert_eq!(h.session.run_count(), 2);
    let last = h.session.last_run().unwrap();
    assert_eq!(last.line, "man ls");
    assert!(!last.reached_shell());
    assert!(h.session.history().next().unwrap().reached_shell());
}

#[test]
fn test_shell_write_failure_is_returned() {
    let services = MockServices::new();
    let pipeline =
        PipelineBuilder::from_config(&Config::default(), services.handler_services()).unwrap();
    let mut runner = PipelineRunner::new(Arc::new(pipeline));
    let mut state = shell_session();
    let mut host = MockHost::new();
    let mut shell = MockShell::broken();

    let mut session = Session::new(&mut state, &mut host);
    let result = runner.run("ls", &mut session, &mut shell);
    assert!(matches!(result, Err(Error::ShellWriteFailed { .. })));
    assert_eq!(runner.state(), RunState::Idle);
    assert_eq!(state.run_count(), 1);
}
