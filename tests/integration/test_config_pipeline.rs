//! Integration Tests for Configuration-Driven Pipelines
//!
//! Writes configuration files to a temporary directory, loads them, and
//! checks the pipeline they produce.

#[path = "../test_utils/mock_host.rs"]
mod mock_host;

use mock_host::{shell_session, MockHost, MockServices, MockShell, SHELL_VIEW};
use shellgate::config::{ConfigLoader, PreprocessorKind, ProcessorBinding, ProcessorKind};
use shellgate::handlers::HandlerServices;
use shellgate::models::{Outcome, Session};
use shellgate::pipeline::PipelineRunner;
use shellgate::{Config, Error, PipelineBuilder};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CUSTOM_CONFIG: &str = r#"
[pipeline]
preprocessors = ["substitution", "credential_prefix", "session_relabel"]

[[pipeline.processors]]
command = "open"
handler = "file_open"

[[pipeline.processors]]
command = "open"
handler = "documentation_lookup"

[[pipeline.processors]]
command = "="
handler = "calculator_eval"

[credential]
pattern = "^reboot\\b"
prefix = "doas"

[substitution]
sigil = "@"
command = "less"

[relabel]
template = "[{seed}]"

[relabel.seeds]
doas = "root"
"#;

fn write_config(contents: &str, file: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(file);
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn run_lines(services: HandlerServices, config: &Config, lines: &[&str]) -> (Vec<Outcome>, MockHost, String) {
    let pipeline = PipelineBuilder::from_config(config, services).unwrap();
    let mut runner = PipelineRunner::new(Arc::new(pipeline));
    let mut state = shell_session();
    let mut host = MockHost::new();
    let mut shell = MockShell::new();

    let mut outcomes = Vec::new();
    for line in lines {
        let mut session = Session::new(&mut state, &mut host);
        outcomes.push(runner.run(line, &mut session, &mut shell).unwrap());
    }
    (outcomes, host, state.label)
}

#[test]
fn test_custom_toml_config() {
    let (_dir, path) = write_config(CUSTOM_CONFIG, "config.toml");
    let config = shellgate::init_with_config(&path).unwrap();
    assert_eq!(
        config.pipeline.preprocessors,
        vec![
            PreprocessorKind::Substitution,
            PreprocessorKind::CredentialPrefix,
            PreprocessorKind::SessionRelabel,
        ]
    );

    let services = MockServices::new();
    let (outcomes, host, label) = run_lines(
        services.handler_services(),
        &config,
        &["@notes.md", "reboot now", "open README", "= 6*7", "apt-get update"],
    );

    assert_eq!(outcomes[0], Outcome::Forwarded("less notes.md".to_string()));
    assert_eq!(outcomes[1], Outcome::Forwarded("doas reboot now".to_string()));
    assert_eq!(label, "[root]");

    // "open" is bound twice; the file opener was registered first
    assert!(outcomes[2].is_suppressed());
    assert_eq!(services.files.opened().len(), 1);
    assert!(services.docs.topics().is_empty());

    assert!(outcomes[3].is_suppressed());
    assert_eq!(host.lines(SHELL_VIEW), vec!["42"]);

    // Default privileged pattern was replaced, default commands are gone
    assert_eq!(outcomes[4], Outcome::Forwarded("apt-get update".to_string()));
}

#[test]
fn test_json_config() {
    let mut config = Config::default();
    config.pipeline.preprocessors.clear();
    config.pipeline.processors = vec![ProcessorBinding::new("doc", ProcessorKind::DocumentationLookup)];

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    ConfigLoader::new().save_to_path(&config, &path).unwrap();
    assert!(fs::read_to_string(&path).unwrap().trim_start().starts_with('{'));

    let loaded = shellgate::init_with_config(&path).unwrap();
    assert_eq!(loaded, config);

    let services = MockServices::new();
    let (outcomes, _, _) = run_lines(services.handler_services(), &loaded, &["doc tar", "apt update"]);
    assert!(outcomes[0].is_suppressed());
    assert_eq!(services.docs.topics(), vec!["tar"]);
    assert_eq!(outcomes[1], Outcome::Forwarded("apt update".to_string()));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_dir, path) = write_config("[substitution]\nsigil = \"<<\"\n", "config.toml");
    let result = shellgate::init_with_config(&path);
    assert!(matches!(
        result,
        Err(Error::ConfigValidationFailed { ref field, .. }) if field == "substitution.sigil"
    ));
}

#[test]
fn test_unknown_handler_kind_is_a_parse_error() {
    let (_dir, path) = write_config(
        "[[pipeline.processors]]\ncommand = \"x\"\nhandler = \"teleport\"\n",
        "config.toml",
    );
    let result = shellgate::init_with_config(&path);
    assert!(matches!(result, Err(Error::ConfigParseFailed { .. })));
}

#[test]
fn test_custom_label_namer_overrides_template() {
    let services = MockServices::new();
    let handler_services = services
        .handler_services()
        .with_namer(Arc::new(|seed: &str| Some(format!("<{}>", seed))));

    let (_, _, label) = run_lines(handler_services, &Config::default(), &["sudo ls"]);
    assert_eq!(label, "<sudo>");
}

#[test]
fn test_search_path_loading() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.substitution.command = "bat".to_string();

    let loader = ConfigLoader::new();
    loader
        .save_to_path(&config, &dir.path().join("config.toml"))
        .unwrap();

    let mut loader = ConfigLoader::new();
    loader.set_search_path(dir.path().join("config"));
    if std::env::var_os("SHELLGATE_CONFIG").is_none() {
        let loaded = loader.load_config(&Default::default()).unwrap();
        assert_eq!(loaded.substitution.command, "bat");
        assert_eq!(loader.current_path(), Some(dir.path().join("config.toml").as_path()));
    }
}
