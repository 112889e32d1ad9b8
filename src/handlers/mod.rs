//! Built-in handlers and pipeline assembly
//!
//! [`PipelineBuilder`] turns the `pipeline` section of a [`Config`] into a
//! ready [`Pipeline`], wiring each built-in to the host services it needs.

pub mod preprocessors;
pub mod processors;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, PreprocessorKind, ProcessorKind};
use crate::error::{Error, Result};
use crate::eval::ArithmeticEvaluator;
use crate::host::{DocViewer, Evaluator, FileOpener, LabelNamer};
use crate::pipeline::{Pipeline, Preprocessor, PreprocessorChain, Processor, ProcessorRegistry};

pub use preprocessors::{CredentialPrefix, SessionRelabel, SigilSubstitution};
pub use processors::{CalculatorEval, DocumentationLookup, ExpressionEval, FileOpen};

/// Host services the built-in processors delegate to
#[derive(Clone)]
pub struct HandlerServices {
    pub file_opener: Arc<dyn FileOpener>,
    pub doc_viewer: Arc<dyn DocViewer>,
    pub expression: Arc<dyn Evaluator>,
    pub calculator: Arc<dyn Evaluator>,
    /// Overrides the configured label template
    pub namer: Option<Arc<dyn LabelNamer>>,
}

impl HandlerServices {
    /// Services with the arithmetic evaluator for both evaluation handlers
    pub fn new(file_opener: Arc<dyn FileOpener>, doc_viewer: Arc<dyn DocViewer>) -> Self {
        let evaluator = Arc::new(ArithmeticEvaluator::new());
        Self {
            file_opener,
            doc_viewer,
            expression: evaluator.clone(),
            calculator: evaluator,
            namer: None,
        }
    }

    pub fn with_namer(mut self, namer: Arc<dyn LabelNamer>) -> Self {
        self.namer = Some(namer);
        self
    }
}

/// Builds pipelines from configuration
pub struct PipelineBuilder {
    services: HandlerServices,
}

impl PipelineBuilder {
    pub fn new(services: HandlerServices) -> Self {
        Self { services }
    }

    /// Build the pipeline described by `config`
    pub fn from_config(config: &Config, services: HandlerServices) -> Result<Pipeline> {
        Self::new(services).build(config)
    }

    pub fn build(&self, config: &Config) -> Result<Pipeline> {
        let mut chain = PreprocessorChain::new();
        for kind in &config.pipeline.preprocessors {
            chain.push(self.preprocessor(*kind, config)?);
        }

        let mut registry = ProcessorRegistry::new();
        for binding in &config.pipeline.processors {
            registry.register(binding.command.clone(), self.processor(binding.handler));
        }

        debug!(
            "Built pipeline: preprocessors {:?}, processors {:?}",
            chain.names(),
            registry
        );
        Ok(Pipeline::with_parts(chain, registry))
    }

    /// Instantiate one built-in preprocessor
    pub fn preprocessor(&self, kind: PreprocessorKind, config: &Config) -> Result<Arc<dyn Preprocessor>> {
        Ok(match kind {
            PreprocessorKind::CredentialPrefix => Arc::new(CredentialPrefix::new(
                &config.credential.pattern,
                config.credential.prefix.clone(),
            )?),
            PreprocessorKind::Substitution => {
                let sigil = config.substitution.sigil_char().ok_or_else(|| {
                    Error::ConfigValidationFailed {
                        field: "substitution.sigil".to_string(),
                        reason: "Sigil must be exactly one character".to_string(),
                    }
                })?;
                Arc::new(SigilSubstitution::new(sigil, config.substitution.command.clone()))
            }
            PreprocessorKind::SessionRelabel => {
                let namer = self
                    .services
                    .namer
                    .clone()
                    .unwrap_or_else(|| Arc::new(config.relabel.label_template()));
                let seeds: HashMap<String, String> = config
                    .relabel
                    .seeds
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Arc::new(SessionRelabel::new(seeds, namer))
            }
        })
    }

    /// Instantiate one built-in processor
    pub fn processor(&self, kind: ProcessorKind) -> Arc<dyn Processor> {
        match kind {
            ProcessorKind::FileOpen => Arc::new(FileOpen::new(self.services.file_opener.clone())),
            ProcessorKind::ExpressionEval => {
                Arc::new(ExpressionEval::new(self.services.expression.clone()))
            }
            ProcessorKind::CalculatorEval => {
                Arc::new(CalculatorEval::new(self.services.calculator.clone()))
            }
            ProcessorKind::DocumentationLookup => {
                Arc::new(DocumentationLookup::new(self.services.doc_viewer.clone()))
            }
        }
    }
}
