//! A single independent analysis pipeline.
//!
//! A pipeline runs the complete front end on one source text: lexer, parser
//! on whatever tokens the lexer produced, semantic analysis on whatever AST
//! the parser produced. Earlier-stage diagnostics never stop later stages.

use crate::frontend::token::Token;
use crate::frontend::{Lexer, Parser, SemanticAnalyzer, SemanticConfig};
use crate::utils::Diagnostic;

/// How one pipeline is tuned. Pipelines share the same front end and differ
/// only in configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub name: String,
    /// Require comparison operands to be mutually compatible.
    pub strict_comparisons: bool,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strict_comparisons: false,
        }
    }

    pub fn strict(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strict_comparisons: true,
        }
    }
}

/// Everything one pipeline produced for one source text.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub name: String,
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One runnable pipeline
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Run all three stages and stamp this pipeline's name on every
    /// diagnostic it collected.
    pub fn run(&self, source: &str) -> PipelineReport {
        let (tokens, mut diagnostics) = Lexer::new(source).tokenize();

        let (program, parse_diagnostics) = Parser::new(tokens.clone()).parse();
        diagnostics.extend(parse_diagnostics);

        let semantic_config = SemanticConfig {
            strict_comparisons: self.config.strict_comparisons,
        };
        diagnostics.extend(SemanticAnalyzer::new(semantic_config).analyze(&program));

        for diagnostic in &mut diagnostics {
            diagnostic.pipeline = self.config.name.clone();
        }

        log::info!(
            "pipeline '{}' finished with {} diagnostics",
            self.config.name,
            diagnostics.len()
        );

        PipelineReport {
            name: self.config.name.clone(),
            tokens,
            diagnostics,
        }
    }
}
