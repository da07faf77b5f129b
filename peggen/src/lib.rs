//! Packrat parser generator.
//!
//! One plain-text grammar file — token rules, keywords, operators, AST
//! node shapes, grammar rules and a trailing hack block — in; one
//! self-contained parser module (tokenizer, packrat recursive-descent
//! parser, typed AST) out.
//!
//! The pipeline is synchronous and deterministic: section split, DSL
//! parse + group rewriting, three independent code generators, final
//! assembly. Stages accumulate errors without aborting and the pipeline
//! halts between stages.

pub mod analyze;
pub mod config;
pub mod gen;
pub mod model;
pub mod parse;
pub mod payload;
pub mod preprocess;
pub mod split;

pub use gen::assemble::Options;

use pegkit::{ErrorBag, Snippet};
use thiserror::Error;

/// Pipeline failure, split by stage so CLI glue can map to exit codes.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Wrong sectioning or malformed section headers.
    #[error("{0}")]
    Structure(String),
    /// DSL parse failures, joined across all bad items.
    #[error("{0}")]
    Parse(String),
    /// Code-generation failures, joined across generators.
    #[error("{0}")]
    CodeGen(String),
}

impl GenerateError {
    /// Process exit code for CLI glue: 2 for spec problems, 3 for
    /// code-gen problems (1 is reserved for preprocess/IO).
    pub fn exit_code(&self) -> u8 {
        match self {
            GenerateError::Structure(_) | GenerateError::Parse(_) => 2,
            GenerateError::CodeGen(_) => 3,
        }
    }
}

fn join_errors(bag: &ErrorBag) -> String {
    bag.join().map(|e| e.to_string()).unwrap_or_default()
}

/// Runs the whole pipeline with default options.
pub fn generate(text: &str) -> Result<String, GenerateError> {
    generate_with(text, &Options::default())
}

/// Runs the whole pipeline. Deterministic: the same input yields
/// byte-identical output.
pub fn generate_with(text: &str, options: &Options) -> Result<String, GenerateError> {
    let input = Snippet::new("", text);

    let mut errors = ErrorBag::new();
    let sections = split::split(&input, &mut errors);
    let Some(sections) = sections else {
        return Err(GenerateError::Structure(join_errors(&errors)));
    };
    if !errors.is_empty() {
        return Err(GenerateError::Structure(join_errors(&errors)));
    }
    log::debug!("split: six sections");

    let mut errors = ErrorBag::new();
    let lang = analyze::analyze(&sections, &mut errors);
    if !errors.is_empty() {
        return Err(GenerateError::Parse(join_errors(&errors)));
    }

    let mut tokenizer_errors = ErrorBag::new();
    let tokenizer_src = gen::tokenizer::generate(&lang, &mut tokenizer_errors);
    let mut grammar_errors = ErrorBag::new();
    let parser_src = gen::grammar::generate(&lang, &mut grammar_errors);
    let ast_src = gen::ast::generate(&lang);
    if !tokenizer_errors.is_empty() || !grammar_errors.is_empty() {
        let mut parts = Vec::new();
        if let Some(e) = tokenizer_errors.join() {
            parts.push(e.to_string());
        }
        if let Some(e) = grammar_errors.join() {
            parts.push(e.to_string());
        }
        return Err(GenerateError::CodeGen(parts.join("\n")));
    }

    let out = gen::assemble::assemble(&lang, &ast_src, &tokenizer_src, &parser_src, options);
    Ok(format!("{}\n", out.trim_end_matches('\n')))
}
