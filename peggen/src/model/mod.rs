//! The language model: rule-tree arenas, AST node descriptors, and the
//! [`Language`] aggregate the code generators read from.

mod grammar_tree;
mod token_tree;

pub use grammar_tree::{GrammarKind, GrammarNode, GrammarNodeId, GrammarTree};
pub use token_tree::{TokenKind, TokenNode, TokenNodeId, TokenTree};

use crate::config;
use indexmap::IndexMap;
use pegkit::{Name, Snippet};
use std::collections::HashSet;
use thiserror::Error;

/// A declared AST node: name plus its ordered field names.
#[derive(Debug)]
pub struct AstNodeDef {
    name: String,
    fields: Vec<Name>,
    snippet: Snippet,
}

impl AstNodeDef {
    pub fn new(name: &str, fields: &[&str], snippet: Snippet) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(|f| Name::new(f)).collect(),
            snippet,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Name] {
        &self.fields
    }

    pub fn snippet(&self) -> &Snippet {
        &self.snippet
    }
}

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("operator {op:?} contains unsupported character {ch:?}")]
    UnknownOperatorChar { op: String, ch: char },
}

/// Everything the grammar file declares, in declaration order, plus the
/// derived maps the generators need.
///
/// A `Language` is built empty, populated by the analysis stage, mutated
/// once by the group rewriter, and read-only afterwards.
#[derive(Debug, Default)]
pub struct Language {
    pub token_tree: TokenTree,
    pub grammar_tree: GrammarTree,

    token_rules: Vec<TokenNodeId>,
    keywords: Vec<String>,
    keyword_set: HashSet<String>,
    operators: Vec<String>,
    operator_name_map: IndexMap<String, String>,
    ast_nodes: Vec<AstNodeDef>,
    grammar_rules: Vec<GrammarNodeId>,
    hack_code: String,
    memo_id_map: IndexMap<GrammarNodeId, usize>,
}

impl Language {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: &str) {
        self.keywords.push(keyword.to_string());
        self.keyword_set.insert(keyword.to_string());
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keyword_set.contains(word)
    }

    /// Registers an operator and derives its spelled-out name
    /// (`<<=` → `less_less_equal`).
    pub fn add_operator(&mut self, operator: &str) -> Result<(), LanguageError> {
        let mut names = Vec::with_capacity(operator.len());
        for &b in operator.as_bytes() {
            match config::operator_char_name(b) {
                Some(name) => names.push(name),
                None => {
                    return Err(LanguageError::UnknownOperatorChar {
                        op: operator.to_string(),
                        ch: b as char,
                    })
                }
            }
        }
        self.operators.push(operator.to_string());
        self.operator_name_map
            .insert(operator.to_string(), names.join("_"));
        Ok(())
    }

    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    /// Operator literal → spelled-out name, in declaration order.
    pub fn operator_name_map(&self) -> &IndexMap<String, String> {
        &self.operator_name_map
    }

    pub fn operator_name(&self, op: &str) -> Option<&str> {
        self.operator_name_map.get(op).map(|s| s.as_str())
    }

    pub fn add_token_rule(&mut self, rule: TokenNodeId) {
        self.token_rules.push(rule);
    }

    pub fn token_rules(&self) -> &[TokenNodeId] {
        &self.token_rules
    }

    pub fn add_ast_node(&mut self, node: AstNodeDef) {
        self.ast_nodes.push(node);
    }

    pub fn ast_nodes(&self) -> &[AstNodeDef] {
        &self.ast_nodes
    }

    /// Registers a grammar rule; rules flagged `(memo)` get the next
    /// dense memo id, assigned once and never reused.
    pub fn add_grammar_rule(&mut self, rule: GrammarNodeId) {
        if self.grammar_tree.node(rule).rule_memo {
            let next = self.memo_id_map.len();
            self.memo_id_map.insert(rule, next);
        }
        self.grammar_rules.push(rule);
    }

    pub fn grammar_rules(&self) -> &[GrammarNodeId] {
        &self.grammar_rules
    }

    pub fn memo_id_map(&self) -> &IndexMap<GrammarNodeId, usize> {
        &self.memo_id_map
    }

    pub fn set_hack_code(&mut self, hack: &str) {
        self.hack_code = hack.to_string();
    }

    pub fn hack_code(&self) -> &str {
        &self.hack_code
    }
}
