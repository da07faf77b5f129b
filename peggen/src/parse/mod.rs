//! Hand-written recursive-descent parsers for the grammar-file DSL.

mod cursor;
mod grammar_rules;
mod token_rules;

pub use cursor::GrammarCursor;
pub use grammar_rules::parse_grammar_rule;
pub use token_rules::parse_token_rule;
