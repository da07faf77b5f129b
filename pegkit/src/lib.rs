//! Building blocks shared by the `peggen` parser generator.
//!
//! This crate holds the generator-agnostic pieces: source positions and
//! borrowed text snippets, the non-fatal error accumulator, the indented
//! code printer with its unique-variable allocator, and the small name,
//! escape and character-class utilities the code generators lean on.

mod case;
mod char_class;
mod errors;
mod escape;
mod position;
mod printer;
mod snippet;
mod vars;

pub use crate::case::{safe_name, to_camel_case, to_pascal_case, Name};
pub use crate::char_class::{parse_character_class, CharClassError, ClassItem};
pub use crate::errors::ErrorBag;
pub use crate::escape::{
    double_quote_escape, double_quote_unescape, single_quote_escape, single_quote_unescape,
};
pub use crate::position::Position;
pub use crate::printer::Printer;
pub use crate::snippet::{Snippet, SourceFile};
pub use crate::vars::VarAllocator;
