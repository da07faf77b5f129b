//! Fixed tables and patterns shared across the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

/// Local names the emitted parser code claims for itself; the variable
/// allocator never hands these out.
pub const RESERVED_VARS: [&str; 5] = ["_", "ps", "tk", "pos", "group"];

/// Token kinds every emitted tokenizer defines before any user rule.
pub const BUILTIN_TOKENS: [&str; 4] = ["end_of_file", "pseudo", "whitespace", "newline"];

/// Spelled-out name of an operator byte, used to derive token-type
/// identifiers like `op_less_less_equal`.
pub fn operator_char_name(b: u8) -> Option<&'static str> {
    let name = match b {
        b'!' => "not",
        b'%' => "percent",
        b'&' => "and",
        b'(' => "left_paren",
        b')' => "right_paren",
        b'*' => "star",
        b'+' => "plus",
        b',' => "comma",
        b'.' => "dot",
        b'/' => "slash",
        b':' => "colon",
        b';' => "semi",
        b'<' => "less",
        b'=' => "equal",
        b'>' => "greater",
        b'?' => "question",
        b'@' => "at",
        b'[' => "left_bracket",
        b'\\' => "back_slash",
        b']' => "right_bracket",
        b'^' => "caret",
        b'{' => "left_brace",
        b'|' => "bar",
        b'}' => "right_brace",
        b'~' => "tilde",
        b'#' => "num_sign",
        b'$' => "dollar",
        b'-' => "minus",
        _ => return None,
    };
    Some(name)
}

/// Matches a whole operator header line.
pub static OPERATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[!%&()*+,./:;<=>?@\[\\\]^{|}~#$-]+$").unwrap());

/// Matches a whole keyword header line.
pub static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());

/// Matches an AST node header: `name <field field …>`.
pub static NODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+) +<([\w ]+)?>$").unwrap());
