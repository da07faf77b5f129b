use crate::escape::unescape_at;
use thiserror::Error;

/// One entry of a parsed character class: a single character or an
/// inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    Single(char),
    Range(char, char),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CharClassError {
    #[error("parse character class: symbol - is misused, [{0}]")]
    DashMisused(String),
}

/// Parses the body of a `[...]` character class into ordered items.
///
/// `-` binds its neighbours into a range; a trailing `-` is a literal.
/// Escapes (including `\uXXXX`) go through the shared unescape rules.
pub fn parse_character_class(s: &str) -> Result<Vec<ClassItem>, CharClassError> {
    let bytes = s.as_bytes();
    let mut ret = Vec::new();
    let mut last: Option<char> = None;
    let mut range_start: Option<char> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'-' && i != bytes.len() - 1 {
            let Some(start) = last.take() else {
                return Err(CharClassError::DashMisused(s.to_string()));
            };
            range_start = Some(start);
            i += 1;
        } else {
            if let Some(l) = last.take() {
                ret.push(ClassItem::Single(l));
            }
            let c;
            if bytes[i] == b'\\' && i + 1 < bytes.len() {
                let (decoded, end) = unescape_at(bytes, i);
                c = decoded;
                i = end + 1;
            } else if bytes[i] < 0x80 {
                c = bytes[i] as char;
                i += 1;
            } else {
                let ch = s[i..].chars().next().unwrap_or('\u{FFFD}');
                c = ch;
                i += ch.len_utf8();
            }
            match range_start.take() {
                Some(start) => ret.push(ClassItem::Range(start, c)),
                None => last = Some(c),
            }
        }
    }
    if let Some(l) = last {
        ret.push(ClassItem::Single(l));
    }
    Ok(ret)
}
