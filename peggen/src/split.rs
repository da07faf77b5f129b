//! Stage 1: partition the grammar file into its six sections and split
//! each section into per-item snippets.

use anyhow::anyhow;
use once_cell::sync::Lazy;
use pegkit::{ErrorBag, Snippet};
use regex::Regex;
use thiserror::Error;

/// Number of sections a grammar file must contain.
pub const SECTION_COUNT: usize = 6;

/// Width of the `-` divider line between sections.
pub const DIVIDER_WIDTH: usize = 120;

static DIVIDER: Lazy<String> = Lazy::new(|| format!("{}\n", "-".repeat(DIVIDER_WIDTH)));

/// A rule item: one non-indented header line plus any indented
/// continuation lines.
static RULE_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\s*\S[^\n]*(?:\n +[^\n]*)*\n*)").unwrap());

/// A simple item: one non-empty line.
static SIMPLE_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\s*[^\n]+\n+)").unwrap());

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("expected {expected} parts, got {got}")]
    SectionCount { expected: usize, got: usize },
}

/// The six sections of a grammar file, already split into items where
/// the section grammar calls for it.
#[derive(Debug)]
pub struct Sections {
    pub tokens: Vec<Snippet>,
    pub keywords: Vec<Snippet>,
    pub operators: Vec<Snippet>,
    pub nodes: Vec<Snippet>,
    pub grammars: Vec<Snippet>,
    pub hack: Snippet,
}

/// Splits the input into sections; a wrong section count or a section
/// the item patterns cannot fully cover lands in `errors`.
pub fn split(input: &Snippet, errors: &mut ErrorBag) -> Option<Sections> {
    let sections = section_snippets(input);
    if sections.len() != SECTION_COUNT {
        errors.push(anyhow!(SplitError::SectionCount {
            expected: SECTION_COUNT,
            got: sections.len(),
        }));
        return None;
    }
    let mut it = sections.into_iter();
    let tokens = it.next().unwrap();
    let keywords = it.next().unwrap();
    let operators = it.next().unwrap();
    let nodes = it.next().unwrap();
    let grammars = it.next().unwrap();
    let hack = it.next().unwrap();
    Some(Sections {
        tokens: item_snippets(&tokens, &RULE_ITEM_RE, errors),
        keywords: item_snippets(&keywords, &SIMPLE_ITEM_RE, errors),
        operators: item_snippets(&operators, &SIMPLE_ITEM_RE, errors),
        nodes: item_snippets(&nodes, &SIMPLE_ITEM_RE, errors),
        grammars: item_snippets(&grammars, &RULE_ITEM_RE, errors),
        hack,
    })
}

fn section_snippets(input: &Snippet) -> Vec<Snippet> {
    let text = input.text();
    let mut ret = Vec::new();
    let mut start = input.start;
    for part in text.split(DIVIDER.as_str()) {
        let end = start.forward(part);
        ret.push(input.fork(start, end));
        start = end.forward(&DIVIDER);
    }
    ret
}

fn item_snippets(section: &Snippet, pattern: &Regex, errors: &mut ErrorBag) -> Vec<Snippet> {
    let text = section.text();
    let mut parts = Vec::new();
    for caps in pattern.captures_iter(text) {
        parts.push(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
    }
    let mut ret = Vec::with_capacity(parts.len());
    let mut start = section.start;
    for part in &parts {
        let end = start.forward(part);
        ret.push(section.fork(start, end));
        start = end;
    }
    let used: String = parts.concat();
    if used != text {
        errors.push(anyhow!(
            "invalid pattern: {}\ntarget content: {}\nmatch content: {}",
            pattern.as_str(),
            text,
            used
        ));
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divider() -> String {
        format!("{}\n", "-".repeat(120))
    }

    fn join_sections(sections: &[&str]) -> String {
        sections.join(&divider())
    }

    #[test]
    fn six_sections_split_cleanly() {
        let text = join_sections(&[
            "ident: | [a-z]+\n",
            "if\nreturn\n",
            "==\n+\n",
            "binary <x op y>\n",
            "file: | 'if' {_}\n",
            "// hack\n",
        ]);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        let sections = split(&input, &mut errors).unwrap();
        assert!(errors.is_empty(), "{:?}", errors.join());
        assert_eq!(sections.tokens.len(), 1);
        assert_eq!(sections.keywords.len(), 2);
        assert_eq!(sections.operators.len(), 2);
        assert_eq!(sections.nodes.len(), 1);
        assert_eq!(sections.grammars.len(), 1);
        assert_eq!(sections.hack.text(), "// hack\n");
    }

    #[test]
    fn wrong_section_count_names_the_actual_count() {
        let text = join_sections(&["a\n", "b\n", "c\n", "d\n", "e\n"]);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        assert!(split(&input, &mut errors).is_none());
        let msg = errors.join().unwrap().to_string();
        assert!(msg.contains("expected 6 parts, got 5"), "{msg}");
    }

    #[test]
    fn seven_sections_also_fail() {
        let text = join_sections(&["a\n"; 7]);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        assert!(split(&input, &mut errors).is_none());
        assert!(errors
            .join()
            .unwrap()
            .to_string()
            .contains("expected 6 parts, got 7"));
    }

    #[test]
    fn rule_split_groups_indented_continuations() {
        let text = join_sections(&[
            "newline:\n    | '\\n'\n    | '\\r'\nident:\n    | [a-z]+\n",
            "k\n",
            "+\n",
            "n <a>\n",
            "g: | 'x' {_}\n",
            "\n",
        ]);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        let sections = split(&input, &mut errors).unwrap();
        assert!(errors.is_empty());
        assert_eq!(sections.tokens.len(), 2);
        assert!(sections.tokens[0].text().contains("'\\r'"));
        assert!(sections.tokens[1].text().starts_with("ident:"));
    }

    #[test]
    fn item_snippets_track_true_source_positions() {
        let text = join_sections(&["a: | 'x'\n", "k1\nk2\n", "+\n", "n <a>\n", "g: | 'x' {_}\n", "\n"]);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        let sections = split(&input, &mut errors).unwrap();
        let k2 = &sections.keywords[1];
        assert_eq!(k2.text().trim(), "k2");
        // keywords section starts after the first section and one divider
        assert_eq!(k2.start.line_idx, 3);
    }
}
