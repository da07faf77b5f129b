//! Include-directive preprocessing, applied before the pipeline.
//!
//! `#include(name.txt)` lines substitute the named file (relative to the
//! including file); `#include(node)` expands to the AST-node headers
//! derived from every `{name(fieldA, fieldB, …)}` call action in the
//! text.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#include\((.+?\.txt)\)$").unwrap());

static NODE_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z][a-z0-9_]+\([^)]*\))\}").unwrap());

/// Reads a grammar file and expands its include directives.
pub fn preprocess(path: &Path) -> Result<String> {
    let mut text = fs::read_to_string(path)
        .with_context(|| format!("can't read grammar file {}", path.display()))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let includes: Vec<(String, String)> = INCLUDE_RE
        .captures_iter(&text)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
        .collect();
    for (directive, name) in includes {
        let include_path = dir.join(&name);
        let content = fs::read_to_string(&include_path)
            .with_context(|| format!("can't read include {}", include_path.display()))?;
        text = text.replace(&directive, &content);
    }
    Ok(expand_node_includes(&text))
}

/// Expands `#include(node)` from the `{name(args…)}` call actions found
/// in `text`: one `name <fieldA fieldB …>` header per distinct call,
/// sorted.
pub fn expand_node_includes(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for caps in NODE_CALL_RE.captures_iter(text) {
        let item = caps[1].to_string();
        if seen.insert(item.clone()) {
            let node = item
                .replace(' ', "")
                .replace(',', " ")
                .replace('(', " <")
                .replace(')', ">");
            nodes.push(node);
        }
    }
    nodes.sort();
    text.replace("#include(node)", &nodes.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_include_collects_call_actions() {
        let text = "#include(node)\n---\nr: | a=x b=y {binary(a, b)}\ns: | x {unary(x)}\n";
        let out = expand_node_includes(text);
        assert!(out.starts_with("binary <a b>\nunary <x>\n---"));
    }

    #[test]
    fn duplicate_calls_collapse() {
        let text = "#include(node)\n{pair(a, b)} {pair(a, b)}";
        let out = expand_node_includes(text);
        assert_eq!(out.matches("pair <a b>").count(), 1);
    }

    #[test]
    fn no_argument_calls_become_empty_field_lists() {
        let text = "#include(node)\n{marker()}";
        let out = expand_node_includes(text);
        assert!(out.starts_with("marker <>"));
    }

    #[test]
    fn text_without_directive_is_untouched() {
        let text = "r: | x {unary(x)}";
        assert_eq!(expand_node_includes(text), text);
    }

    #[test]
    fn file_includes_substitute_relative_content() {
        let dir = std::env::temp_dir().join("peggen_preprocess_test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("part.txt"), "ident: | [a-z]+\n").unwrap();
        fs::write(dir.join("main.txt"), "#include(part.txt)\nrest\n").unwrap();
        let out = preprocess(&dir.join("main.txt")).unwrap();
        assert_eq!(out, "ident: | [a-z]+\n\nrest\n");
    }

    #[test]
    fn missing_include_is_an_error() {
        let dir = std::env::temp_dir().join("peggen_preprocess_missing");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.txt"), "#include(absent.txt)\n").unwrap();
        let err = preprocess(&dir.join("main.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("absent.txt"));
    }
}
