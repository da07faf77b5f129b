//! Stage 2: parse section items into the language model, then rewrite
//! anonymous groups into synthetic rules.

use crate::config;
use crate::model::{AstNodeDef, GrammarKind, GrammarNodeId, Language, TokenKind, TokenNodeId};
use crate::parse;
use crate::split::Sections;
use anyhow::anyhow;
use indexmap::IndexMap;
use pegkit::ErrorBag;
use smartstring::alias::String as SmartString;

/// Builds a [`Language`] from split sections. Parse failures accumulate
/// in `errors`; the returned language holds everything that did parse.
pub fn analyze(sections: &Sections, errors: &mut ErrorBag) -> Language {
    let mut lang = Language::new();
    parse_token_rules(&mut lang, sections, errors);
    parse_keywords(&mut lang, sections, errors);
    parse_operators(&mut lang, sections, errors);
    parse_nodes(&mut lang, sections, errors);
    parse_grammar_rules(&mut lang, sections, errors);
    lang.set_hack_code(sections.hack.text());

    convert_token_rules(&mut lang);
    convert_grammar_rules(&mut lang);
    log::debug!(
        "language: {} token rules, {} keywords, {} operators, {} nodes, {} grammar rules",
        lang.token_rules().len(),
        lang.keywords().len(),
        lang.operators().len(),
        lang.ast_nodes().len(),
        lang.grammar_rules().len(),
    );
    lang
}

fn is_comment(text: &str) -> bool {
    text.trim_start().starts_with("# ")
}

fn parse_token_rules(lang: &mut Language, sections: &Sections, errors: &mut ErrorBag) {
    for snippet in &sections.tokens {
        if is_comment(snippet.text()) {
            continue;
        }
        match parse::parse_token_rule(&mut lang.token_tree, snippet) {
            Ok(rule) => lang.add_token_rule(rule),
            Err(err) => errors.push(err),
        }
    }
}

fn parse_keywords(lang: &mut Language, sections: &Sections, errors: &mut ErrorBag) {
    for snippet in &sections.keywords {
        let text = snippet.text().trim();
        if is_comment(text) {
            continue;
        }
        if config::KEYWORD_RE.is_match(text) {
            lang.add_keyword(text);
        } else {
            errors.push(anyhow!(
                "invalid keyword {} at {}:{}",
                text,
                snippet.start.line_idx + 1,
                snippet.start.char_idx + 1
            ));
        }
    }
}

fn parse_operators(lang: &mut Language, sections: &Sections, errors: &mut ErrorBag) {
    for snippet in &sections.operators {
        let text = snippet.text().trim();
        if is_comment(text) {
            continue;
        }
        if config::OPERATOR_RE.is_match(text) {
            if let Err(err) = lang.add_operator(text) {
                errors.push(anyhow!(err));
            }
        } else {
            errors.push(anyhow!(
                "invalid operator {} at {}:{}",
                text,
                snippet.start.line_idx + 1,
                snippet.start.char_idx + 1
            ));
        }
    }
}

fn parse_nodes(lang: &mut Language, sections: &Sections, errors: &mut ErrorBag) {
    for snippet in &sections.nodes {
        let text = snippet.text().trim();
        if is_comment(text) {
            continue;
        }
        match config::NODE_RE.captures(text) {
            Some(caps) => {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let fields: Vec<&str> = caps
                    .get(2)
                    .map(|m| m.as_str().split_whitespace().collect())
                    .unwrap_or_default();
                lang.add_ast_node(AstNodeDef::new(name, &fields, snippet.clone()));
            }
            None => errors.push(anyhow!(
                "invalid node {} at {}:{}",
                text,
                snippet.start.line_idx + 1,
                snippet.start.char_idx + 1
            )),
        }
    }
}

fn parse_grammar_rules(lang: &mut Language, sections: &Sections, errors: &mut ErrorBag) {
    for snippet in &sections.grammars {
        if is_comment(snippet.text()) {
            continue;
        }
        match parse::parse_grammar_rule(&mut lang.grammar_tree, snippet) {
            Ok(rule) => lang.add_grammar_rule(rule),
            Err(err) => errors.push(err),
        }
    }
}

/// Hoists every token-rule group into a synthetic `_group_N` rule so the
/// tokenizer generator only ever emits calls, never inline alternation.
fn convert_token_rules(lang: &mut Language) {
    let mut group_ids: Vec<TokenNodeId> = Vec::new();
    {
        let tree = &lang.token_tree;
        for &rule in lang.token_rules() {
            tree.visit(rule, &mut |id| {
                if tree.node(id).kind == TokenKind::GroupAtom {
                    group_ids.push(id);
                }
            });
        }
    }

    let mut new_rules: IndexMap<String, TokenNodeId> = IndexMap::new();
    let mut added: Vec<TokenNodeId> = Vec::new();
    for id in group_ids {
        let choices = {
            let node = lang.token_tree.node_mut(id);
            node.kind = TokenKind::NameAtom;
            std::mem::take(&mut node.children)
        };
        let key = lang
            .token_tree
            .node(id)
            .snippet
            .as_ref()
            .map(|s| s.text().to_string())
            .unwrap_or_default();
        if let Some(&existing) = new_rules.get(&key) {
            let name = lang.token_tree.node(existing).name.clone();
            lang.token_tree.node_mut(id).name = name;
        } else {
            let snippet = lang.token_tree.node(id).snippet.clone();
            let name: SmartString = format!("_group_{}", new_rules.len() + 1).into();
            let rule = lang.token_tree.add(TokenKind::Rule, None);
            {
                let node = lang.token_tree.node_mut(rule);
                node.children = choices.clone();
                node.snippet = snippet;
                node.name = name.clone();
            }
            for &choice in &choices {
                lang.token_tree.node_mut(choice).parent = Some(rule);
            }
            lang.token_tree.node_mut(id).name = name;
            new_rules.insert(key, rule);
            added.push(rule);
        }
    }
    for rule in added {
        lang.add_token_rule(rule);
    }
}

/// Grammar groups: a single actionless choice is flattened in place (the
/// group keeps its position but holds the choice's items directly);
/// everything else is hoisted into a synthetic `_group_N` rule.
fn convert_grammar_rules(lang: &mut Language) {
    let mut flatten_ids: Vec<GrammarNodeId> = Vec::new();
    let mut hoist_ids: Vec<GrammarNodeId> = Vec::new();
    {
        let tree = &lang.grammar_tree;
        for &rule in lang.grammar_rules() {
            tree.visit(rule, &mut |id| {
                let node = tree.node(id);
                if node.kind != GrammarKind::GroupAtom {
                    return;
                }
                let single_plain = node.children.len() == 1
                    && tree.node(node.children[0]).action.is_none();
                if single_plain {
                    flatten_ids.push(id);
                } else {
                    hoist_ids.push(id);
                }
            });
        }
    }

    for id in flatten_ids {
        let choice = lang.grammar_tree.child(id).expect("group without choice");
        let items = lang.grammar_tree.node(choice).children.clone();
        for &item in &items {
            lang.grammar_tree.node_mut(item).parent = Some(id);
        }
        lang.grammar_tree.node_mut(id).children = items;
    }

    let mut new_rules: IndexMap<String, GrammarNodeId> = IndexMap::new();
    let mut added: Vec<GrammarNodeId> = Vec::new();
    for id in hoist_ids {
        let choices = {
            let node = lang.grammar_tree.node_mut(id);
            node.kind = GrammarKind::NameAtom;
            std::mem::take(&mut node.children)
        };
        let key = lang
            .grammar_tree
            .node(id)
            .snippet
            .as_ref()
            .map(|s| s.text().to_string())
            .unwrap_or_default();
        if let Some(&existing) = new_rules.get(&key) {
            let name = lang.grammar_tree.node(existing).name.clone();
            lang.grammar_tree.node_mut(id).name = name;
        } else {
            let snippet = lang.grammar_tree.node(id).snippet.clone();
            let name: SmartString = format!("_group_{}", new_rules.len() + 1).into();
            let rule = lang.grammar_tree.add(GrammarKind::Rule, None);
            {
                let node = lang.grammar_tree.node_mut(rule);
                node.children = choices.clone();
                node.snippet = snippet;
                node.name = name.clone();
            }
            for &choice in &choices {
                lang.grammar_tree.node_mut(choice).parent = Some(rule);
            }
            lang.grammar_tree.node_mut(id).name = name;
            new_rules.insert(key, rule);
            added.push(rule);
        }
    }
    for rule in added {
        lang.add_grammar_rule(rule);
    }
}
