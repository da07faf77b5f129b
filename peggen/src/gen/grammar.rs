//! Stage 3b: emit the packrat parser — memo-id constants, the parser
//! payload, and one function family per grammar rule, with
//! left-recursive rules split into driver/left-most/right-part trios.

use crate::gen::Emitter;
use crate::model::{GrammarKind, GrammarNodeId, Language};
use crate::payload;
use once_cell::sync::Lazy;
use pegkit::{double_quote_escape, safe_name, to_camel_case, to_pascal_case, ErrorBag, Snippet};
use regex::Regex;
use std::collections::HashSet;

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Generates the parser block.
pub fn generate(lang: &Language, errors: &mut ErrorBag) -> String {
    let mut gen = GrammarGen {
        lang,
        em: Emitter::new(),
    };
    gen.run(errors);
    gen.em.finish()
}

struct GrammarGen<'a> {
    lang: &'a Language,
    em: Emitter,
}

impl GrammarGen<'_> {
    fn run(&mut self, _errors: &mut ErrorBag) {
        self.memo_id_consts();
        self.em.put_nl();
        self.em.put(payload::NODE_CACHE_STRUCT).put_nl();
        self.em.put(payload::PARSER_STRUCT).put_nl();
        for i in 0..self.lang.grammar_rules().len() {
            let rule = self.lang.grammar_rules()[i];
            self.rule_code(rule);
        }
    }

    fn memo_id_consts(&mut self) {
        let mut entries: Vec<(usize, String)> = self
            .lang
            .memo_id_map()
            .iter()
            .map(|(&rule, &memo_id)| {
                let name = safe_name(&to_camel_case(&self.lang.grammar_tree.node(rule).name));
                (memo_id, format!("const {name}MemoId = {memo_id}"))
            })
            .collect();
        entries.sort_by_key(|&(memo_id, _)| memo_id);
        for (_, line) in entries {
            self.em.put(line);
        }
    }

    fn rule_code(&mut self, rule: GrammarNodeId) {
        let tree = &self.lang.grammar_tree;
        let rule_name = tree.node(rule).name.clone();
        let mut left_rec_choices = Vec::new();
        let mut simple_choices = Vec::new();
        for &choice in &tree.node(rule).children {
            let mut leftmost = HashSet::new();
            self.left_most(choice, &mut leftmost);
            if leftmost.contains(rule_name.as_str()) {
                left_rec_choices.push(choice);
            } else {
                simple_choices.push(choice);
            }
        }
        if !left_rec_choices.is_empty() {
            self.left_rec_rule_code(rule, &left_rec_choices, &simple_choices);
        } else {
            self.simple_rule_code(rule);
        }
    }

    /// Collects the set of rule names reachable at position 0 of a
    /// choice without consuming input. Returns whether the caller should
    /// keep scanning past this node (it can match empty).
    fn left_most(&self, id: GrammarNodeId, leftmost: &mut HashSet<String>) -> bool {
        let node = self.lang.grammar_tree.node(id);
        match node.kind {
            GrammarKind::Choice => {
                for &item in &node.children {
                    if !self.left_most(item, leftmost) {
                        break;
                    }
                }
                false
            }
            GrammarKind::OptionalItem
            | GrammarKind::Repeat0Item
            | GrammarKind::SeparatedRepeat0Item
            | GrammarKind::NegativeLookaheadItem => {
                if let Some(&child) = node.children.first() {
                    self.left_most(child, leftmost);
                }
                true
            }
            GrammarKind::Repeat1Item
            | GrammarKind::AtomItem
            | GrammarKind::SeparatedRepeat1Item
            | GrammarKind::PositiveLookaheadItem => {
                if let Some(&child) = node.children.first() {
                    self.left_most(child, leftmost);
                }
                false
            }
            GrammarKind::NameAtom => {
                leftmost.insert(snippet_text(node.snippet.as_ref()));
                false
            }
            _ => false,
        }
    }

    fn memo_code(&mut self, fun_name: &str) {
        self.em
            .put(format!("func (ps *Parser) {fun_name}() Node {{"));
        self.em.push();
        self.em.put("pos := ps._mark()");
        self.em.put("var ok bool");
        self.em.put("var cache *NodeCache");
        self.em.put("cacheAtPos := ps._nodeCache[pos]");
        self.em.put("if cacheAtPos != nil {");
        self.em.push();
        self.em
            .put(format!("if cache, ok = cacheAtPos[{fun_name}MemoId]; ok {{"));
        self.em.push();
        self.em.put("if cache.val == nil {");
        self.em.push();
        self.em.put("return nil");
        self.em.pop();
        self.em.put("}");
        self.em.put("ps._reset(cache.pos)");
        self.em.put("return cache.val");
        self.em.pop();
        self.em.put("}");
        self.em.pop();
        self.em.put("} else {");
        self.em.push();
        self.em.put("cacheAtPos = make(map[int]*NodeCache)");
        self.em.put("ps._nodeCache[pos] = cacheAtPos");
        self.em.pop();
        self.em.put("}");
        self.em.put(format!("t := ps.{fun_name}_()"));
        self.em.put(format!(
            "cacheAtPos[{fun_name}MemoId] = &NodeCache{{t, ps._mark()}}"
        ));
        self.em.put("return t");
        self.em.pop();
        self.em.put("}");
        self.em.put_nl();
    }

    fn doc_block(&mut self, rule: GrammarNodeId, memo_mark: &str) {
        let tree = &self.lang.grammar_tree;
        let name = tree.node(rule).name.clone();
        let mut lines = vec![format!("/*\n{}{}:", name, memo_mark)];
        for &choice in &tree.node(rule).children {
            lines.push(format!("| {}", snippet_text(tree.node(choice).snippet.as_ref())));
        }
        tree.visit(rule, &mut |id| {
            let node = tree.node(id);
            if node.kind == GrammarKind::NameAtom && node.name.starts_with("_group_") {
                lines.push(format!(
                    "{} <-- {}",
                    node.name,
                    snippet_text(node.snippet.as_ref())
                ));
            }
        });
        lines.push("*/".to_string());
        for line in lines {
            self.em.put(line);
        }
    }

    fn simple_rule_code(&mut self, rule: GrammarNodeId) {
        let name = self.lang.grammar_tree.node(rule).name.clone();
        let mut memo_mark = "";
        let mut fun_name = safe_name(&to_camel_case(&name));
        if self.lang.grammar_tree.node(rule).rule_memo {
            self.memo_code(&fun_name);
            memo_mark = "!";
            fun_name.push('_');
        }

        self.doc_block(rule, memo_mark);

        self.em
            .put(format!("func (ps *Parser) {fun_name}() Node {{"));
        self.em.push();
        let choices = self.lang.grammar_tree.node(rule).children.clone();
        self.choices_code(&choices, "");
        self.em.put("return nil");
        self.em.pop();
        self.em.put("}");
        self.em.put_nl();
    }

    fn left_rec_rule_code(
        &mut self,
        rule: GrammarNodeId,
        left_rec_choices: &[GrammarNodeId],
        simple_choices: &[GrammarNodeId],
    ) {
        let name = self.lang.grammar_tree.node(rule).name.clone();
        let mut memo_mark = "";
        let mut fun_name = safe_name(&to_camel_case(&name));
        if self.lang.grammar_tree.node(rule).rule_memo {
            self.memo_code(&fun_name);
            memo_mark = "!";
            fun_name.push('_');
        }

        self.doc_block(rule, memo_mark);

        let camel_name = to_camel_case(&name);
        self.em
            .put(format!("func (ps *Parser) {fun_name}() Node {{"));
        self.em.push();
        self.em
            .put(format!("_left := ps.{camel_name}LeftMost()"));
        self.em.put("if _left == nil {");
        self.em.push();
        self.em.put("return nil");
        self.em.pop();
        self.em.put("}");
        self.em
            .put(format!("_ret := ps.{camel_name}RightPart(_left)"));
        self.em.put("for _ret != nil {");
        self.em.push();
        self.em.put("_left = _ret");
        self.em
            .put(format!("_ret = ps.{camel_name}RightPart(_left)"));
        self.em.pop();
        self.em.put("}");
        self.em.put("return _left");
        self.em.pop();
        self.em.put("}");
        self.em.put_nl();

        self.em
            .put(format!("func (ps *Parser) {camel_name}LeftMost() Node {{"));
        self.em.push();
        self.choices_code(simple_choices, "");
        self.em.put("return nil");
        self.em.pop();
        self.em.put("}");
        self.em.put_nl();

        self.em.put(format!(
            "func (ps *Parser) {camel_name}RightPart(_left Node) Node {{"
        ));
        self.em.push();
        self.choices_code(left_rec_choices, "_left");
        self.em.put("return nil");
        self.em.pop();
        self.em.put("}");
        self.em.put_nl();
    }

    fn choices_code(&mut self, choices: &[GrammarNodeId], left_var: &str) {
        let mut pos_defined = false;
        for &choice in choices {
            let text = snippet_text(self.lang.grammar_tree.node(choice).snippet.as_ref());
            self.em
                .put(format!("/* {}", WS_RE.replace_all(&text, " ")));
            self.em.put(" */");
            let node = self.lang.grammar_tree.node(choice);
            let need_mark_reset = node.children.len() > 1 || node.action.is_some();
            if need_mark_reset && !pos_defined {
                pos_defined = true;
                self.em.put("pos := ps._mark()");
            }

            self.gram_code(choice, "", left_var);

            if need_mark_reset {
                self.em.put("ps._reset(pos)");
            }
        }
    }

    /// Collects the bind labels of a choice, recursing through items and
    /// flattened groups, for pre-hoisted `var x Node` declarations.
    fn item_names(&self, id: GrammarNodeId, names: &mut Vec<String>) {
        let node = self.lang.grammar_tree.node(id);
        match node.kind {
            GrammarKind::Choice | GrammarKind::GroupAtom => {
                for &child in &node.children {
                    self.item_names(child, names);
                }
            }
            GrammarKind::OptionalItem
            | GrammarKind::Repeat0Item
            | GrammarKind::SeparatedRepeat0Item
            | GrammarKind::NegativeLookaheadItem
            | GrammarKind::Repeat1Item
            | GrammarKind::AtomItem
            | GrammarKind::SeparatedRepeat1Item
            | GrammarKind::PositiveLookaheadItem
            | GrammarKind::ForwardIfNotMatchItem => {
                if !node.name.is_empty() {
                    names.push(node.name.to_string());
                }
                if let Some(&child) = node.children.first() {
                    self.item_names(child, names);
                }
            }
            _ => {}
        }
    }

    fn ensure_item_var(&mut self, item_name: &str) -> String {
        if item_name.is_empty() {
            let var = self.em.create_var("_");
            self.em.put(format!("var {var} Node"));
            var
        } else {
            item_name.to_string()
        }
    }

    fn gram_code(&mut self, id: GrammarNodeId, item_name: &str, left_var: &str) {
        let kind = self.lang.grammar_tree.node(id).kind;
        match kind {
            GrammarKind::Choice => {
                self.em.clear_vars();
                self.em.put("for {");
                self.em.push();
                let mut names = Vec::new();
                self.item_names(id, &mut names);
                names.sort();
                for name in &names {
                    self.em.put(format!("var {name} Node"));
                }
                let mut break_var = String::new();
                let items = self.lang.grammar_tree.node(id).children.clone();
                for (i, &item) in items.iter().enumerate() {
                    if !left_var.is_empty() && i == 0 {
                        let bind = self.lang.grammar_tree.node(item).name.clone();
                        if bind.is_empty() {
                            let var = self.em.create_var("_");
                            self.em.put(format!("var {var} Node"));
                            self.em.put(format!("{var} = {left_var}"));
                        } else {
                            self.em.put(format!("{bind} = {left_var}"));
                        }
                    } else {
                        let bind = self.lang.grammar_tree.node(item).name.clone();
                        self.gram_code(item, &bind, "");
                        let suffix = self.lang.grammar_tree.node(item).suffix;
                        if suffix == Some('[') {
                            break_var = self.em.create_var("break");
                            self.em.put(format!("{break_var} := true"));
                            self.em.put("ps._enter()");
                            self.em.put("for {");
                            self.em.push();
                        } else if suffix == Some(']') {
                            self.em.put(format!("{break_var} = false"));
                            self.em.put("break");
                            self.em.pop();
                            self.em.put("}");
                            self.em.put("ps._leave()");
                            self.em.put(format!("if {break_var} {{"));
                            self.em.push();
                            self.em.put("break");
                            self.em.pop();
                            self.em.put("}");
                        }
                    }
                }
                let action = self.lang.grammar_tree.node(id).action;
                match action {
                    None => {
                        self.em.put("return _1");
                    }
                    Some(action) => {
                        if self.lang.grammar_tree.node(action).kind == GrammarKind::NullAction {
                            self.em.put("return dummyNode");
                        } else {
                            let code = self.action_code(action, left_var);
                            self.em.put(format!("return {code}"));
                        }
                    }
                }
                self.em.pop();
                self.em.put("}");
            }
            GrammarKind::OptionalItem => {
                let item_name = self.ensure_item_var(item_name);
                let child = self.child_of(id);
                self.gram_code(child, &item_name, "");
                self.em.put(format!("_ = {item_name}"));
            }
            GrammarKind::Repeat0Item => {
                let item_name = self.ensure_item_var(item_name);
                let tmp_var = self.em.create_var("_");
                self.em.put(format!("{tmp_var} := make([]Node, 0)"));
                let item_var = self.em.create_var("_");
                self.em.put(format!("var {item_var} Node"));
                let child = self.child_of(id);
                self.em.put("for {");
                self.em.push();
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{item_name} = NewNodesNode({tmp_var})"));
                self.em.put(format!("_ = {item_name}"));
            }
            GrammarKind::Repeat1Item => {
                let item_name = self.ensure_item_var(item_name);
                let tmp_var = self.em.create_var("_");
                self.em.put(format!("{tmp_var} := make([]Node, 0)"));
                let item_var = self.em.create_var("_");
                self.em.put(format!("var {item_var} Node"));
                let child = self.child_of(id);
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.put("for {");
                self.em.push();
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{item_name} = NewNodesNode({tmp_var})"));
                self.em.put(format!("_ = {item_name}"));
            }
            GrammarKind::SeparatedRepeat0Item => {
                let item_name = self.ensure_item_var(item_name);
                let tmp_var = self.em.create_var("_");
                self.em.put(format!("{tmp_var} := make([]Node, 0)"));
                let item_var = self.em.create_var("_");
                let sep_var = self.em.create_var("_");
                self.em.put(format!("var {item_var} Node"));
                self.em.put(format!("var {sep_var} Node"));
                let child = self.child_of(id);
                let separator = self.separator_of(id);
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} != nil {{"));
                self.em.push();
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.put("for {");
                self.em.push();
                let pos_var = self.em.create_var("p");
                self.em.put(format!("{pos_var} := ps._mark()"));
                self.gram_code(separator, &sep_var, "");
                self.em.put(format!("if {sep_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put(format!("ps._reset({pos_var})"));
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.pop();
                self.em.put("}");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{item_name} = NewNodesNode({tmp_var})"));
                self.em.put(format!("_ = {item_name}"));
            }
            GrammarKind::SeparatedRepeat1Item => {
                let item_name = self.ensure_item_var(item_name);
                let tmp_var = self.em.create_var("_");
                self.em.put(format!("{tmp_var} := make([]Node, 0)"));
                let item_var = self.em.create_var("_");
                let sep_var = self.em.create_var("_");
                self.em
                    .put(format!("var {item_var}, {sep_var} Node"));
                let child = self.child_of(id);
                let separator = self.separator_of(id);
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.put("for {");
                self.em.push();
                let pos_var = self.em.create_var("p");
                self.em.put(format!("{pos_var} := ps._mark()"));
                self.gram_code(separator, &sep_var, "");
                self.em.put(format!("if {sep_var} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.gram_code(child, &item_var, "");
                self.em.put(format!("if {item_var} == nil {{"));
                self.em.push();
                self.em.put(format!("ps._reset({pos_var})"));
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{tmp_var} = append({tmp_var}, {item_var})"));
                self.em.pop();
                self.em.put("}");
                self.em
                    .put(format!("{item_name} = NewNodesNode({tmp_var})"));
                self.em.put(format!("_ = {item_name}"));
            }
            GrammarKind::PositiveLookaheadItem | GrammarKind::NegativeLookaheadItem => {
                let item_name = self.ensure_item_var(item_name);
                let pos_var = self.em.create_var("p");
                self.em.put(format!("{pos_var} := ps._mark()"));
                let child = self.child_of(id);
                self.gram_code(child, &item_name, "");
                self.em.put(format!("if {item_name} != nil {{"));
                self.em.push();
                self.em.put(format!("ps._reset({pos_var})"));
                self.em.pop();
                self.em.put("}");
                if kind == GrammarKind::NegativeLookaheadItem {
                    self.em.put(format!("if {item_name} != nil {{"));
                } else {
                    self.em.put(format!("if {item_name} == nil {{"));
                }
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
            }
            GrammarKind::ForwardIfNotMatchItem => {
                let item_name = self.ensure_item_var(item_name);
                let pos_var = self.em.create_var("p");
                self.em.put(format!("{pos_var} := ps._mark()"));
                let child = self.child_of(id);
                self.gram_code(child, &item_name, "");
                self.em.put(format!("if {item_name} != nil {{"));
                self.em.push();
                self.em.put(format!("ps._reset({pos_var})"));
                self.em.pop();
                self.em.put("}");
                self.em.put(format!("if {item_name} == nil {{"));
                self.em.push();
                self.em.put(format!("{item_name} = ps._anyToken()"));
                self.em.pop();
                self.em.put("} else {");
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
            }
            GrammarKind::AtomItem => {
                let item_name = self.ensure_item_var(item_name);
                let child = self.child_of(id);
                self.gram_code(child, &item_name, "");
                self.em.put(format!("if {item_name} == nil {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
            }
            GrammarKind::NameAtom => {
                let name = self.lang.grammar_tree.node(id).name.clone();
                self.em.put(format!(
                    "{item_name} = ps.{}()",
                    safe_name(&to_camel_case(&name))
                ));
            }
            GrammarKind::TokenAtom => {
                let text = snippet_text(self.lang.grammar_tree.node(id).snippet.as_ref());
                let val = to_pascal_case(&text.to_lowercase());
                self.em
                    .put(format!("{item_name} = ps._expectK(TokenType{val})"));
            }
            GrammarKind::StringAtom => {
                let text = snippet_text(self.lang.grammar_tree.node(id).snippet.as_ref());
                let val = &text[1..text.len() - 1];
                if let Some(op_name) = self.lang.operator_name(val) {
                    self.em.put(format!(
                        "{item_name} = ps._expectK(TokenTypeOp{})",
                        to_pascal_case(op_name)
                    ));
                } else if self.lang.is_keyword(val) {
                    self.em.put(format!(
                        "{item_name} = ps._expectK(TokenTypeKw{})",
                        to_pascal_case(val)
                    ));
                } else {
                    self.em.put(format!(
                        "{item_name} = ps._expectV(\"{}\")",
                        double_quote_escape(val)
                    ));
                }
            }
            GrammarKind::GroupAtom => {
                // only flattened groups survive the rewriter; their
                // children are items forming one speculative sequence
                let input_item_name = item_name.to_string();
                let ok_var = self.em.create_var("ok");
                let pos_var = self.em.create_var("p");
                self.em.put("for {");
                self.em.push();
                self.em.put(format!("{ok_var} := false"));
                self.em.put(format!("{pos_var} := ps._mark()"));
                self.em.put("for {");
                self.em.push();
                let items = self.lang.grammar_tree.node(id).children.clone();
                let mut names = Vec::new();
                for (i, &item) in items.iter().enumerate() {
                    let bind = self.lang.grammar_tree.node(item).name.clone();
                    if i == items.len() - 1 {
                        if bind.is_empty() {
                            self.gram_code(item, &input_item_name, "");
                        } else {
                            self.gram_code(item, &bind, "");
                            self.em.put(format!("{input_item_name} = {bind}"));
                        }
                        break;
                    }
                    let bind = if bind.is_empty() {
                        let var = self.em.create_var("_");
                        self.em.put(format!("var {var} Node"));
                        var
                    } else {
                        names.push(bind.to_string());
                        bind.to_string()
                    };
                    self.gram_code(item, &bind, "");
                }
                self.em.put(format!("{ok_var} = true"));
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em.put(format!("if !{ok_var} {{"));
                self.em.push();
                self.em.put(format!("ps._reset({pos_var})"));
                for name in &names {
                    self.em.put(format!("{name} = nil"));
                }
                self.em.pop();
                self.em.put("}");
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
            }
            GrammarKind::BracketEllipsisAtom => {
                let text = snippet_text(self.lang.grammar_tree.node(id).snippet.as_ref());
                let left_bracket = &text[1..2];
                let right_bracket = &text[text.len() - 2..text.len() - 1];
                let first_var = self.em.create_var("first");
                let last_var = self.em.create_var("last");
                let depth_var = self.em.create_var("depth");
                self.em.put("for {");
                self.em.push();
                self.em
                    .put(format!("var {first_var}, {last_var} Node"));
                self.em.put(format!(
                    "if {first_var} = ps._expectV(\"{left_bracket}\"); {first_var} == nil {{"
                ));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em.put(format!("{depth_var} := 1"));
                self.em.put("for {");
                self.em.push();
                self.em
                    .put(format!("if ps._expectV(\"{left_bracket}\") != nil {{"));
                self.em.push();
                self.em.put(format!("{depth_var}++"));
                self.em.pop();
                self.em.put(format!(
                    "}} else if {last_var} = ps._expectV(\"{right_bracket}\"); {last_var} != nil {{"
                ));
                self.em.push();
                self.em.put(format!("{depth_var}--"));
                self.em.put(format!("if {depth_var} == 0 {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em.pop();
                self.em
                    .put("} else if ps._expectK(TokenTypeEndOfFile) != nil {");
                self.em.push();
                self.em.put("panic(\"bracket ellipsis reach end of file\")");
                self.em.pop();
                self.em.put("} else {");
                self.em.push();
                self.em.put("ps._anyToken()");
                self.em.pop();
                self.em.put("}");
                self.em.pop();
                self.em.put("}");
                self.em.put(format!(
                    "{item_name} = ps._pseudoToken({first_var}, {last_var})"
                ));
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
            }
            _ => panic!("this should never happen"),
        }
    }

    fn action_code(&self, id: GrammarNodeId, left_var: &str) -> String {
        let node = self.lang.grammar_tree.node(id);
        let mut position =
            "ps._tokens[pos].Start, ps._visibleTokenBefore(ps._mark()).End".to_string();
        if !left_var.is_empty() {
            position =
                format!("{left_var}.RangeStart(), ps._visibleTokenBefore(ps._mark()).End");
        }
        match node.kind {
            GrammarKind::CallAction => {
                let args: Vec<String> = node
                    .children
                    .iter()
                    .map(|&arg| self.action_code(arg, left_var))
                    .collect();
                let args_text = args.join(", ");
                let callee = node.name.as_str();
                if callee.starts_with('_') {
                    return format!("ps.{}({})", to_camel_case(callee), args_text);
                }
                if !args_text.is_empty() {
                    position = format!(", {position}");
                }
                format!(
                    "New{}Node(ps._filePath, ps._fileContent, {}{})",
                    to_pascal_case(callee),
                    args_text,
                    position
                )
            }
            GrammarKind::ListAction => {
                let elem = node
                    .children
                    .first()
                    .map(|&c| self.action_code(c, left_var))
                    .unwrap_or_default();
                format!("NewNodesNode([]Node{{{elem}}})")
            }
            GrammarKind::NullAction => "nil".to_string(),
            _ => snippet_text(node.snippet.as_ref()),
        }
    }

    fn child_of(&self, id: GrammarNodeId) -> GrammarNodeId {
        self.lang
            .grammar_tree
            .child(id)
            .expect("item node without atom child")
    }

    fn separator_of(&self, id: GrammarNodeId) -> GrammarNodeId {
        self.lang
            .grammar_tree
            .node(id)
            .separator
            .expect("separated repeat without separator")
    }
}

fn snippet_text(snippet: Option<&Snippet>) -> String {
    snippet.map(|s| s.text().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;
    use crate::split;

    fn parser_for(nodes: &str, grammars: &str) -> String {
        let divider = format!("{}\n", "-".repeat(120));
        let text = [
            "ident: | [a-zA-Z_] [a-zA-Z0-9_]*\n",
            "if\nreturn\n",
            "==\n+\n,\n}\n",
            nodes,
            grammars,
            "\n",
        ]
        .join(&divider);
        let input = Snippet::new("", text);
        let mut errors = ErrorBag::new();
        let sections = split::split(&input, &mut errors).unwrap();
        let lang = analyze::analyze(&sections, &mut errors);
        assert!(errors.is_empty(), "{:?}", errors.join());
        let mut gen_errors = ErrorBag::new();
        let out = generate(&lang, &mut gen_errors);
        assert!(gen_errors.is_empty(), "{:?}", gen_errors.join());
        out
    }

    #[test]
    fn memoized_left_recursion_splits_into_three_functions() {
        let out = parser_for(
            "binary <x op y>\n",
            "expr(memo): | expr '+' term\n    | term\nterm: | 'if' {_}\nfile: | expr\n",
        );
        assert!(out.contains("const exprMemoId = 0"));
        assert!(out.contains("func (ps *Parser) expr() Node {"));
        assert!(out.contains("if cache, ok = cacheAtPos[exprMemoId]; ok {"));
        assert!(out.contains("t := ps.expr_()"));
        assert!(out.contains("func (ps *Parser) expr_() Node {"));
        assert!(out.contains("_left := ps.exprLeftMost()"));
        assert!(out.contains("_ret := ps.exprRightPart(_left)"));
        assert!(out.contains("func (ps *Parser) exprLeftMost() Node {"));
        assert!(out.contains("func (ps *Parser) exprRightPart(_left Node) Node {"));
        assert!(out.contains("_1 = _left"));
        assert!(out.contains("_2 = ps._expectK(TokenTypeOpPlus)"));
    }

    #[test]
    fn non_recursive_rule_stays_single_function() {
        let out = parser_for("unary <x>\n", "file: | 'if' {_}\n");
        assert!(out.contains("func (ps *Parser) file() Node {"));
        assert!(out.contains("return dummyNode"));
        assert!(!out.contains("fileLeftMost"));
    }

    #[test]
    fn fully_left_recursive_rule_has_empty_left_most() {
        let out = parser_for("unary <x>\n", "loop: | loop '+'\nfile: | 'if' {_}\n");
        assert!(out.contains("func (ps *Parser) loopLeftMost() Node {\n\treturn nil\n}"));
    }

    #[test]
    fn bind_labels_hoist_sorted_declarations() {
        let out = parser_for(
            "binary <x op y>\n",
            "sum: | z='if' a=ident {binary(a, z)}\nfile: | sum\n",
        );
        let a = out.find("var a Node").unwrap();
        let z = out.find("var z Node").unwrap();
        assert!(a < z);
        assert!(out.contains(
            "return NewBinaryNode(ps._filePath, ps._fileContent, a, z, ps._tokens[pos].Start, ps._visibleTokenBefore(ps._mark()).End)"
        ));
    }

    #[test]
    fn separated_repeat_marks_and_resets_between_elements() {
        let out = parser_for("unary <x>\n", "args: | list=','.ident+ {list}\nfile: | args\n");
        assert!(out.contains("var list Node"));
        assert!(out.contains("_p := ps._mark()"));
        assert!(out.contains("_3 = ps._expectK(TokenTypeOpComma)"));
        assert!(out.contains("ps._reset(_p)"));
        assert!(out.contains("list = NewNodesNode(_1)"), "{out}");
        assert!(out.contains("return list"));
    }

    #[test]
    fn cooperative_backtracking_region_wraps_enter_leave() {
        let out = parser_for(
            "unary <x>\n",
            "r: | 'if' [ cond=ident ] 'return' {unary(cond)}\nfile: | r\n",
        );
        assert!(out.contains("_break := true"));
        assert!(out.contains("ps._enter()"));
        assert!(out.contains("ps._leave()"));
        assert!(out.contains("if _break {"));
    }

    #[test]
    fn forward_if_not_match_consumes_one_token() {
        let out = parser_for("unary <x>\n", "sync: | ~'}' 'if' {_}\nfile: | sync\n");
        assert!(out.contains("_1 = ps._expectK(TokenTypeOpRightBrace)"));
        assert!(out.contains("_1 = ps._anyToken()"));
        assert!(out.contains("} else {"));
    }

    #[test]
    fn string_atoms_resolve_operator_keyword_or_verbatim() {
        let out = parser_for(
            "unary <x>\n",
            "r: | '+' 'if' 'other' {_}\nfile: | r\n",
        );
        assert!(out.contains("_expectK(TokenTypeOpPlus)"));
        assert!(out.contains("_expectK(TokenTypeKwIf)"));
        assert!(out.contains("_expectV(\"other\")"));
    }

    #[test]
    fn token_atoms_expect_by_kind() {
        let out = parser_for("unary <x>\n", "r: | IDENT {_}\nfile: | r\n");
        assert!(out.contains("_expectK(TokenTypeIdent)"));
    }

    #[test]
    fn bracket_ellipsis_scans_balanced_region() {
        let out = parser_for("unary <x>\n", "body: | b='('...')' {unary(b)}\nfile: | body\n");
        assert!(out.contains("if _first = ps._expectV(\"(\"); _first == nil {"));
        assert!(out.contains("_depth := 1"));
        assert!(out.contains("panic(\"bracket ellipsis reach end of file\")"));
        assert!(out.contains("b = ps._pseudoToken(_first, _last)"));
    }

    #[test]
    fn helper_call_action_dispatches_to_parser_method() {
        let out = parser_for(
            "unary <x>\n",
            "r: | x=ident y=ident {_merge_nodes(x, y)}\nfile: | r\n",
        );
        assert!(out.contains("return ps._mergeNodes(x, y)"));
    }

    #[test]
    fn list_action_wraps_in_nodes_node() {
        let out = parser_for("unary <x>\n", "r: | x=ident {[x]}\nfile: | r\n");
        assert!(out.contains("return NewNodesNode([]Node{x})"));
    }

    #[test]
    fn choice_without_action_returns_first_unnamed_local() {
        let out = parser_for("unary <x>\n", "r: | ident 'if'\nfile: | r\n");
        assert!(out.contains("var _1 Node"));
        assert!(out.contains("return _1"));
    }

    #[test]
    fn output_is_deterministic() {
        let a = parser_for("unary <x>\n", "file: | 'if' {_}\n");
        let b = parser_for("unary <x>\n", "file: | 'if' {_}\n");
        assert_eq!(a, b);
    }
}
