//! Stage 3a: emit the tokenizer — the fixed struct payload with its
//! `op()`/`next()` splices filled, keyword initialization, token-stream
//! cleaning, and one boolean method per token rule.

use crate::gen::op_trie::OpTrie;
use crate::gen::Emitter;
use crate::model::{Language, TokenKind, TokenNodeId};
use crate::payload;
use anyhow::{anyhow, Result};
use pegkit::{
    double_quote_escape, parse_character_class, safe_name, single_quote_unescape, to_camel_case,
    to_pascal_case, ClassItem, ErrorBag,
};

/// Generates the tokenizer block. Per-rule failures land in `errors`;
/// the remaining rules still emit.
pub fn generate(lang: &Language, errors: &mut ErrorBag) -> String {
    let mut gen = TokenizerGen {
        lang,
        em: Emitter::new(),
    };
    gen.run(errors);
    gen.em.finish()
}

struct TokenizerGen<'a> {
    lang: &'a Language,
    em: Emitter,
}

impl TokenizerGen<'_> {
    fn run(&mut self, errors: &mut ErrorBag) {
        let tokenizer = payload::TOKENIZER_STRUCT
            .replace("<op_placeholder>", &self.op_code())
            .replace("<next_placeholder>", &self.next_code());
        self.em.put(tokenizer).put_nl();
        self.init_keywords();
        self.em.put_nl();
        self.clean_method();
        self.em.put_nl();
        for i in 0..self.lang.token_rules().len() {
            let rule = self.lang.token_rules()[i];
            match self.rule_code(rule) {
                Ok(()) => {
                    self.em.put_nl();
                }
                Err(err) => errors.push(err),
            }
        }
    }

    fn op_code(&self) -> String {
        let mut em = Emitter::new();
        em.put_nl();
        em.push();
        let mut trie = OpTrie::new();
        for op in self.lang.operators() {
            let name = self.lang.operator_name(op).unwrap_or_default();
            trie.update(name, op.as_bytes());
        }
        trie.gen_code(&mut em);
        em.finish()
    }

    fn next_code(&self) -> String {
        let mut em = Emitter::new();
        em.put_nl();
        em.push();
        for &rule in self.lang.token_rules() {
            let name = self.lang.token_tree.node(rule).name.clone();
            if !name.starts_with('_') {
                em.put(format!(
                    "}} else if tk.{}() {{",
                    safe_name(&to_camel_case(&name))
                ));
                em.push();
                em.put(format!("kind = TokenType{}", to_pascal_case(&name)));
                em.pop();
            }
        }
        em.finish()
    }

    fn init_keywords(&mut self) {
        self.em.put("func (tk *Tokenizer) initKeywords() {");
        self.em.push();
        self.em.put("tk._keywords = make(map[string]string)");
        for keyword in self.lang.keywords() {
            self.em.put(format!(
                "tk._keywords[\"{}\"] = TokenTypeKw{}",
                keyword,
                to_pascal_case(keyword)
            ));
        }
        self.em.pop();
        self.em.put("}");
    }

    /// `Clean` strips whitespace and comment tokens. When the language
    /// declares `;`, newlines additionally insert a semicolon after
    /// statement-ending tokens; otherwise newlines are dropped.
    fn clean_method(&mut self) {
        let has_ident = self
            .lang
            .token_rules()
            .iter()
            .any(|&r| self.lang.token_tree.node(r).name.as_str() == "ident");
        let comment_kinds: Vec<String> = self
            .lang
            .token_rules()
            .iter()
            .filter_map(|&r| {
                let name = &self.lang.token_tree.node(r).name;
                if !name.starts_with('_') && name.contains("comment") {
                    Some(format!("TokenType{}", to_pascal_case(name)))
                } else {
                    None
                }
            })
            .collect();
        let mut asi_conditions = Vec::new();
        if self.lang.operator_name(";").is_some() {
            if has_ident {
                asi_conditions.push("prev == TokenTypeIdent".to_string());
            }
            asi_conditions.push("strings.HasPrefix(prev, \"kw_\")".to_string());
            for (op, const_tail) in [
                (")", "OpRightParen"),
                ("]", "OpRightBracket"),
                ("}", "OpRightBrace"),
            ] {
                if self.lang.operator_name(op).is_some() {
                    asi_conditions.push(format!("prev == TokenType{const_tail}"));
                }
            }
        }

        self.em
            .put("func (tk *Tokenizer) Clean(tokens []*Token) []*Token {");
        self.em.push();
        self.em.put("ret := make([]*Token, 0, len(tokens))");
        self.em.put("for _, tok := range tokens {");
        self.em.push();
        self.em.put("if tok.Kind == TokenTypeWhitespace {");
        self.em.push();
        self.em.put("continue");
        self.em.pop();
        self.em.put("}");
        for kind in &comment_kinds {
            self.em.put(format!("if tok.Kind == {kind} {{"));
            self.em.push();
            self.em.put("continue");
            self.em.pop();
            self.em.put("}");
        }
        self.em.put("if tok.Kind == TokenTypeNewline {");
        self.em.push();
        if !asi_conditions.is_empty() {
            self.em.put("if len(ret) > 0 {");
            self.em.push();
            self.em.put("prev := ret[len(ret)-1].Kind");
            self.em.put(format!("if {} {{", asi_conditions.join(" || ")));
            self.em.push();
            self.em.put(
                "ret = append(ret, NewToken(TokenTypeOpSemi, tok.Start, tok.End, []rune{';'}))",
            );
            self.em.pop();
            self.em.put("}");
            self.em.pop();
            self.em.put("}");
        }
        self.em.put("continue");
        self.em.pop();
        self.em.put("}");
        self.em.put("ret = append(ret, tok)");
        self.em.pop();
        self.em.put("}");
        self.em.put("return ret");
        self.em.pop();
        self.em.put("}");
    }

    fn rule_code(&mut self, rule: TokenNodeId) -> Result<()> {
        self.em.clear_vars();
        let tree = &self.lang.token_tree;
        let name = tree.node(rule).name.clone();
        let choices = tree.node(rule).children.clone();
        let mut header = vec![format!("// {}:", name), "//".to_string()];
        for &choice in &choices {
            let text = snippet_text(tree.node(choice).snippet.as_ref());
            header.push(format!("//\t| {}", text.replace('\n', " ")));
        }
        tree.visit(rule, &mut |id| {
            let node = tree.node(id);
            if node.kind == TokenKind::NameAtom && node.name.starts_with("_group_") {
                header.push(format!(
                    "//\t{} <-- {}",
                    node.name,
                    snippet_text(node.snippet.as_ref())
                ));
            }
        });
        for line in header {
            self.em.put(line);
        }

        self.em.put(format!(
            "func (tk *Tokenizer) {}() bool {{",
            safe_name(&to_camel_case(&name))
        ));
        self.em.push();
        let mut pos_var = String::new();
        for &choice in &choices {
            let text = snippet_text(self.lang.token_tree.node(choice).snippet.as_ref());
            self.em.put(format!("// {}", text.replace('\n', " ")));
            let count = self
                .lang
                .token_tree
                .node(choice)
                .children
                .iter()
                .filter(|&&item| {
                    !matches!(
                        self.lang.token_tree.node(item).kind,
                        TokenKind::NegativeLookaheadItem | TokenKind::PositiveLookaheadItem
                    )
                })
                .count();

            if count <= 1 {
                let depth = self.enter_code(choice, 0)?;
                self.em.put("return true");
                self.leave_code(choice, depth);
            } else {
                if pos_var.is_empty() {
                    pos_var = self.em.create_var("p");
                    self.em.put(format!("{pos_var} := tk._mark()"));
                } else {
                    self.em.put(format!("{pos_var} = tk._mark()"));
                }
                let depth = self.enter_code(choice, 0)?;
                self.em.put("return true");
                self.leave_code(choice, depth);
                self.em.put(format!("tk._reset({pos_var})"));
            }
        }
        self.em.put("return false");
        self.em.pop();
        self.em.put("}");
        Ok(())
    }

    fn enter_code(&mut self, id: TokenNodeId, depth: isize) -> Result<isize> {
        let kind = self.lang.token_tree.node(id).kind;
        match kind {
            TokenKind::Choice => {
                let items = self.lang.token_tree.node(id).children.clone();
                for item in items {
                    self.enter_code(item, depth)?;
                }
                Ok(depth)
            }
            TokenKind::OptionalItem => {
                let child = self.child_of(id);
                self.enter_code(child, depth)?;
                self.leave_code(child, depth);
                Ok(depth)
            }
            TokenKind::Repeat0Item | TokenKind::Repeat1Item => {
                let child = self.child_of(id);
                if kind == TokenKind::Repeat1Item {
                    self.enter_code(child, depth)?;
                }
                let ok_var = self.em.create_var("ok");
                self.em.put("for {");
                self.em.push();
                self.em.put(format!("{ok_var} := false"));
                self.enter_code(child, depth)?;
                self.em.put(format!("{ok_var} = true"));
                self.leave_code(child, depth);
                self.em.put(format!("if !{ok_var} {{"));
                self.em.push();
                self.em.put("break");
                self.em.pop();
                self.em.put("}");
                self.em.pop();
                self.em.put("}");
                Ok(depth)
            }
            TokenKind::NegativeLookaheadItem | TokenKind::PositiveLookaheadItem => {
                let child = self.child_of(id);
                let pos_var = self.em.create_var("p");
                let ok_var = self.em.create_var("ok");
                self.em.put(format!("{pos_var} := tk._mark()"));
                self.em.put(format!("{ok_var} := false"));
                self.enter_code(child, depth)?;
                self.em.put(format!("{ok_var} = true"));
                self.leave_code(child, depth);
                self.em.put(format!("tk._reset({pos_var})"));
                if kind == TokenKind::NegativeLookaheadItem {
                    self.em.put(format!("if !{ok_var} {{"));
                } else {
                    self.em.put(format!("if {ok_var} {{"));
                }
                self.em.push();
                Ok(depth + 1)
            }
            TokenKind::AtomItem => {
                let child = self.child_of(id);
                self.enter_code(child, depth)?;
                Ok(depth)
            }
            TokenKind::NameAtom => {
                let name = self.lang.token_tree.node(id).name.clone();
                self.em.put(format!(
                    "if tk.{}() {{",
                    safe_name(&to_camel_case(&name))
                ));
                self.em.push();
                Ok(depth + 1)
            }
            TokenKind::StringAtom => {
                let text = snippet_text(self.lang.token_tree.node(id).snippet.as_ref());
                let val = &text[1..text.len() - 1];
                if val.len() == 1 {
                    self.em
                        .put(format!("if tk._expect(0x{:X}) {{", val.as_bytes()[0]));
                } else {
                    let raw = single_quote_unescape(val);
                    let escaped = double_quote_escape(&raw);
                    self.em.put(format!("if tk._expectS(\"{escaped}\") {{"));
                }
                self.em.push();
                Ok(depth + 1)
            }
            TokenKind::CharacterClassAtom => {
                let text = snippet_text(self.lang.token_tree.node(id).snippet.as_ref());
                let body = &text[1..text.len() - 1];
                let items = parse_character_class(body).map_err(|e| anyhow!(e))?;
                let conditions: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        ClassItem::Single(c) => format!("tk._expect(0x{:X})", *c as u32),
                        ClassItem::Range(s, e) => {
                            format!("tk._expectR(0x{:X}, 0x{:X})", *s as u32, *e as u32)
                        }
                    })
                    .collect();
                self.em.put(format!("if {} {{", conditions.join(" || ")));
                self.em.push();
                Ok(depth + 1)
            }
            TokenKind::Rule | TokenKind::GroupAtom => panic!("unreachable"),
        }
    }

    fn leave_code(&mut self, id: TokenNodeId, depth: isize) -> isize {
        let kind = self.lang.token_tree.node(id).kind;
        match kind {
            TokenKind::Choice => {
                let items = self.lang.token_tree.node(id).children.clone();
                let mut depth = depth;
                for &item in items.iter().rev() {
                    depth = self.leave_code(item, depth);
                }
                depth
            }
            TokenKind::OptionalItem => depth,
            TokenKind::Repeat0Item | TokenKind::Repeat1Item => {
                if kind == TokenKind::Repeat1Item {
                    let child = self.child_of(id);
                    self.leave_code(child, depth);
                }
                depth
            }
            TokenKind::NegativeLookaheadItem | TokenKind::PositiveLookaheadItem => {
                self.em.pop();
                self.em.put("}");
                depth - 1
            }
            TokenKind::AtomItem => {
                let child = self.child_of(id);
                self.leave_code(child, depth);
                depth
            }
            TokenKind::NameAtom | TokenKind::CharacterClassAtom | TokenKind::StringAtom => {
                self.em.pop();
                self.em.put("}");
                depth - 1
            }
            TokenKind::Rule | TokenKind::GroupAtom => panic!("this should never happen"),
        }
    }

    fn child_of(&self, id: TokenNodeId) -> TokenNodeId {
        self.lang
            .token_tree
            .child(id)
            .expect("item node without atom child")
    }
}

fn snippet_text(snippet: Option<&pegkit::Snippet>) -> String {
    snippet.map(|s| s.text().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;
    use crate::split;
    use pegkit::Snippet;

    fn tokenizer_for(tokens: &str, keywords: &str, operators: &str) -> String {
        let divider = format!("{}\n", "-".repeat(120));
        let text = [tokens, keywords, operators, "unary <x>\n", "file: | 'if' {_}\n", "\n"]
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
    fn single_char_strings_use_expect() {
        let out = tokenizer_for("dot: | '.'\n", "if\n", "==\n");
        assert!(out.contains("func (tk *Tokenizer) dot() bool {"));
        assert!(out.contains("if tk._expect(0x2E) {"));
    }

    #[test]
    fn multi_char_strings_use_expect_s() {
        let out = tokenizer_for("arrow: | '->'\n", "if\n", "==\n");
        assert!(out.contains("if tk._expectS(\"->\") {"), "{out}");
    }

    #[test]
    fn char_class_emits_ranges_and_singles() {
        let out = tokenizer_for("ident: | [a-zA-Z_] [a-zA-Z0-9_]*\n", "if\n", "==\n");
        assert!(out.contains(
            "if tk._expectR(0x61, 0x7A) || tk._expectR(0x41, 0x5A) || tk._expect(0x5F) {"
        ));
        // the repeat loop wraps the second class
        assert!(out.contains("for {"));
        assert!(out.contains("_ok := false"));
        assert!(out.contains("if !_ok {"));
    }

    #[test]
    fn multi_item_choice_brackets_with_mark_reset() {
        let out = tokenizer_for("ab: | 'a' 'b'\n    | 'c'\n", "if\n", "==\n");
        assert!(out.contains("_p := tk._mark()"));
        assert!(out.contains("tk._reset(_p)"));
    }

    #[test]
    fn lookahead_resets_unconditionally_and_tests_polarity() {
        let out = tokenizer_for(
            "_any: | !newline 'a'\n",
            "if\n",
            "==\n",
        );
        assert!(out.contains("func (tk *Tokenizer) _any() bool {"));
        assert!(out.contains("tk._reset(_p)"));
        assert!(out.contains("if !_ok {"));
    }

    #[test]
    fn underscore_rules_stay_out_of_next_dispatch() {
        let out = tokenizer_for("ident: | [a-z]+\n_helper: | 'x'\n", "if\n", "==\n");
        assert!(out.contains("} else if tk.ident() {"));
        assert!(out.contains("kind = TokenTypeIdent"));
        assert!(!out.contains("} else if tk._helper() {"));
    }

    #[test]
    fn keywords_populate_the_map() {
        let out = tokenizer_for("ident: | [a-z]+\n", "if\nreturn\n", "==\n");
        assert!(out.contains("tk._keywords[\"if\"] = TokenTypeKwIf"));
        assert!(out.contains("tk._keywords[\"return\"] = TokenTypeKwReturn"));
    }

    #[test]
    fn op_switch_has_one_arm_per_root_byte() {
        let out = tokenizer_for("ident: | [a-z]+\n", "if\n", "==\n<\n<=\n");
        assert!(out.contains("case '=':"));
        assert!(out.contains("case '<':"));
        assert!(out.contains("kind = TokenTypeOpEqualEqual"));
        assert!(out.contains("kind = TokenTypeOpLessEqual"));
        assert!(out.contains("kind = TokenTypeOpLess"));
    }

    #[test]
    fn hoisted_groups_become_callable_helpers() {
        let out = tokenizer_for("num: | ('x' | 'y')+\n", "if\n", "==\n");
        assert!(out.contains("func (tk *Tokenizer) _group1() bool {"));
        assert!(out.contains("if tk._group1() {"));
        assert!(out.contains("//\t_group_1 <-- ('x' | 'y')"));
    }

    #[test]
    fn clean_without_semicolon_operator_just_filters() {
        let out = tokenizer_for("ident: | [a-z]+\n", "if\n", "==\n");
        assert!(out.contains("func (tk *Tokenizer) Clean(tokens []*Token) []*Token {"));
        assert!(!out.contains("TokenTypeOpSemi"));
    }

    #[test]
    fn clean_with_semicolon_operator_inserts_after_statement_enders() {
        let out = tokenizer_for("ident: | [a-z]+\n", "if\n", ";\n)\n");
        assert!(out.contains("prev == TokenTypeIdent"));
        assert!(out.contains("strings.HasPrefix(prev, \"kw_\")"));
        assert!(out.contains("prev == TokenTypeOpRightParen"));
        assert!(out
            .contains("ret = append(ret, NewToken(TokenTypeOpSemi, tok.Start, tok.End, []rune{';'}))"));
    }

    #[test]
    fn comment_rules_are_filtered_by_clean() {
        let out = tokenizer_for("line_comment: | '//' _any_but_eol*\n", "if\n", "==\n");
        assert!(out.contains("if tok.Kind == TokenTypeLineComment {"));
    }
}
