//! Recursive-descent parser for one grammar rule of the grammar file.

use crate::model::{GrammarKind, GrammarNodeId, GrammarTree};
use crate::parse::cursor::GrammarCursor;
use anyhow::Result;
use pegkit::Snippet;

/// Parses one grammar-rule item into the arena, returning the `Rule`
/// node.
pub fn parse_grammar_rule(tree: &mut GrammarTree, input: &Snippet) -> Result<GrammarNodeId> {
    let rule = tree.add(GrammarKind::Rule, None);
    let mut parser = GrammarRuleParser {
        cur: GrammarCursor::new(input),
        tree,
        rule,
    };
    parser.run()?;
    Ok(rule)
}

struct GrammarRuleParser<'a, 'b> {
    cur: GrammarCursor<'a>,
    tree: &'b mut GrammarTree,
    rule: GrammarNodeId,
}

fn prefix_of_atom(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_uppercase() || b == b'_' || b == b'\'' || b == b'('
}

fn prefix_of_item(b: u8) -> bool {
    b == b'[' || b == b']' || b == b'~' || b == b'&' || b == b'!' || prefix_of_atom(b)
}

impl GrammarRuleParser<'_, '_> {
    fn run(&mut self) -> Result<()> {
        self.cur.enter("grammar_rule");
        self.cur.skip_whitespace();
        let start = self.cur.mark();
        let Some(name) = self.cur.expect_identifier() else {
            return Err(self.cur.expect_error("grammar rule name"));
        };
        self.tree.node_mut(self.rule).name = name.text().into();

        self.cur.skip_whitespace();
        if self.cur.expect_str("(memo)") {
            self.tree.node_mut(self.rule).rule_memo = true;
        }

        self.cur.skip_whitespace();
        if !self.cur.expect(b':') {
            return Err(self.cur.expect_error("\":\""));
        }

        let choices = self.parse_choices(self.rule)?;
        self.tree.node_mut(self.rule).children = choices;

        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        self.tree.node_mut(self.rule).snippet = Some(snippet);

        self.cur.skip_whitespace();
        if !self.cur.reach_end() {
            return Err(self.cur.expect_error("EOF"));
        }
        self.cur.leave();
        Ok(())
    }

    fn parse_choices(&mut self, parent: GrammarNodeId) -> Result<Vec<GrammarNodeId>> {
        self.cur.enter("grammar_choices");
        self.cur.skip_whitespace();
        let mut choices = Vec::new();
        self.cur.expect(b'|');
        let mut end;
        loop {
            let choice = self.parse_choice(parent)?;
            choices.push(choice);
            end = self.cur.mark();

            self.cur.skip_whitespace();
            if self.cur.expect(b'|') {
                continue;
            }
            let in_group = parent != self.rule;
            if (!in_group && self.cur.reach_end()) || (in_group && self.cur.la() == b')') {
                break;
            }
        }
        self.cur.reset(end);
        self.cur.leave();
        Ok(choices)
    }

    fn parse_choice(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        self.cur.enter("grammar_choice");
        self.cur.skip_whitespace();
        let choice = self.tree.add(GrammarKind::Choice, Some(parent));
        let start = self.cur.mark();

        self.parse_choice_rule(choice)?;
        let mut end = self.cur.mark();

        self.cur.skip_whitespace();
        if self.cur.la() == b'{' {
            let action = self.parse_choice_action(choice)?;
            self.tree.node_mut(choice).action = Some(action);
            end = self.cur.mark();
        }

        let snippet = self.cur.input().fork(start, end);
        self.tree.node_mut(choice).snippet = Some(snippet);
        self.cur.leave();
        Ok(choice)
    }

    fn parse_choice_rule(&mut self, choice: GrammarNodeId) -> Result<()> {
        self.cur.skip_whitespace();
        let mut items = Vec::new();
        let start = self.cur.mark();
        let mut end = self.cur.mark();
        loop {
            if !prefix_of_item(self.cur.la()) {
                break;
            }
            let item = self.parse_item(choice)?;
            items.push(item);
            end = self.cur.mark();
            self.cur.skip_whitespace();
        }
        self.cur.reset(end);
        if start.same_as(end) {
            return Err(self.cur.expect_error("grammar item node"));
        }
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(choice);
        node.children = items;
        node.snippet = Some(snippet);
        Ok(())
    }

    fn parse_choice_action(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        self.cur.enter("choice_action");
        self.cur.step_forward();
        let action = self.parse_action_expr(parent)?;
        self.cur.skip_whitespace();
        if !self.cur.expect(b'}') {
            return Err(self.cur.expect_error("'}'"));
        }
        self.cur.leave();
        Ok(action)
    }

    fn parse_action_expr(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        self.cur.skip_whitespace();
        let start = self.cur.mark();
        let mut kind: Option<GrammarKind> = None;
        if self.cur.la() == b'_' {
            self.cur.step_forward();
            if !self.cur.la().is_ascii_lowercase() {
                kind = Some(GrammarKind::NullAction);
            } else {
                self.cur.reset(start);
            }
        }
        let action;
        match kind {
            Some(k) => {
                action = self.tree.add(k, Some(parent));
            }
            None => {
                if self.cur.expect(b'[') {
                    let list = self.tree.add(GrammarKind::ListAction, Some(parent));
                    let elem = self.parse_action_expr(list)?;
                    if !self.cur.expect(b']') {
                        return Err(self.cur.expect_error("']'"));
                    }
                    self.tree.node_mut(list).children = vec![elem];
                    action = list;
                } else if self.cur.la() == b'_' || self.cur.la().is_ascii_lowercase() {
                    if let Some(call) = self.parse_call_action_expr(parent)? {
                        action = call;
                    } else {
                        self.cur.expect_identifier();
                        action = self.tree.add(GrammarKind::NameAction, Some(parent));
                    }
                } else {
                    return Err(self.cur.expect_error("action prefix [\\[_a-z]"));
                }
            }
        }
        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        self.tree.node_mut(action).snippet = Some(snippet);
        Ok(action)
    }

    fn parse_call_action_expr(&mut self, parent: GrammarNodeId) -> Result<Option<GrammarNodeId>> {
        let pos = self.cur.mark();
        let name = self.cur.expect_identifier();
        if !self.cur.expect(b'(') {
            self.cur.reset(pos);
            return Ok(None);
        }
        let name = name.map(|s| s.text().to_string()).unwrap_or_default();

        let call = self.tree.add(GrammarKind::CallAction, Some(parent));
        self.tree.node_mut(call).name = name.into();
        let mut args = Vec::new();
        loop {
            if self.cur.la() == b')' {
                break;
            }
            if !args.is_empty() {
                self.cur.skip_whitespace();
                if !self.cur.expect(b',') {
                    return Err(self.cur.expect_error("','"));
                }
            }
            let arg = self.parse_action_expr(call)?;
            args.push(arg);
        }
        self.tree.node_mut(call).children = args;
        self.cur.step_forward();
        Ok(Some(call))
    }

    fn try_parse_item_name(&mut self) -> Option<Snippet> {
        let pos = self.cur.mark();
        let snippet = self.cur.expect_identifier()?;
        if !self.cur.expect(b'=') {
            self.cur.reset(pos);
            return None;
        }
        Some(snippet)
    }

    fn parse_item(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        self.cur.enter("grammar_item");
        let item = self.tree.add(GrammarKind::AtomItem, Some(parent));
        let start = self.cur.mark();
        if let Some(name) = self.try_parse_item_name() {
            self.tree.node_mut(item).name = name.text().into();
        }
        let atom;
        if self.cur.expect(b'!') {
            self.tree.node_mut(item).kind = GrammarKind::NegativeLookaheadItem;
            atom = self.parse_atom(item)?;
        } else if self.cur.expect(b'&') {
            self.tree.node_mut(item).kind = GrammarKind::PositiveLookaheadItem;
            atom = self.parse_atom(item)?;
        } else if self.cur.expect(b'~') {
            self.tree.node_mut(item).kind = GrammarKind::ForwardIfNotMatchItem;
            atom = self.parse_atom(item)?;
        } else {
            let first = self.parse_atom(item)?;
            if self.cur.expect(b'?') {
                self.tree.node_mut(item).kind = GrammarKind::OptionalItem;
                atom = first;
            } else if self.cur.expect(b'*') {
                self.tree.node_mut(item).kind = GrammarKind::Repeat0Item;
                atom = first;
            } else if self.cur.expect(b'+') {
                self.tree.node_mut(item).kind = GrammarKind::Repeat1Item;
                atom = first;
            } else if self.cur.expect(b'.') {
                self.tree.node_mut(item).separator = Some(first);
                atom = self.parse_atom(item)?;
                if self.cur.expect(b'*') {
                    self.tree.node_mut(item).kind = GrammarKind::SeparatedRepeat0Item;
                } else if self.cur.expect(b'+') {
                    self.tree.node_mut(item).kind = GrammarKind::SeparatedRepeat1Item;
                } else {
                    return Err(self.cur.expect_error("'*' or '+'"));
                }
            } else {
                atom = first;
            }
        }
        self.tree.node_mut(item).children = vec![atom];
        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        self.tree.node_mut(item).snippet = Some(snippet);

        // item suffix marking a cooperative-backtracking boundary
        self.cur.skip_whitespace();
        if self.cur.la() == b'[' || self.cur.la() == b']' {
            self.tree.node_mut(item).suffix = Some(self.cur.la() as char);
            self.cur.step_forward();
        } else {
            self.cur.reset(end);
        }
        self.cur.leave();
        Ok(item)
    }

    fn parse_atom(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        if let Some(atom) = self.try_parse_bracket_ellipsis_atom(parent) {
            return Ok(atom);
        }
        if self.cur.la() == b'(' {
            self.parse_group_atom(parent)
        } else if self.cur.la() == b'\'' {
            self.parse_string_atom(parent)
        } else if self.cur.la().is_ascii_lowercase() || self.cur.la() == b'_' {
            self.parse_name_atom(parent)
        } else if self.cur.la().is_ascii_uppercase() {
            self.parse_token_atom(parent)
        } else {
            Err(self.cur.expect_error("atom prefix ['(a-zA-Z_]"))
        }
    }

    fn parse_string_atom(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        let atom = self.tree.add(GrammarKind::StringAtom, Some(parent));
        let start = self.cur.mark();
        self.cur.step_forward();
        let mut prev = 0u8;
        self.cur.forward_until(|b| {
            if prev != b'\\' && b == b'\'' {
                return true;
            }
            prev = b;
            false
        });
        if !self.cur.expect(b'\'') {
            return Err(self.cur.expect_error("'"));
        }
        let end = self.cur.mark();
        self.tree.node_mut(atom).snippet = Some(self.cur.input().fork(start, end));
        Ok(atom)
    }

    fn parse_name_atom(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        let atom = self.tree.add(GrammarKind::NameAtom, Some(parent));
        let (start, end) = self
            .cur
            .forward_until(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'));
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(atom);
        node.name = snippet.text().into();
        node.snippet = Some(snippet);
        Ok(atom)
    }

    fn parse_token_atom(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        let atom = self.tree.add(GrammarKind::TokenAtom, Some(parent));
        let (start, end) = self
            .cur
            .forward_until(|b| !(b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_'));
        self.tree.node_mut(atom).snippet = Some(self.cur.input().fork(start, end));
        Ok(atom)
    }

    fn try_parse_bracket_ellipsis_atom(&mut self, parent: GrammarNodeId) -> Option<GrammarNodeId> {
        let start = self.cur.mark();
        if self.cur.expect_str("'('...')'")
            || self.cur.expect_str("'['...']'")
            || self.cur.expect_str("'{'...'}'")
        {
            let atom = self.tree.add(GrammarKind::BracketEllipsisAtom, Some(parent));
            let end = self.cur.mark();
            self.tree.node_mut(atom).snippet = Some(self.cur.input().fork(start, end));
            return Some(atom);
        }
        None
    }

    fn parse_group_atom(&mut self, parent: GrammarNodeId) -> Result<GrammarNodeId> {
        self.cur.enter("grammar_group_atom");
        let atom = self.tree.add(GrammarKind::GroupAtom, Some(parent));
        let start = self.cur.mark();
        self.cur.step_forward();
        let choices = self.parse_choices(atom)?;
        if !self.cur.expect(b')') {
            return Err(self.cur.expect_error("')'"));
        }
        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(atom);
        node.snippet = Some(snippet);
        node.children = choices;
        self.cur.leave();
        Ok(atom)
    }
}
