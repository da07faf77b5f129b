//! Recursive-descent parser for one token rule of the grammar file.

use crate::model::{TokenKind, TokenNodeId, TokenTree};
use crate::parse::cursor::GrammarCursor;
use anyhow::Result;
use pegkit::Snippet;

/// Parses one token-rule item into the arena, returning the `Rule` node.
pub fn parse_token_rule(tree: &mut TokenTree, input: &Snippet) -> Result<TokenNodeId> {
    let rule = tree.add(TokenKind::Rule, None);
    let mut parser = TokenRuleParser {
        cur: GrammarCursor::new(input),
        tree,
        rule,
    };
    parser.run()?;
    Ok(rule)
}

struct TokenRuleParser<'a, 'b> {
    cur: GrammarCursor<'a>,
    tree: &'b mut TokenTree,
    rule: TokenNodeId,
}

fn prefix_of_atom(b: u8) -> bool {
    b == b'(' || b == b'\'' || b == b'[' || b.is_ascii_lowercase() || b == b'_'
}

fn prefix_of_item(b: u8) -> bool {
    prefix_of_atom(b) || b == b'!' || b == b'&'
}

impl TokenRuleParser<'_, '_> {
    fn run(&mut self) -> Result<()> {
        self.cur.enter("token_rule");
        self.cur.skip_whitespace();
        let start = self.cur.mark();
        let Some(name) = self.cur.expect_identifier() else {
            return Err(self.cur.expect_error("token rule name"));
        };
        self.cur.skip_whitespace();
        if !self.cur.expect(b':') {
            return Err(self.cur.expect_error("\":\""));
        }
        let choices = self.parse_choices(self.rule)?;
        let end = self.cur.mark();

        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(self.rule);
        node.name = name.text().into();
        node.snippet = Some(snippet);
        node.children = choices;

        self.cur.skip_whitespace();
        if !self.cur.reach_end() {
            return Err(self.cur.expect_error("EOF"));
        }
        self.cur.leave();
        Ok(())
    }

    fn parse_choices(&mut self, parent: TokenNodeId) -> Result<Vec<TokenNodeId>> {
        self.cur.enter("token_choices");
        let mut choices = Vec::new();
        self.cur.skip_whitespace();
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

    fn parse_choice(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        self.cur.enter("token_choice");
        self.cur.skip_whitespace();
        let choice = self.tree.add(TokenKind::Choice, Some(parent));
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
            return Err(self.cur.expect_error("token item node"));
        }
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(choice);
        node.children = items;
        node.snippet = Some(snippet);
        self.cur.leave();
        Ok(choice)
    }

    fn parse_item(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        self.cur.enter("token_item");
        self.cur.skip_whitespace();
        let item = self.tree.add(TokenKind::AtomItem, Some(parent));
        let start = self.cur.mark();
        let atom;
        if self.cur.expect(b'!') {
            atom = self.parse_atom(item)?;
            self.tree.node_mut(item).kind = TokenKind::NegativeLookaheadItem;
        } else if self.cur.expect(b'&') {
            atom = self.parse_atom(item)?;
            self.tree.node_mut(item).kind = TokenKind::PositiveLookaheadItem;
        } else {
            atom = self.parse_atom(item)?;
            let kind = if self.cur.expect(b'?') {
                TokenKind::OptionalItem
            } else if self.cur.expect(b'*') {
                TokenKind::Repeat0Item
            } else if self.cur.expect(b'+') {
                TokenKind::Repeat1Item
            } else {
                TokenKind::AtomItem
            };
            self.tree.node_mut(item).kind = kind;
        }
        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(item);
        node.snippet = Some(snippet);
        node.children = vec![atom];
        self.cur.leave();
        Ok(item)
    }

    fn parse_atom(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        self.cur.skip_whitespace();
        if self.cur.la() == b'(' {
            self.parse_group_atom(parent)
        } else if self.cur.la() == b'[' {
            self.parse_character_class_atom(parent)
        } else if self.cur.la() == b'\'' {
            self.parse_string_atom(parent)
        } else if self.cur.la().is_ascii_lowercase() || self.cur.la() == b'_' {
            self.parse_name_atom(parent)
        } else {
            Err(self.cur.expect_error("atom prefix \"[\\[('a-z_]\""))
        }
    }

    fn parse_group_atom(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        self.cur.enter("token_group_atom");
        let atom = self.tree.add(TokenKind::GroupAtom, Some(parent));
        let start = self.cur.mark();
        self.cur.step_forward();
        let choices = self.parse_choices(atom)?;
        self.cur.skip_whitespace();
        if !self.cur.expect(b')') {
            return Err(self.cur.expect_error("\")\""));
        }
        let end = self.cur.mark();
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(atom);
        node.snippet = Some(snippet);
        node.children = choices;
        self.cur.leave();
        Ok(atom)
    }

    fn parse_character_class_atom(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        let atom = self.tree.add(TokenKind::CharacterClassAtom, Some(parent));
        let start = self.cur.mark();
        self.cur.step_forward();
        self.cur.forward_until(|b| b == b']');
        if !self.cur.expect(b']') {
            return Err(self.cur.expect_error("\"]\""));
        }
        let end = self.cur.mark();
        self.tree.node_mut(atom).snippet = Some(self.cur.input().fork(start, end));
        Ok(atom)
    }

    fn parse_name_atom(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        let atom = self.tree.add(TokenKind::NameAtom, Some(parent));
        let (start, end) = self
            .cur
            .forward_until(|b| !(b.is_ascii_lowercase() || b == b'_'));
        let snippet = self.cur.input().fork(start, end);
        let node = self.tree.node_mut(atom);
        node.name = snippet.text().into();
        node.snippet = Some(snippet);
        Ok(atom)
    }

    fn parse_string_atom(&mut self, parent: TokenNodeId) -> Result<TokenNodeId> {
        let atom = self.tree.add(TokenKind::StringAtom, Some(parent));
        let start = self.cur.mark();
        self.cur.step_forward();
        let mut after_backslash = false;
        self.cur.forward_until(|b| {
            if after_backslash {
                after_backslash = false;
                return false;
            }
            if b == b'\\' {
                after_backslash = true;
                return false;
            }
            b == b'\''
        });
        if !self.cur.expect(b'\'') {
            return Err(self.cur.expect_error("\"'\""));
        }
        let end = self.cur.mark();
        self.tree.node_mut(atom).snippet = Some(self.cur.input().fork(start, end));
        Ok(atom)
    }
}
