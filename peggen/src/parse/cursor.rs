use anyhow::anyhow;
use pegkit::{Position, Snippet};

/// Byte cursor over one item snippet of the grammar file.
///
/// Tracks the current position, a one-byte lookahead, and the farthest
/// position ever reached so error messages point at the deepest expected
/// token rather than wherever backtracking left the cursor. A stack of
/// parser frame names is maintained by the rule parsers for the error
/// trailer.
pub struct GrammarCursor<'a> {
    input: &'a Snippet,
    pos: Position,
    max: Position,
    la: u8,
    frames: Vec<&'static str>,
}

impl<'a> GrammarCursor<'a> {
    pub fn new(input: &'a Snippet) -> Self {
        let mut cur = Self {
            input,
            pos: input.start,
            max: input.start,
            la: 0,
            frames: Vec::new(),
        };
        cur.lookahead();
        cur
    }

    pub fn input(&self) -> &Snippet {
        self.input
    }

    pub fn la(&self) -> u8 {
        self.la
    }

    pub fn mark(&self) -> Position {
        self.pos
    }

    pub fn reset(&mut self, pos: Position) {
        self.pos = pos;
        self.lookahead();
    }

    pub fn enter(&mut self, frame: &'static str) {
        self.frames.push(frame);
    }

    pub fn leave(&mut self) {
        self.frames.pop();
    }

    fn lookahead(&mut self) {
        if self.pos.offset >= self.input.end.offset {
            self.la = 0;
        } else {
            self.la = self.input.content().as_bytes()[self.pos.offset];
        }
    }

    pub fn reach_end(&self) -> bool {
        self.la == 0
    }

    pub fn step_forward(&mut self) {
        if self.la == 0 {
            return;
        }
        let la = self.la;
        self.pos.offset += 1;
        if la == b'\n' {
            self.pos.line_idx += 1;
            self.pos.char_idx = 0;
        } else {
            self.pos.char_idx += 1;
        }
        self.lookahead();
        if self.pos.offset > self.max.offset {
            self.max = self.pos;
        }
    }

    pub fn expect(&mut self, v: u8) -> bool {
        if v == self.la {
            self.step_forward();
            return true;
        }
        false
    }

    pub fn expect_str(&mut self, s: &str) -> bool {
        let pos = self.mark();
        for &b in s.as_bytes() {
            if !self.expect(b) {
                self.reset(pos);
                return false;
            }
        }
        true
    }

    /// Advances until `stop` returns true or the end is reached; returns
    /// the consumed range.
    pub fn forward_until(&mut self, mut stop: impl FnMut(u8) -> bool) -> (Position, Position) {
        let start = self.pos;
        while !self.reach_end() {
            if stop(self.la) {
                break;
            }
            self.step_forward();
        }
        (start, self.pos)
    }

    pub fn expect_identifier(&mut self) -> Option<Snippet> {
        let (start, end) = self.forward_until(|b| {
            !(b.is_ascii_lowercase() || b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        });
        if start.offset == end.offset {
            return None;
        }
        Some(self.input.fork(start, end))
    }

    pub fn skip_whitespace(&mut self) {
        self.forward_until(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
    }

    /// Builds an "expect X" error at the farthest reached position, with
    /// a source-context window and the active parser frames.
    pub fn expect_error(&self, expected: &str) -> anyhow::Error {
        let content = self.input.content();
        let lines: Vec<&str> = content.split('\n').collect();
        let mut detail = String::new();
        let start_line = self.max.line_idx.saturating_sub(3);
        let end_line = (self.max.line_idx + 4).min(lines.len());
        for i in start_line..end_line {
            detail.push_str(&format!("{}\t{}\n", i + 1, lines[i]));
        }
        detail.push_str("----------------\n");
        for frame in self.frames.iter().rev() {
            detail.push_str(&format!(" - {frame}\n"));
        }
        let rest = &content[self.max.offset.min(content.len())..];
        let line = match rest.find('\n') {
            Some(idx) => &rest[..idx],
            None => rest,
        };
        anyhow!(
            "expect {} at {}:{}, \"{}\"\n{}",
            expected,
            self.max.line_idx + 1,
            self.max.char_idx + 1,
            line,
            detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_advances_only_on_match() {
        let s = Snippet::new("", "ab");
        let mut cur = GrammarCursor::new(&s);
        assert!(!cur.expect(b'b'));
        assert!(cur.expect(b'a'));
        assert!(cur.expect(b'b'));
        assert!(cur.reach_end());
    }

    #[test]
    fn expect_str_resets_on_partial_match() {
        let s = Snippet::new("", "(memo!");
        let mut cur = GrammarCursor::new(&s);
        assert!(!cur.expect_str("(memo)"));
        assert_eq!(cur.mark().offset, 0);
        assert!(cur.expect_str("(memo!"));
    }

    #[test]
    fn identifier_and_whitespace() {
        let s = Snippet::new("", "  foo_1 :");
        let mut cur = GrammarCursor::new(&s);
        cur.skip_whitespace();
        let ident = cur.expect_identifier().unwrap();
        assert_eq!(ident.text(), "foo_1");
        cur.skip_whitespace();
        assert!(cur.expect(b':'));
    }

    #[test]
    fn error_points_at_farthest_position() {
        let s = Snippet::new("", "abc\ndef\n");
        let mut cur = GrammarCursor::new(&s);
        let pos = cur.mark();
        cur.expect_str("abc\nde");
        cur.reset(pos);
        let msg = cur.expect_error("something").to_string();
        assert!(msg.starts_with("expect something at 2:3, \"f\""), "{msg}");
    }

    #[test]
    fn error_includes_frames_deepest_first() {
        let s = Snippet::new("", "x");
        let mut cur = GrammarCursor::new(&s);
        cur.enter("rule");
        cur.enter("choice");
        let msg = cur.expect_error("y").to_string();
        let rule_at = msg.find(" - rule").unwrap();
        let choice_at = msg.find(" - choice").unwrap();
        assert!(choice_at < rule_at);
    }

    #[test]
    fn newline_resets_column() {
        let s = Snippet::new("", "a\nb");
        let mut cur = GrammarCursor::new(&s);
        cur.step_forward();
        cur.step_forward();
        let p = cur.mark();
        assert_eq!((p.line_idx, p.char_idx), (1, 0));
    }
}
