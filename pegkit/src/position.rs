/// A position in source text: byte offset plus 0-based line/column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// Byte offset from the start of the file.
    pub offset: usize,
    /// 0-based line number.
    pub line_idx: usize,
    /// 0-based character position in the line.
    pub char_idx: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(offset: usize, line_idx: usize, char_idx: usize) -> Self {
        Self {
            offset,
            line_idx,
            char_idx,
        }
    }

    /// Returns the position reached after consuming `text`.
    ///
    /// Line breaks reset the column; the offset always advances by the
    /// byte length of `text`.
    pub fn forward(&self, text: &str) -> Position {
        let line_count = text.bytes().filter(|&b| b == b'\n').count();
        let char_idx = match text.rfind('\n') {
            None => self.char_idx + text.len(),
            Some(i) => text.len() - i - 1,
        };
        Position {
            offset: self.offset + text.len(),
            line_idx: self.line_idx + line_count,
            char_idx,
        }
    }

    /// Positions compare as "the same place" by offset alone.
    #[inline]
    pub fn same_as(&self, other: Position) -> bool {
        self.offset == other.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_without_newline() {
        let p = Position::new(3, 1, 3);
        let q = p.forward("abcd");
        assert_eq!(q, Position::new(7, 1, 7));
    }

    #[test]
    fn forward_across_newlines() {
        let p = Position::new(0, 0, 5);
        let q = p.forward("ab\ncd\nef");
        assert_eq!(q, Position::new(8, 2, 2));
    }

    #[test]
    fn forward_ending_on_newline() {
        let p = Position::default();
        let q = p.forward("ab\n");
        assert_eq!(q, Position::new(3, 1, 0));
    }

    #[test]
    fn same_as_ignores_line_and_column() {
        let a = Position::new(10, 1, 2);
        let b = Position::new(10, 4, 0);
        assert!(a.same_as(b));
        assert!(!a.same_as(Position::new(11, 1, 2)));
    }
}
