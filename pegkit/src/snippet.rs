use crate::Position;
use std::sync::Arc;

/// An immutable source file: path plus full content.
///
/// One `SourceFile` is shared by every snippet and rule-tree node derived
/// from it, so forks never copy text.
#[derive(Debug)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// A borrowed view over a range of a [`SourceFile`].
///
/// Snippets are the universal currency for source attribution: rule trees
/// keep one per node and error messages slice them back out of the
/// original buffer.
#[derive(Debug, Clone)]
pub struct Snippet {
    file: Arc<SourceFile>,
    pub start: Position,
    pub end: Position,
}

impl Snippet {
    /// Creates a snippet covering an entire file.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let end = Position::default().forward(&content);
        Self {
            file: Arc::new(SourceFile {
                path: path.into(),
                content,
            }),
            start: Position::default(),
            end,
        }
    }

    /// A new snippet over the same backing file with a different range.
    pub fn fork(&self, start: Position, end: Position) -> Snippet {
        Snippet {
            file: Arc::clone(&self.file),
            start,
            end,
        }
    }

    /// The text covered by this snippet.
    pub fn text(&self) -> &str {
        &self.file.content[self.start.offset..self.end.offset]
    }

    /// Path of the backing file (may be empty for in-memory input).
    pub fn path(&self) -> &str {
        &self.file.path
    }

    /// Full content of the backing file.
    pub fn content(&self) -> &str {
        &self.file.content
    }
}

impl PartialEq for Snippet {
    fn eq(&self, other: &Self) -> bool {
        self.start.offset == other.start.offset && self.end.offset == other.end.offset
    }
}

impl Eq for Snippet {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_snippet() {
        let s = Snippet::new("a.txt", "hello\nworld\n");
        assert_eq!(s.text(), "hello\nworld\n");
        assert_eq!(s.path(), "a.txt");
        assert_eq!(s.end.line_idx, 2);
    }

    #[test]
    fn fork_shares_backing_content() {
        let s = Snippet::new("", "hello world");
        let start = Position::new(6, 0, 6);
        let end = Position::new(11, 0, 11);
        let f = s.fork(start, end);
        assert_eq!(f.text(), "world");
        assert_eq!(f.content(), s.content());
    }

    #[test]
    fn fork_of_fork_keeps_absolute_offsets() {
        let s = Snippet::new("", "abc def ghi");
        let f = s.fork(Position::new(4, 0, 4), Position::new(11, 0, 11));
        let g = f.fork(Position::new(8, 0, 8), Position::new(11, 0, 11));
        assert_eq!(g.text(), "ghi");
    }

    #[test]
    fn equality_is_by_byte_range() {
        let s = Snippet::new("", "abc abc");
        let a = s.fork(Position::new(0, 0, 0), Position::new(3, 0, 3));
        let b = s.fork(Position::new(0, 0, 0), Position::new(3, 0, 3));
        let c = s.fork(Position::new(4, 0, 4), Position::new(7, 0, 7));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
