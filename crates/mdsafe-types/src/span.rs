use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// All line/column values are 1-based for human-readable error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let start_line = self.start_line.min(other.start_line);
        let start_col = if self.start_line < other.start_line {
            self.start_col
        } else if other.start_line < self.start_line {
            other.start_col
        } else {
            self.start_col.min(other.start_col)
        };

        let end_line = self.end_line.max(other.end_line);
        let end_col = if self.end_line > other.end_line {
            self.end_col
        } else if other.end_line > self.end_line {
            other.end_col
        } else {
            self.end_col.max(other.end_col)
        };

        Span::new(start_line, start_col, end_line, end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Holds a document's source text.
///
/// Caches line start offsets so byte positions can be mapped back to
/// line/column pairs — the parser extracts embedded snippets by offset and
/// re-parses them with document-relative spans.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast position lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Map a byte offset to a 1-based (line, column) pair.
    ///
    /// Offsets past the end of the source map to the end of the last line.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line_idx];
        (line_idx as u32 + 1, col as u32 + 1)
    }

    /// A zero-width span at the given byte offset.
    pub fn span_at(&self, offset: usize) -> Span {
        let (line, col) = self.position(offset);
        Span::point(line, col)
    }

    /// The span covering the byte range `start..end`.
    pub fn span_of(&self, start: usize, end: usize) -> Span {
        let (sl, sc) = self.position(start);
        let (el, ec) = self.position(end);
        Span::new(sl, sc, el, ec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_spans() {
        let a = Span::new(1, 5, 1, 9);
        let b = Span::new(2, 1, 2, 4);
        assert_eq!(a.merge(b), Span::new(1, 5, 2, 4));
        assert_eq!(b.merge(a), Span::new(1, 5, 2, 4));
    }

    #[test]
    fn merge_same_line() {
        let a = Span::new(3, 2, 3, 6);
        let b = Span::new(3, 4, 3, 10);
        assert_eq!(a.merge(b), Span::new(3, 2, 3, 10));
    }

    #[test]
    fn position_lookup() {
        let sf = SourceFile::new("doc.md", "ab\ncd\n\nef");
        assert_eq!(sf.position(0), (1, 1));
        assert_eq!(sf.position(1), (1, 2));
        assert_eq!(sf.position(3), (2, 1));
        assert_eq!(sf.position(6), (3, 1));
        assert_eq!(sf.position(7), (4, 1));
        // Past the end clamps to the last position.
        assert_eq!(sf.position(999), (4, 3));
    }

    #[test]
    fn span_display() {
        assert_eq!(format!("{}", Span::new(4, 7, 4, 9)), "4:7");
    }

    #[test]
    fn span_json_round_trip() {
        let span = Span::new(2, 3, 4, 5);
        let json = serde_json::to_string(&span).unwrap();
        assert!(json.contains("\"start_line\":2"));
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }
}
