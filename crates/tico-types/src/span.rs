use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a tab character when computing columns.
pub const TAB_WIDTH: u32 = 4;

/// Source location: a byte range plus the line/column of its first byte.
///
/// Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte.
    pub start: usize,
    /// Byte offset one past the last byte.
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at a single position.
    pub fn point(offset: usize, line: u32, column: u32) -> Self {
        Self::new(offset, offset, line, column)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source text with a line index, used for positions and error context.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub source: String,
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset. Tabs advance the column
    /// by [`TAB_WIDTH`].
    pub fn location(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[idx];
        let column = self.source[line_start..offset]
            .chars()
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum::<u32>()
            + 1;
        (idx as u32 + 1, column)
    }

    /// Span for the byte range `start..end`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.location(start);
        Span::new(start, end, line, column)
    }

    /// Text of a 1-based line without its terminator, or `None` when out of
    /// range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s - 1)
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_earliest_start() {
        let a = Span::new(10, 14, 2, 3);
        let b = Span::new(2, 5, 1, 3);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(2, 14, 1, 3));
        assert_eq!(b.merge(a), merged);
    }

    #[test]
    fn location_counts_tabs() {
        let src = SourceFile::new("a = 1\n\tb = 2");
        assert_eq!(src.location(0), (1, 1));
        assert_eq!(src.location(4), (1, 5));
        assert_eq!(src.location(6), (2, 1));
        assert_eq!(src.location(7), (2, 5));
    }

    #[test]
    fn location_at_end_of_input() {
        let src = SourceFile::new("x\n");
        assert_eq!(src.location(2), (2, 1));
        assert_eq!(src.location(99), (2, 1));
    }

    #[test]
    fn line_extraction() {
        let src = SourceFile::new("one\r\ntwo\nthree");
        assert_eq!(src.line(1), Some("one"));
        assert_eq!(src.line(2), Some("two"));
        assert_eq!(src.line(3), Some("three"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn display_is_line_and_column() {
        assert_eq!(Span::new(0, 3, 7, 2).to_string(), "7:2");
    }
}
