//! Byte ranges into a schema source file.

use std::ops::Range;

/// A half-open byte range `start..end` inside a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Create a zero or one character span at `offset`, clamped to `text`.
    ///
    /// YAML errors only report a position, so the span covers the character
    /// at that position when there is one.
    pub fn at(offset: usize, text: &str) -> Self {
        let mut start = offset.min(text.len());
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let end = text[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8());
        Self { start, end }
    }

    /// Start offset.
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(3..9);
        assert_eq!(span.start(), 3);
        assert_eq!(span.end(), 9);
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn test_span_at_clamps_to_text() {
        let text = "abc";
        assert_eq!(Span::at(1, text), Span::new(1..2));
        assert!(Span::at(10, text).is_empty());
        assert_eq!(Span::at(10, text).start(), 3);
    }

    #[test]
    fn test_span_at_multibyte() {
        let text = "aé";
        assert_eq!(Span::at(1, text).len(), 2);
    }
}
