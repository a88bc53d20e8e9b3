//! Source positions for tokens, nodes and diagnostics.
//!
//! A `SourceSpan` records both line and byte-offset bounds so that error
//! messages can name the line while tooling can recover exact ranges.

use crate::intern::InternedString;
use std::fmt;
use std::ops::Range;

/// A byte offset from the start of the source.
pub type TextPos = u32;

/// A region of one source file.
///
/// Lines are 0-based; offsets are byte offsets with an exclusive end.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SourceSpan {
    /// The interned file name.
    pub file: InternedString,
    /// Line containing the first byte.
    pub start_line: u32,
    /// Line containing the last byte.
    pub end_line: u32,
    /// Offset of the first byte.
    pub start_offset: TextPos,
    /// Offset one past the last byte.
    pub end_offset: TextPos,
}

impl SourceSpan {
    /// Create a new span.
    #[inline]
    pub fn new(
        file: InternedString,
        start_line: u32,
        end_line: u32,
        start_offset: TextPos,
        end_offset: TextPos,
    ) -> Self {
        debug_assert!(end_offset >= start_offset);
        Self {
            file,
            start_line,
            end_line,
            start_offset,
            end_offset,
        }
    }

    /// An empty span at a position.
    #[inline]
    pub fn empty(file: InternedString, line: u32, pos: TextPos) -> Self {
        Self::new(file, line, line, pos, pos)
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextPos {
        self.end_offset - self.start_offset
    }

    /// Whether this span is empty (zero-length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// Whether this span contains the given offset.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start_offset && pos < self.end_offset
    }

    /// Convert to a byte range.
    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start_offset as usize..self.end_offset as usize
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// The result does not depend on argument order.
    pub fn union(&self, other: &SourceSpan) -> SourceSpan {
        SourceSpan {
            file: self.file.min(other.file),
            start_line: self.start_line.min(other.start_line),
            end_line: self.end_line.max(other.end_line),
            start_offset: self.start_offset.min(other.start_offset),
            end_offset: self.end_offset.max(other.end_offset),
        }
    }
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}:{}",
            self.start_line, self.start_offset, self.end_line, self.end_offset
        )
    }
}

/// A map from byte offsets to line numbers, built from source text.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offsets of the start of each line.
    line_starts: Vec<TextPos>,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Get the line number (0-based) for a byte offset.
    pub fn line_of(&self, pos: TextPos) -> u32 {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line as u32,
            Err(line) => (line - 1) as u32,
        }
    }

    /// Get the byte offset of the start of a line, if the line exists.
    pub fn line_start(&self, line: u32) -> Option<TextPos> {
        self.line_starts.get(line as usize).copied()
    }

    /// The byte range of `line` within `text`, without its newline.
    pub fn line_range(&self, text: &str, line: u32) -> Option<Range<usize>> {
        let start = self.line_start(line)? as usize;
        let end = match self.line_start(line + 1) {
            Some(next) => next as usize - 1,
            None => text.len(),
        };
        Some(start..end.max(start))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
