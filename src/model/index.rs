//! Text positions.

use std::fmt;

/// A position in the document: logical line plus byte offset in that line.
///
/// Embedded objects and hyphens occupy one byte, marks occupy none, and the
/// newline ending each logical line occupies the final byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextIndex {
    /// Zero-based logical line number.
    pub line: usize,
    /// Byte offset within the line.
    pub byte: usize,
}

impl TextIndex {
    /// Creates an index.
    pub const fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }

    /// Index of the first byte of `line`.
    pub const fn line_start(line: usize) -> Self {
        Self { line, byte: 0 }
    }

    /// Same line, different byte offset.
    pub const fn with_byte(self, byte: usize) -> Self {
        Self {
            line: self.line,
            byte,
        }
    }
}

/// Formats as `line.byte` with one-based lines, e.g. `1.0` for the start.
impl fmt::Display for TextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line + 1, self.byte)
    }
}
