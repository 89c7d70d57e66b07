//! Source positions and ranges.
//!
//! Tree-sitter positions are zero-based. Everything exposed from this crate
//! uses one-based line and column numbers alongside the byte offset they
//! were derived from.

use serde::Serialize;

/// A location in a source file.
///
/// `line` and `column` are one-based; `column` counts bytes within the line.
/// Both are a projection of `byte_offset` and always agree with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
    /// Byte offset from the start of the source.
    pub byte_offset: usize,
}

impl Position {
    /// Creates a position from one-based coordinates and a byte offset.
    #[must_use]
    pub const fn new(line: u32, column: u32, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    pub(crate) fn from_point(point: tree_sitter::Point, byte_offset: usize) -> Self {
        let (line, column) = point_to_one_based(point);
        Self::new(line, column, byte_offset)
    }

    /// Computes the position just past the end of `source`.
    pub(crate) fn end_of(source: &str) -> Self {
        let row = source.bytes().filter(|byte| *byte == b'\n').count();
        let column = source
            .rfind('\n')
            .map_or(source.len(), |newline| source.len() - newline - 1);
        Self::from_point(tree_sitter::Point { row, column }, source.len())
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Range {
    /// Creates a range, ordering the endpoints by byte offset.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        if start.byte_offset <= end.byte_offset {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Returns the byte range covered by this span.
    #[must_use]
    pub const fn byte_range(&self) -> std::ops::Range<usize> {
        self.start.byte_offset..self.end.byte_offset
    }
}

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}
