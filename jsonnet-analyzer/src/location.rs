//! Position and range arithmetic on LSP coordinates.
//!
//! Tree-sitter reports byte offsets; LSP wants 0-based lines and UTF-16 code
//! units. [`LineIndex`] does the conversion once per document build, so every
//! AST node carries a ready-made [`Range`] afterwards. Ranges are half-open
//! at the end position.

use lsp_types::{Location, Position, Range, Url};

/// Byte-offset → LSP position conversion table for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the first character of each line (line 0 starts at 0).
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// The line containing `offset` (clamped to the last line).
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// Convert a byte offset into a 0-based (line, UTF-16 column) position.
    ///
    /// Offsets past the end of `text` clamp to the end; offsets inside a
    /// multi-byte character round down to its start.
    pub fn position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line = self.line_of(offset);
        let line_start = self.line_starts[line];

        // Sum UTF-16 lengths of the characters between the line start and the
        // target offset.
        let mut character = 0u32;
        for c in text[line_start..offset].chars() {
            character += c.len_utf16() as u32;
        }

        Position::new(line as u32, character)
    }

    /// Convert a byte range into an LSP [`Range`].
    pub fn range(&self, text: &str, bytes: std::ops::Range<usize>) -> Range {
        Range::new(
            self.position(text, bytes.start),
            self.position(text, bytes.end),
        )
    }

    /// Convert an LSP position back into a byte offset (for tests and the
    /// CLI printers). Positions past the end of a line clamp to the line end.
    pub fn offset(&self, text: &str, pos: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(pos.line as usize) else {
            return text.len();
        };
        let line_end = self
            .line_starts
            .get(pos.line as usize + 1)
            .copied()
            .unwrap_or(text.len());

        let mut offset = line_start;
        let mut remaining = pos.character;
        for c in text[line_start..line_end].chars() {
            if remaining == 0 || c == '\n' {
                break;
            }
            let units = c.len_utf16() as u32;
            if units > remaining {
                break;
            }
            remaining -= units;
            offset += c.len_utf8();
        }
        offset
    }
}

/// `outer` spatially contains `inner` (both half-open).
pub fn range_contains(outer: &Range, inner: &Range) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// A range containing a single position (an empty selection).
pub fn point_range(pos: Position) -> Range {
    Range::new(pos, pos)
}

/// Span from the start of `lhs` to the end of `rhs`.
pub fn merge_ranges(lhs: Range, rhs: Range) -> Range {
    debug_assert!(lhs.start <= rhs.end);
    Range::new(lhs.start, rhs.end)
}

/// Span two locations in the same document.
pub fn merge_locations(lhs: &Location, rhs: &Location) -> Location {
    debug_assert_eq!(
        lhs.uri, rhs.uri,
        "cannot merge locations from different documents"
    );
    Location::new(lhs.uri.clone(), merge_ranges(lhs.range, rhs.range))
}

/// Deterministic ordering for provider output: by URI, then start, then end.
pub fn compare_locations(a: &Location, b: &Location) -> std::cmp::Ordering {
    a.uri
        .as_str()
        .cmp(b.uri.as_str())
        .then(a.range.start.cmp(&b.range.start))
        .then(a.range.end.cmp(&b.range.end))
}

/// File path → `file://` URI. `None` for paths `Url` refuses (relative).
pub fn uri_from_path(path: &std::path::Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// `file://` URI → file path. `None` for non-file schemes.
pub fn path_from_uri(uri: &Url) -> Option<std::path::PathBuf> {
    uri.to_file_path().ok()
}
