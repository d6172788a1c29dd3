//! Mapping records and the shared unmappable sentinel.

/// Sentinel stored in dense table slots that have no mapping.
///
/// Lies outside the Unicode range and outside anything the six-digit `U+`
/// syntax can express, so it never collides with a real code point. Every
/// reader and writer of the single- and double-byte tables uses this constant.
pub const UNMAPPABLE: u32 = 0xFFFF_FFFF;

/// Largest code point that still fits the dense (BMP) tables.
pub const MAX_DENSE_CODE_POINT: u32 = 0xFFFF;

/// One `byte sequence ↔ code point(s)` correspondence from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    /// 1-based line number in the source table (provenance only).
    pub line: usize,
    /// The byte sequence: one byte (`0x00..=0xFF`) or a big-endian pair.
    pub byte_seq: u16,
    /// The (first) code point the sequence decodes to.
    pub primary: u32,
    /// Second code point for composite (two-code-point) mappings.
    pub secondary: Option<u32>,
}

/// Which logical table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Fits the dense single- or double-byte tables.
    Dense,
    /// Primary code point beyond the BMP.
    Supplement,
    /// Decodes to a two-code-point sequence.
    Composite,
}

impl MappingEntry {
    /// A simple one-code-point mapping.
    pub fn new(byte_seq: u16, primary: u32) -> Self {
        Self {
            line: 0,
            byte_seq,
            primary,
            secondary: None,
        }
    }

    /// A composite mapping decoding to `primary` followed by `secondary`.
    pub fn composite(byte_seq: u16, primary: u32, secondary: u32) -> Self {
        Self {
            line: 0,
            byte_seq,
            primary,
            secondary: Some(secondary),
        }
    }

    /// Attach the source line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Whether the byte sequence is a single byte.
    pub fn is_single_byte(&self) -> bool {
        self.byte_seq <= 0xFF
    }

    /// Classify this record.
    ///
    /// A secondary code point makes the record composite regardless of the
    /// primary's magnitude; otherwise anything above the BMP is a supplement.
    pub fn kind(&self) -> EntryKind {
        if self.secondary.is_some() {
            EntryKind::Composite
        } else if self.primary > MAX_DENSE_CODE_POINT {
            EntryKind::Supplement
        } else {
            EntryKind::Dense
        }
    }
}
