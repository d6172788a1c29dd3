//! Error types for the table compiler.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Every failure in the
//! pipeline surfaces as a [`MapError`]; nothing is swallowed below the driver.

use thiserror::Error;

/// Error type for parsing, classifying, encoding and reading mapping tables.
#[derive(Debug, Error)]
pub enum MapError {
    /// Input unreadable or output unwritable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data line does not match the mapping record grammar.
    #[error("line {line}: malformed mapping record ({reason}): {content:?}")]
    MalformedRecord {
        /// 1-based line number in the source table.
        line: usize,
        /// The offending line, without its line terminator.
        content: String,
        /// Which part of the grammar failed.
        reason: &'static str,
    },

    /// A double-byte sequence falls outside every configured lead/trail band.
    #[error("line {line}: byte sequence {byte_seq:#06X} is outside the configured double-byte bands")]
    OutOfBand {
        /// 1-based line number in the source table.
        line: usize,
        /// The rejected byte sequence.
        byte_seq: u16,
    },

    /// A count or length does not fit its fixed-width wire field.
    #[error("{section} section overflow: {count} does not fit its length field")]
    Overflow {
        /// Name of the section being written (e.g. `"SUPPLEMENT"`).
        section: &'static str,
        /// The count or byte length that overflowed.
        count: usize,
    },

    /// The byte-range layout is inconsistent.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// A compiled table blob is truncated or structurally invalid.
    #[error("invalid table: {0}")]
    InvalidTable(String),
}

/// A convenience `Result` alias using [`MapError`].
pub type Result<T> = std::result::Result<T, MapError>;
