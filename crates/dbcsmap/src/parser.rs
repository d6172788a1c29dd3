//! Mapping table tokenizer and streaming record parser.
//!
//! Each line of a mapping table is blank, a `#` comment, or a data line:
//!
//! ```text
//! 0x8140 U+3000 # IDEOGRAPHIC SPACE
//! 0x829F U+3042+3099 # composed kana
//! ```
//!
//! [`tokenize_line`] classifies a single line; [`MappingParser`] drives it over
//! any [`BufRead`] in one forward pass, yielding one [`MappingEntry`] per data
//! line and reporting malformed data lines instead of dropping them.

use std::io::BufRead;

use crate::error::{MapError, Result};
use crate::mapping::MappingEntry;

/// Result of tokenizing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// Empty or whitespace-only line.
    Blank,
    /// Line whose first non-whitespace character is `#`.
    Comment,
    /// A well-formed data line. The entry's `line` field is left at 0.
    Record(MappingEntry),
}

/// Tokenize a single line (without its line terminator).
///
/// # Errors
///
/// Returns a short description of the first grammar violation for lines that
/// are neither blank, comments, nor well-formed data lines.
pub fn tokenize_line(text: &str) -> std::result::Result<Line, &'static str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Line::Blank);
    }
    if trimmed.starts_with('#') {
        return Ok(Line::Comment);
    }

    let mut cur = Cursor::new(trimmed.as_bytes());

    if !cur.eat(b"0x") {
        return Err("expected `0x` byte sequence");
    }
    let byte_seq = match cur.hex_run() {
        digits if digits.len() == 2 || digits.len() == 4 => hex_value(digits) as u16,
        _ => return Err("byte sequence must have 2 or 4 hex digits"),
    };

    if cur.skip_whitespace() == 0 {
        return Err("expected whitespace after byte sequence");
    }
    if !cur.eat(b"U+") {
        return Err("expected `U+` code point");
    }
    let primary = code_point(&mut cur).ok_or("code point must have 1 to 6 hex digits")?;
    let secondary = if cur.eat(b"+") {
        Some(code_point(&mut cur).ok_or("secondary code point must have 1 to 6 hex digits")?)
    } else {
        None
    };

    if cur.skip_whitespace() == 0 {
        return Err(if cur.at_end() {
            "missing trailing `#` comment"
        } else {
            "unexpected character after code point"
        });
    }
    if !cur.eat(b"#") {
        return Err("missing trailing `#` comment");
    }

    Ok(Line::Record(MappingEntry {
        line: 0,
        byte_seq,
        primary,
        secondary,
    }))
}

fn code_point(cur: &mut Cursor<'_>) -> Option<u32> {
    let digits = cur.hex_run();
    (1..=6).contains(&digits.len()).then(|| hex_value(digits))
}

/// Value of at most eight ASCII hex digits.
fn hex_value(digits: &[u8]) -> u32 {
    digits.iter().fold(0, |acc, &d| {
        let nibble = match d {
            b'0'..=b'9' => d - b'0',
            b'a'..=b'f' => d - b'a' + 10,
            _ => d - b'A' + 10,
        };
        (acc << 4) | u32::from(nibble)
    })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, prefix: &[u8]) -> bool {
        if self.bytes[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn hex_run(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_hexdigit() {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }
}

/// Single-pass iterator over the data records of a mapping table.
///
/// Blank and comment lines are consumed silently. A malformed data line
/// yields [`MapError::MalformedRecord`]; iteration may continue past it. An
/// I/O error is yielded once and ends the iteration.
pub struct MappingParser<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    done: bool,
}

impl<R: BufRead> MappingParser<R> {
    /// Wrap a buffered reader positioned at the start of the table.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            done: false,
        }
    }

    /// 1-based number of the last line read (0 before the first read).
    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for MappingParser<R> {
    type Item = Result<MappingEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(MapError::Io(e)));
                }
            }
            self.line += 1;

            // Commentary in legacy tables is not always UTF-8.
            let text = String::from_utf8_lossy(&self.buf);
            let text = text.trim_end_matches(['\n', '\r']);
            match tokenize_line(text) {
                Ok(Line::Blank | Line::Comment) => continue,
                Ok(Line::Record(entry)) => return Some(Ok(entry.at_line(self.line))),
                Err(reason) => {
                    return Some(Err(MapError::MalformedRecord {
                        line: self.line,
                        content: text.to_string(),
                        reason,
                    }));
                }
            }
        }
    }
}
