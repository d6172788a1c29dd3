//! Binary table format reader.
//!
//! Parses a blob produced by [`encode`](crate::encode) back into lookup
//! structures. The size header is checked against the bytes actually received
//! before any section is parsed, so a truncated blob is rejected up front.

use crate::encoder::{
    HEADER_SIZE, TAG_COMPOSITE, TAG_DOUBLEBYTE1, TAG_DOUBLEBYTE2, TAG_INDEXC2B, TAG_SINGLEBYTE,
    TAG_SIZE, TAG_SUPPLEMENT,
};
use crate::error::{MapError, Result};
use crate::mapping::UNMAPPABLE;
use crate::options::{ByteRange, DbcsLayout};

/// Result of looking up a byte sequence in a compiled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No mapping.
    Unmappable,
    /// Decodes to one code point.
    Single(u32),
    /// Decodes to a two-code-point sequence.
    Pair(u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DenseBand {
    lead: ByteRange,
    trail: ByteRange,
    values: Vec<u32>,
}

impl DenseBand {
    fn get(&self, byte_seq: u16) -> Option<u32> {
        let [b1, b2] = byte_seq.to_be_bytes();
        if !self.lead.contains(b1) || !self.trail.contains(b2) {
            return None;
        }
        let row = usize::from(b1 - self.lead.low);
        let col = usize::from(b2 - self.trail.low);
        self.values.get(row * self.trail.len() + col).copied()
    }
}

/// A parsed table blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableImage {
    index: [bool; 256],
    single: [u32; 256],
    bands: [DenseBand; 2],
    supplement: Vec<(u16, u32)>,
    composite: Vec<(u16, u32, u32)>,
}

impl TableImage {
    /// Parse and validate a complete blob, size header included.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidTable`] if the blob is truncated, has trailing
    /// bytes, or a section tag, count or range is inconsistent.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(invalid(format!(
                "blob is {} bytes, shorter than the {HEADER_SIZE}-byte size header",
                data.len()
            )));
        }
        let mut r = ByteReader::new(data);
        r.expect_tag(TAG_SIZE, "SIZE")?;
        let declared = r.u32("SIZE")? as usize;
        if declared != r.remaining() {
            return Err(invalid(format!(
                "size header declares {declared} payload bytes, received {}",
                r.remaining()
            )));
        }

        r.expect_tag(TAG_INDEXC2B, "INDEXC2B")?;
        r.expect_u16_count(256, "INDEXC2B")?;
        let mut index = [false; 256];
        for (slot, &flag) in index.iter_mut().zip(r.take(256, "INDEXC2B")?) {
            *slot = flag != 0;
        }

        r.expect_tag(TAG_SINGLEBYTE, "SINGLEBYTE")?;
        r.expect_u16_count(256, "SINGLEBYTE")?;
        let mut single = [UNMAPPABLE; 256];
        for slot in single.iter_mut() {
            *slot = r.u32("SINGLEBYTE")?;
        }

        let first = read_band(&mut r, TAG_DOUBLEBYTE1, "DOUBLEBYTE1")?;
        let second = read_band(&mut r, TAG_DOUBLEBYTE2, "DOUBLEBYTE2")?;

        r.expect_tag(TAG_SUPPLEMENT, "SUPPLEMENT")?;
        let count = r.u32("SUPPLEMENT")? as usize;
        r.ensure(count, 6, "SUPPLEMENT")?;
        let mut supplement = Vec::with_capacity(count);
        for _ in 0..count {
            supplement.push((r.u16("SUPPLEMENT")?, r.u32("SUPPLEMENT")?));
        }

        r.expect_tag(TAG_COMPOSITE, "COMPOSITE")?;
        let count = r.u32("COMPOSITE")? as usize;
        r.ensure(count, 10, "COMPOSITE")?;
        let mut composite = Vec::with_capacity(count);
        for _ in 0..count {
            composite.push((
                r.u16("COMPOSITE")?,
                r.u32("COMPOSITE")?,
                r.u32("COMPOSITE")?,
            ));
        }

        if r.remaining() != 0 {
            return Err(invalid(format!(
                "{} trailing bytes after COMPOSITE section",
                r.remaining()
            )));
        }

        Ok(Self {
            index,
            single,
            bands: [first, second],
            supplement,
            composite,
        })
    }

    /// Decode a byte sequence (`0x00..=0xFF` single byte, otherwise a
    /// big-endian pair).
    ///
    /// Dense tables are consulted first, then the supplement and composite
    /// lists. Within a list the last entry for a byte sequence wins.
    pub fn lookup(&self, byte_seq: u16) -> Lookup {
        if let Some(code_point) = self.dense(byte_seq) {
            return Lookup::Single(code_point);
        }
        if let Some(&(_, code_point)) = self.supplement.iter().rev().find(|e| e.0 == byte_seq) {
            return Lookup::Single(code_point);
        }
        if let Some(&(_, primary, secondary)) =
            self.composite.iter().rev().find(|e| e.0 == byte_seq)
        {
            return Lookup::Pair(primary, secondary);
        }
        Lookup::Unmappable
    }

    /// Dense-table value for `byte_seq`, or `None` if the slot is unmapped or
    /// outside every band.
    pub fn dense(&self, byte_seq: u16) -> Option<u32> {
        let value = match u8::try_from(byte_seq) {
            Ok(byte) => self.single[usize::from(byte)],
            Err(_) => self
                .bands
                .iter()
                .find_map(|band| band.get(byte_seq))
                .unwrap_or(UNMAPPABLE),
        };
        (value != UNMAPPABLE).then_some(value)
    }

    /// Whether the presence index marks code-point block `high`.
    pub fn index_contains(&self, high: u8) -> bool {
        self.index[usize::from(high)]
    }

    /// Number of marked blocks in the presence index.
    pub fn index_count(&self) -> usize {
        self.index.iter().filter(|&&p| p).count()
    }

    /// Byte-range layout recorded in the double-byte section headers.
    pub fn layout(&self) -> DbcsLayout {
        DbcsLayout {
            lead1: self.bands[0].lead,
            lead2: self.bands[1].lead,
            trail: self.bands[0].trail,
        }
    }

    /// Supplement entries `(byte_seq, code_point)` in file order.
    pub fn supplement(&self) -> &[(u16, u32)] {
        &self.supplement
    }

    /// Composite entries `(byte_seq, primary, secondary)` in file order.
    pub fn composite(&self) -> &[(u16, u32, u32)] {
        &self.composite
    }
}

fn read_band(r: &mut ByteReader<'_>, tag: u16, name: &'static str) -> Result<DenseBand> {
    r.expect_tag(tag, name)?;
    let bounds = r.take(4, name)?;
    let lead = ByteRange::new(bounds[0], bounds[1]);
    let trail = ByteRange::new(bounds[2], bounds[3]);
    if lead.is_empty() || trail.is_empty() {
        return Err(invalid(format!("{name} has an inverted byte range")));
    }
    let count = r.u32(name)? as usize;
    let expected = lead.len() * trail.len();
    if count != expected {
        return Err(invalid(format!(
            "{name} declares {count} slots, its ranges span {expected}"
        )));
    }
    r.ensure(count, 4, name)?;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(r.u32(name)?);
    }
    Ok(DenseBand {
        lead,
        trail,
        values,
    })
}

fn invalid(msg: String) -> MapError {
    MapError::InvalidTable(msg)
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, section: &str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(invalid(format!(
                "{section} truncated at offset {}: need {n} bytes, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Fail early when `count` records of `width` bytes cannot fit.
    fn ensure(&self, count: usize, width: usize, section: &str) -> Result<()> {
        match count.checked_mul(width) {
            Some(n) if n <= self.remaining() => Ok(()),
            _ => Err(invalid(format!(
                "{section} declares {count} entries, only {} bytes left",
                self.remaining()
            ))),
        }
    }

    fn u16(&mut self, section: &str) -> Result<u16> {
        let b = self.take(2, section)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, section: &str) -> Result<u32> {
        let b = self.take(4, section)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn expect_tag(&mut self, tag: u16, section: &str) -> Result<()> {
        let at = self.pos;
        let found = self.u16(section)?;
        if found != tag {
            return Err(invalid(format!(
                "expected {section} tag {tag} at offset {at}, found {found}"
            )));
        }
        Ok(())
    }

    fn expect_u16_count(&mut self, count: u16, section: &str) -> Result<()> {
        let found = self.u16(section)?;
        if found != count {
            return Err(invalid(format!(
                "{section} declares {found} slots, expected {count}"
            )));
        }
        Ok(())
    }
}
