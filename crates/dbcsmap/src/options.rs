//! Generation options: byte-range layout and error policies.
//!
//! [`GenerateOptions::default()`] reproduces the Shift_JIS / JIS X 0213 layout
//! with strict error handling. Callers that compile other double-byte tables
//! supply their own [`DbcsLayout`].

use crate::error::{MapError, Result};

/// An inclusive range of byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Lowest byte in the range.
    pub low: u8,
    /// Highest byte in the range.
    pub high: u8,
}

impl ByteRange {
    /// Create a range covering `low..=high`.
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Whether `byte` falls inside the range.
    pub fn contains(&self, byte: u8) -> bool {
        (self.low..=self.high).contains(&byte)
    }

    /// Number of byte values in the range.
    pub fn len(&self) -> usize {
        (usize::from(self.high) + 1).saturating_sub(usize::from(self.low))
    }

    /// True only for an inverted range.
    pub fn is_empty(&self) -> bool {
        self.high < self.low
    }

    fn overlaps(&self, other: &ByteRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// Identifies one of the two lead-byte bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// First lead-byte band (`DOUBLEBYTE1` section).
    First,
    /// Second lead-byte band (`DOUBLEBYTE2` section).
    Second,
}

/// Lead- and trail-byte ranges of a two-band double-byte charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbcsLayout {
    /// Lead bytes of the first band.
    pub lead1: ByteRange,
    /// Lead bytes of the second band.
    pub lead2: ByteRange,
    /// Trail bytes, shared by both bands.
    pub trail: ByteRange,
}

impl DbcsLayout {
    /// Shift_JIS (and JIS X 0213 plane mapping) layout.
    pub const SHIFT_JIS: DbcsLayout = DbcsLayout {
        lead1: ByteRange::new(0x81, 0x9F),
        lead2: ByteRange::new(0xE0, 0xFC),
        trail: ByteRange::new(0x40, 0xFE),
    };

    /// Check that every range is ordered and the lead bands are disjoint.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("lead1", self.lead1),
            ("lead2", self.lead2),
            ("trail", self.trail),
        ] {
            if range.is_empty() {
                return Err(MapError::InvalidLayout(format!(
                    "{name} range {:#04X}..={:#04X} is inverted",
                    range.low, range.high
                )));
            }
        }
        if self.lead1.overlaps(&self.lead2) {
            return Err(MapError::InvalidLayout(format!(
                "lead bands {:#04X}..={:#04X} and {:#04X}..={:#04X} overlap",
                self.lead1.low, self.lead1.high, self.lead2.low, self.lead2.high
            )));
        }
        Ok(())
    }

    /// Lead-byte range of `band`.
    pub fn lead(&self, band: Band) -> ByteRange {
        match band {
            Band::First => self.lead1,
            Band::Second => self.lead2,
        }
    }

    /// The band a two-byte sequence belongs to, or `None` if its lead or
    /// trail byte is outside every configured range.
    pub fn band_of(&self, byte_seq: u16) -> Option<Band> {
        let [lead, trail] = byte_seq.to_be_bytes();
        if !self.trail.contains(trail) {
            return None;
        }
        if self.lead1.contains(lead) {
            Some(Band::First)
        } else if self.lead2.contains(lead) {
            Some(Band::Second)
        } else {
            None
        }
    }

    /// Number of dense slots in one band's section.
    pub fn band_slots(&self, band: Band) -> usize {
        self.lead(band).len() * self.trail.len()
    }
}

impl Default for DbcsLayout {
    fn default() -> Self {
        Self::SHIFT_JIS
    }
}

/// What to do with a double-byte record outside every band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutOfBandPolicy {
    /// Drop the record and log a warning.
    #[default]
    Ignore,
    /// Fail with [`MapError::OutOfBand`].
    Reject,
}

/// What to do with a data line that does not match the record grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Fail the run with [`MapError::MalformedRecord`].
    #[default]
    Abort,
    /// Skip the line and log a warning.
    Skip,
}

/// Options for a table generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Byte-range layout of the target charset.
    pub layout: DbcsLayout,
    /// Handling of double-byte records outside the layout.
    pub out_of_band: OutOfBandPolicy,
    /// Handling of malformed data lines.
    pub malformed: MalformedPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- ByteRange ---

    #[test]
    fn range_contains_both_ends() {
        let r = ByteRange::new(0x81, 0x9F);
        assert!(r.contains(0x81));
        assert!(r.contains(0x9F));
        assert!(!r.contains(0x80));
        assert!(!r.contains(0xA0));
        assert_eq!(r.len(), 31);
    }

    #[test]
    fn full_byte_range_len() {
        assert_eq!(ByteRange::new(0x00, 0xFF).len(), 256);
    }

    // --- DbcsLayout ---

    #[test]
    fn shift_jis_is_default_and_valid() {
        let layout = DbcsLayout::default();
        assert_eq!(layout, DbcsLayout::SHIFT_JIS);
        assert!(layout.validate().is_ok());
        assert_eq!(layout.band_slots(Band::First), 31 * 191);
        assert_eq!(layout.band_slots(Band::Second), 29 * 191);
    }

    #[test]
    fn band_of_boundaries() {
        let layout = DbcsLayout::SHIFT_JIS;
        assert_eq!(layout.band_of(0x8140), Some(Band::First));
        assert_eq!(layout.band_of(0x9FFE), Some(Band::First));
        assert_eq!(layout.band_of(0xE040), Some(Band::Second));
        assert_eq!(layout.band_of(0xFCFE), Some(Band::Second));
    }

    #[test]
    fn band_of_rejects_outside_bytes() {
        let layout = DbcsLayout::SHIFT_JIS;
        assert_eq!(layout.band_of(0x8040), None);
        assert_eq!(layout.band_of(0xA040), None);
        assert_eq!(layout.band_of(0xDF40), None);
        assert_eq!(layout.band_of(0xFD40), None);
        assert_eq!(layout.band_of(0x813F), None);
        assert_eq!(layout.band_of(0x81FF), None);
    }

    #[test]
    fn inverted_range_is_invalid() {
        let layout = DbcsLayout {
            trail: ByteRange::new(0xFE, 0x40),
            ..DbcsLayout::SHIFT_JIS
        };
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("trail"));
    }

    #[test]
    fn overlapping_lead_bands_are_invalid() {
        let layout = DbcsLayout {
            lead2: ByteRange::new(0x9F, 0xFC),
            ..DbcsLayout::SHIFT_JIS
        };
        assert!(matches!(layout.validate(), Err(MapError::InvalidLayout(_))));
    }

    // --- GenerateOptions ---

    #[test]
    fn default_options_are_strict_about_syntax() {
        let opts = GenerateOptions::default();
        assert_eq!(opts.malformed, MalformedPolicy::Abort);
        assert_eq!(opts.out_of_band, OutOfBandPolicy::Ignore);
        assert_eq!(opts.layout, DbcsLayout::SHIFT_JIS);
    }
}
