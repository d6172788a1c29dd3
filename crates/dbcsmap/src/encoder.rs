//! Binary table format writer.
//!
//! ## Blob Layout
//!
//! ```text
//! [SIZE header] [INDEXC2B] [SINGLEBYTE] [DOUBLEBYTE1] [DOUBLEBYTE2] [SUPPLEMENT] [COMPOSITE]
//! ```
//!
//! Every integer is big-endian. Sections appear exactly once, in this order.
//!
//! | Section     | Tag  | Layout after the `tag:u16`                                        |
//! |-------------|------|-------------------------------------------------------------------|
//! | SIZE        | `8`  | `payload_len:u32` (bytes after this 6-byte header)                |
//! | INDEXC2B    | `1`  | `count:u16` (=256) + 256 × `u8` (0 absent, 1 present)             |
//! | SINGLEBYTE  | `2`  | `count:u16` (=256) + 256 × `u32`                                  |
//! | DOUBLEBYTE1 | `3`  | `lead_lo:u8 lead_hi:u8 trail_lo:u8 trail_hi:u8 count:u32` + count × `u32` |
//! | DOUBLEBYTE2 | `4`  | same as DOUBLEBYTE1, for the second lead band                     |
//! | SUPPLEMENT  | `6`  | `count:u32` + count × (`byte_seq:u16 code_point:u32`)             |
//! | COMPOSITE   | `7`  | `count:u32` + count × (`byte_seq:u16 primary:u32 secondary:u32`)  |
//!
//! Dense values equal to [`UNMAPPABLE`](crate::UNMAPPABLE) (`0xFFFFFFFF`)
//! mark unmapped slots. Double-byte sections are lead-major: the slot for
//! `(lead, trail)` is at `(lead - lead_lo) * (trail_hi - trail_lo + 1) + (trail - trail_lo)`.

use tracing::debug;

use crate::error::{MapError, Result};
use crate::mapping::MappingEntry;
use crate::options::{Band, DbcsLayout};
use crate::tables::{DoubleByteTable, EncodeIndex, MappingTables, SingleByteTable};

/// Presence index section tag.
pub const TAG_INDEXC2B: u16 = 1;
/// Single-byte table section tag.
pub const TAG_SINGLEBYTE: u16 = 2;
/// First double-byte band section tag.
pub const TAG_DOUBLEBYTE1: u16 = 3;
/// Second double-byte band section tag.
pub const TAG_DOUBLEBYTE2: u16 = 4;
/// Supplementary list section tag.
pub const TAG_SUPPLEMENT: u16 = 6;
/// Composite list section tag.
pub const TAG_COMPOSITE: u16 = 7;
/// Size header tag.
pub const TAG_SIZE: u16 = 8;

/// Size of the `SIZE` header (tag + length).
pub const HEADER_SIZE: usize = 2 + 4;

/// Encode populated tables into a complete blob, size header included.
///
/// The layout is validated first; output is a pure function of the inputs.
///
/// # Errors
///
/// [`MapError::InvalidLayout`] for an inconsistent layout,
/// [`MapError::Overflow`] when a list count or the payload length does not
/// fit its field.
pub fn encode(tables: &MappingTables, layout: &DbcsLayout) -> Result<Vec<u8>> {
    layout.validate()?;

    let mut payload = Vec::with_capacity(payload_capacity(tables, layout));
    write_index_c2b(&tables.index, &mut payload);
    write_single_byte(&tables.single, &mut payload);
    write_double_byte(&tables.double, layout, Band::First, &mut payload)?;
    write_double_byte(&tables.double, layout, Band::Second, &mut payload)?;
    write_supplement(&tables.supplement, &mut payload)?;
    write_composite(&tables.composite, &mut payload)?;

    let mut blob = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_size(payload.len(), &mut blob)?;
    blob.extend_from_slice(&payload);
    Ok(blob)
}

fn payload_capacity(tables: &MappingTables, layout: &DbcsLayout) -> usize {
    (2 + 2 + 256)
        + (2 + 2 + 256 * 4)
        + 2 * (2 + 4 + 4)
        + 4 * (layout.band_slots(Band::First) + layout.band_slots(Band::Second))
        + (2 + 4 + tables.supplement.len() * 6)
        + (2 + 4 + tables.composite.len() * 10)
}

/// Write the `SIZE` header for a payload of `payload_len` bytes.
pub fn write_size(payload_len: usize, out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(&TAG_SIZE.to_be_bytes());
    out.extend_from_slice(&count_u32("SIZE", payload_len)?.to_be_bytes());
    Ok(())
}

/// Write the `INDEXC2B` section.
pub fn write_index_c2b(index: &EncodeIndex, out: &mut Vec<u8>) {
    out.extend_from_slice(&TAG_INDEXC2B.to_be_bytes());
    out.extend_from_slice(&256u16.to_be_bytes());
    out.extend(index.flags().iter().map(|&present| u8::from(present)));
    debug!(marked = index.count(), "wrote INDEXC2B");
}

/// Write the `SINGLEBYTE` section.
pub fn write_single_byte(table: &SingleByteTable, out: &mut Vec<u8>) {
    out.extend_from_slice(&TAG_SINGLEBYTE.to_be_bytes());
    out.extend_from_slice(&256u16.to_be_bytes());
    for value in table.slots() {
        out.extend_from_slice(&value.to_be_bytes());
    }
    debug!("wrote SINGLEBYTE");
}

/// Write the `DOUBLEBYTE1` or `DOUBLEBYTE2` section for `band`.
pub fn write_double_byte(
    table: &DoubleByteTable,
    layout: &DbcsLayout,
    band: Band,
    out: &mut Vec<u8>,
) -> Result<()> {
    let (tag, name) = match band {
        Band::First => (TAG_DOUBLEBYTE1, "DOUBLEBYTE1"),
        Band::Second => (TAG_DOUBLEBYTE2, "DOUBLEBYTE2"),
    };
    let lead = layout.lead(band);
    let trail = layout.trail;

    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&[lead.low, lead.high, trail.low, trail.high]);
    out.extend_from_slice(&count_u32(name, layout.band_slots(band))?.to_be_bytes());
    for b1 in lead.low..=lead.high {
        for b2 in trail.low..=trail.high {
            let value = table.get(u16::from_be_bytes([b1, b2]));
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
    debug!(
        section = name,
        slots = layout.band_slots(band),
        "wrote double-byte band"
    );
    Ok(())
}

/// Write the `SUPPLEMENT` section.
pub fn write_supplement(entries: &[MappingEntry], out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(&TAG_SUPPLEMENT.to_be_bytes());
    out.extend_from_slice(&count_u32("SUPPLEMENT", entries.len())?.to_be_bytes());
    for e in entries {
        out.extend_from_slice(&e.byte_seq.to_be_bytes());
        out.extend_from_slice(&e.primary.to_be_bytes());
    }
    debug!(entries = entries.len(), "wrote SUPPLEMENT");
    Ok(())
}

/// Write the `COMPOSITE` section.
///
/// # Errors
///
/// [`MapError::InvalidTable`] if an entry has no secondary code point;
/// nothing is appended to `out` in that case.
pub fn write_composite(entries: &[MappingEntry], out: &mut Vec<u8>) -> Result<()> {
    if let Some(e) = entries.iter().find(|e| e.secondary.is_none()) {
        return Err(MapError::InvalidTable(format!(
            "composite entry for {:#06X} has no secondary code point",
            e.byte_seq
        )));
    }
    out.extend_from_slice(&TAG_COMPOSITE.to_be_bytes());
    out.extend_from_slice(&count_u32("COMPOSITE", entries.len())?.to_be_bytes());
    for e in entries {
        out.extend_from_slice(&e.byte_seq.to_be_bytes());
        out.extend_from_slice(&e.primary.to_be_bytes());
        if let Some(secondary) = e.secondary {
            out.extend_from_slice(&secondary.to_be_bytes());
        }
    }
    debug!(entries = entries.len(), "wrote COMPOSITE");
    Ok(())
}

fn count_u32(section: &'static str, count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| MapError::Overflow { section, count })
}
