//! Logical lookup tables and the record classifier.
//!
//! A [`Classifier`] consumes [`MappingEntry`] values one at a time and routes
//! each into exactly one destination:
//!
//! - composite list, if the record has a secondary code point;
//! - supplement list, if the primary code point is beyond the BMP;
//! - the single-byte or double-byte dense table otherwise, also marking the
//!   primary's high byte in the [`EncodeIndex`].
//!
//! Records are last-write-wins per byte sequence: a later record replaces an
//! earlier one wherever that one was stored, so every byte sequence ends up in
//! at most one destination.

use tracing::{debug, warn};

use crate::error::{MapError, Result};
use crate::mapping::{EntryKind, MappingEntry, UNMAPPABLE};
use crate::options::{DbcsLayout, GenerateOptions, OutOfBandPolicy};

/// Decoded values for every single byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleByteTable {
    slots: [u32; 256],
}

impl SingleByteTable {
    /// ASCII-transparent table: `0x00..=0x7F` map to themselves, the rest are
    /// [`UNMAPPABLE`].
    pub fn new() -> Self {
        let mut slots = [UNMAPPABLE; 256];
        for (byte, slot) in slots.iter_mut().enumerate().take(0x80) {
            *slot = byte as u32;
        }
        Self { slots }
    }

    /// Decoded value for `byte`.
    pub fn get(&self, byte: u8) -> u32 {
        self.slots[usize::from(byte)]
    }

    /// Overwrite the decoded value for `byte`.
    pub fn set(&mut self, byte: u8, code_point: u32) {
        self.slots[usize::from(byte)] = code_point;
    }

    /// All 256 slots in byte order.
    pub fn slots(&self) -> &[u32; 256] {
        &self.slots
    }
}

impl Default for SingleByteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded values for every two-byte sequence, indexed by the big-endian pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleByteTable {
    slots: Box<[u32]>,
}

impl DoubleByteTable {
    /// A table with all 65536 slots [`UNMAPPABLE`].
    pub fn new() -> Self {
        Self {
            slots: vec![UNMAPPABLE; 0x1_0000].into_boxed_slice(),
        }
    }

    /// Decoded value for `byte_seq`.
    pub fn get(&self, byte_seq: u16) -> u32 {
        self.slots[usize::from(byte_seq)]
    }

    /// Overwrite the decoded value for `byte_seq`.
    pub fn set(&mut self, byte_seq: u16, code_point: u32) {
        self.slots[usize::from(byte_seq)] = code_point;
    }
}

impl Default for DoubleByteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// One presence flag per high byte of the BMP.
///
/// Set whenever a dense record maps to a code point in that 256-code-point
/// block, so an encoder can skip blocks nothing maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeIndex {
    present: [bool; 256],
}

impl EncodeIndex {
    /// An index with no block marked.
    pub fn new() -> Self {
        Self {
            present: [false; 256],
        }
    }

    /// Mark the block containing `code_point`. Only BMP code points are marked.
    pub fn mark(&mut self, code_point: u32) {
        if let Ok(high) = u8::try_from(code_point >> 8) {
            self.present[usize::from(high)] = true;
        }
    }

    /// Whether block `high` (code points `high << 8 ..= high << 8 | 0xFF`) is marked.
    pub fn contains(&self, high: u8) -> bool {
        self.present[usize::from(high)]
    }

    /// Number of marked blocks.
    pub fn count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// All 256 flags in block order.
    pub fn flags(&self) -> &[bool; 256] {
        &self.present
    }
}

impl Default for EncodeIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// The four populated structures a table blob is encoded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTables {
    /// Single-byte decode table.
    pub single: SingleByteTable,
    /// Double-byte decode table.
    pub double: DoubleByteTable,
    /// Encode-side presence index.
    pub index: EncodeIndex,
    /// Records beyond the BMP, in encounter order.
    pub supplement: Vec<MappingEntry>,
    /// Two-code-point records, in encounter order.
    pub composite: Vec<MappingEntry>,
}

impl MappingTables {
    /// Freshly initialised, empty tables.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where [`Classifier::push`] placed a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stored in the single-byte table.
    SingleByte,
    /// Stored in the double-byte table.
    DoubleByte,
    /// Appended to the supplement list.
    Supplement,
    /// Appended to the composite list.
    Composite,
    /// Dropped: double-byte sequence outside the layout.
    Ignored,
}

/// Per-destination record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Records stored in the single-byte table (overwrites included).
    pub single_byte: usize,
    /// Records stored in the double-byte table (overwrites included).
    pub double_byte: usize,
    /// Records appended to the supplement list (later replaced ones included).
    pub supplement: usize,
    /// Records appended to the composite list (later replaced ones included).
    pub composite: usize,
    /// Out-of-band records dropped.
    pub ignored: usize,
    /// Records that replaced an earlier mapping for the same byte sequence.
    pub overwritten: usize,
}

impl ClassifyStats {
    /// Total records seen.
    pub fn total(&self) -> usize {
        self.single_byte + self.double_byte + self.supplement + self.composite + self.ignored
    }
}

/// Streaming record classifier.
#[derive(Debug)]
pub struct Classifier {
    layout: DbcsLayout,
    out_of_band: OutOfBandPolicy,
    tables: MappingTables,
    stats: ClassifyStats,
    // Distinguishes a re-mapping from the initial ASCII/unmappable defaults.
    assigned_single: [bool; 256],
}

impl Classifier {
    /// A classifier with empty tables.
    pub fn new(options: &GenerateOptions) -> Self {
        Self {
            layout: options.layout,
            out_of_band: options.out_of_band,
            tables: MappingTables::new(),
            stats: ClassifyStats::default(),
            assigned_single: [false; 256],
        }
    }

    /// Route one record into its destination table.
    ///
    /// # Errors
    ///
    /// [`MapError::OutOfBand`] for a double-byte sequence outside the layout
    /// when the policy is [`OutOfBandPolicy::Reject`].
    pub fn push(&mut self, entry: MappingEntry) -> Result<Placement> {
        let kind = entry.kind();
        if kind == EntryKind::Dense
            && !entry.is_single_byte()
            && self.layout.band_of(entry.byte_seq).is_none()
        {
            return self.out_of_band(&entry);
        }
        self.evict(&entry);

        let placement = match kind {
            EntryKind::Composite => {
                self.tables.composite.push(entry);
                self.stats.composite += 1;
                Placement::Composite
            }
            EntryKind::Supplement => {
                self.tables.supplement.push(entry);
                self.stats.supplement += 1;
                Placement::Supplement
            }
            EntryKind::Dense if entry.is_single_byte() => {
                self.tables.single.set(entry.byte_seq as u8, entry.primary);
                self.tables.index.mark(entry.primary);
                self.stats.single_byte += 1;
                Placement::SingleByte
            }
            EntryKind::Dense => {
                self.tables.double.set(entry.byte_seq, entry.primary);
                self.tables.index.mark(entry.primary);
                self.stats.double_byte += 1;
                Placement::DoubleByte
            }
        };
        Ok(placement)
    }

    /// Clear whatever an earlier record stored for `entry.byte_seq`, so each
    /// byte sequence has exactly one owner among the dense slot and the lists.
    ///
    /// A single-byte slot is reset to [`UNMAPPABLE`] even when it only held
    /// the ASCII default.
    fn evict(&mut self, entry: &MappingEntry) {
        let byte_seq = entry.byte_seq;
        let dense = if entry.is_single_byte() {
            let byte = byte_seq as u8;
            let assigned = std::mem::replace(&mut self.assigned_single[usize::from(byte)], true);
            let previous = self.tables.single.get(byte);
            self.tables.single.set(byte, UNMAPPABLE);
            assigned.then_some(previous)
        } else {
            let previous = self.tables.double.get(byte_seq);
            self.tables.double.set(byte_seq, UNMAPPABLE);
            (previous != UNMAPPABLE).then_some(previous)
        };

        let listed = self.tables.supplement.len() + self.tables.composite.len();
        self.tables.supplement.retain(|e| e.byte_seq != byte_seq);
        self.tables.composite.retain(|e| e.byte_seq != byte_seq);
        let dropped = listed - self.tables.supplement.len() - self.tables.composite.len();

        if dense.is_some() || dropped > 0 {
            let previous = dense
                .filter(|&cp| cp != UNMAPPABLE)
                .map_or_else(|| "list entry".to_string(), |cp| format!("U+{cp:04X}"));
            debug!(
                line = entry.line,
                byte_seq = format_args!("{byte_seq:#06X}"),
                previous = %previous,
                dropped_list_entries = dropped,
                "duplicate byte sequence, later mapping wins"
            );
            self.stats.overwritten += 1;
        }
    }

    fn out_of_band(&mut self, entry: &MappingEntry) -> Result<Placement> {
        match self.out_of_band {
            OutOfBandPolicy::Reject => Err(MapError::OutOfBand {
                line: entry.line,
                byte_seq: entry.byte_seq,
            }),
            OutOfBandPolicy::Ignore => {
                warn!(
                    line = entry.line,
                    byte_seq = format_args!("{:#06X}", entry.byte_seq),
                    "ignoring double-byte sequence outside the configured bands"
                );
                self.stats.ignored += 1;
                Ok(Placement::Ignored)
            }
        }
    }

    /// Counts so far.
    pub fn stats(&self) -> ClassifyStats {
        self.stats
    }

    /// Tables built so far.
    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// Consume the classifier, returning the populated tables.
    pub fn finish(self) -> MappingTables {
        self.tables
    }
}
