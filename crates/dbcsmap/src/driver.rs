//! End-to-end table generation: parse → classify → encode → verify → write.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::encoder::encode;
use crate::error::{MapError, Result};
use crate::mapping::UNMAPPABLE;
use crate::options::{Band, DbcsLayout, GenerateOptions, MalformedPolicy};
use crate::parser::MappingParser;
use crate::reader::TableImage;
use crate::tables::{ClassifyStats, Classifier, MappingTables};

/// What a generation run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Per-destination record counts.
    pub stats: ClassifyStats,
    /// Malformed lines skipped under [`MalformedPolicy::Skip`].
    pub skipped_lines: usize,
    /// Size of the emitted blob, header included.
    pub bytes: usize,
}

/// Compile a mapping table from `reader` into a blob, without touching the
/// filesystem.
///
/// # Errors
///
/// Any parse, classification, layout, overflow or I/O error from the
/// pipeline. Malformed lines are errors unless `options.malformed` is
/// [`MalformedPolicy::Skip`].
pub fn compile<R: BufRead>(
    reader: R,
    options: &GenerateOptions,
) -> Result<(Vec<u8>, GenerateSummary)> {
    options.layout.validate()?;

    let mut classifier = Classifier::new(options);
    let mut skipped_lines = 0;
    for item in MappingParser::new(reader) {
        match item {
            Ok(entry) => {
                classifier.push(entry)?;
            }
            Err(MapError::MalformedRecord {
                line,
                content,
                reason,
            }) if options.malformed == MalformedPolicy::Skip => {
                warn!(line, reason, content = %content, "skipping malformed mapping record");
                skipped_lines += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let stats = classifier.stats();
    let tables = classifier.finish();
    let blob = encode(&tables, &options.layout)?;
    verify(&blob, &tables, &options.layout)?;

    let summary = GenerateSummary {
        stats,
        skipped_lines,
        bytes: blob.len(),
    };
    debug!(?summary, "compiled mapping table");
    Ok((blob, summary))
}

/// Re-read an encoded blob and check it agrees slot for slot with the tables
/// it came from.
fn verify(blob: &[u8], tables: &MappingTables, layout: &DbcsLayout) -> Result<()> {
    let image = TableImage::parse(blob)?;
    if image.layout() != *layout {
        return Err(mismatch("double-byte band ranges"));
    }
    if (0..=u8::MAX).any(|high| image.index_contains(high) != tables.index.contains(high)) {
        return Err(mismatch("INDEXC2B"));
    }
    for byte in 0..=u8::MAX {
        if image.dense(u16::from(byte)) != mapped(tables.single.get(byte)) {
            return Err(mismatch(&format!("SINGLEBYTE slot {byte:#04X}")));
        }
    }
    for band in [Band::First, Band::Second] {
        let lead = layout.lead(band);
        for b1 in lead.low..=lead.high {
            for b2 in layout.trail.low..=layout.trail.high {
                let byte_seq = u16::from_be_bytes([b1, b2]);
                if image.dense(byte_seq) != mapped(tables.double.get(byte_seq)) {
                    return Err(mismatch(&format!("double-byte slot {byte_seq:#06X}")));
                }
            }
        }
    }
    let supplement = tables.supplement.iter().map(|e| (e.byte_seq, e.primary));
    if !image.supplement().iter().copied().eq(supplement) {
        return Err(mismatch("SUPPLEMENT"));
    }
    let composite = tables
        .composite
        .iter()
        .map(|e| (e.byte_seq, e.primary, e.secondary));
    if !image
        .composite()
        .iter()
        .map(|&(b, p, s)| (b, p, Some(s)))
        .eq(composite)
    {
        return Err(mismatch("COMPOSITE"));
    }
    Ok(())
}

fn mapped(value: u32) -> Option<u32> {
    (value != UNMAPPABLE).then_some(value)
}

fn mismatch(what: &str) -> MapError {
    MapError::InvalidTable(format!("encoded {what} does not match the classified tables"))
}

/// Compile the table at `input` and write the blob to `output`.
///
/// The blob is written to a temporary file next to `output` and moved into
/// place only once everything succeeded; on error no output file is created
/// and an existing `output` is left untouched.
///
/// # Errors
///
/// See [`compile`]; additionally [`MapError::Io`] if `input` cannot be read
/// or `output` cannot be written.
pub fn generate(input: &Path, output: &Path, options: &GenerateOptions) -> Result<GenerateSummary> {
    let file = File::open(input)?;
    let (blob, summary) = compile(BufReader::new(file), options)?;
    write_atomically(output, &blob)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        single_byte = summary.stats.single_byte,
        double_byte = summary.stats.double_byte,
        supplement = summary.stats.supplement,
        composite = summary.stats.composite,
        ignored = summary.stats.ignored,
        skipped = summary.skipped_lines,
        bytes = summary.bytes,
        "wrote mapping table"
    );
    Ok(summary)
}

fn write_atomically(output: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".dbcsmap-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| MapError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutOfBandPolicy;
    use crate::reader::Lookup;

    const SAMPLE: &str = "\
# sample
0x5C U+A5 # YEN SIGN
0x8140 U+3000 # IDEOGRAPHIC SPACE
0x829F U+3042+3099 # composed kana
0xFA5C U+20B9F # supplementary ideograph
";

    // --- compile ---

    #[test]
    fn compile_produces_a_readable_blob() {
        let (blob, summary) = compile(SAMPLE.as_bytes(), &GenerateOptions::default()).unwrap();
        assert_eq!(summary.bytes, blob.len());
        assert_eq!(summary.stats.total(), 4);
        let image = TableImage::parse(&blob).unwrap();
        assert_eq!(image.lookup(0x5C), Lookup::Single(0xA5));
        assert_eq!(image.lookup(0x829F), Lookup::Pair(0x3042, 0x3099));
    }

    #[test]
    fn malformed_line_aborts_by_default() {
        let input = "0x8140 U+3000 # ok\n0x8141 U+3001\n";
        let err = compile(input.as_bytes(), &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, MapError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn malformed_line_is_counted_when_skipping() {
        let input = "0x8140 U+3000 # ok\ngarbage\n0x8141 U+3001 # ok\n";
        let opts = GenerateOptions {
            malformed: MalformedPolicy::Skip,
            ..GenerateOptions::default()
        };
        let (blob, summary) = compile(input.as_bytes(), &opts).unwrap();
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.stats.double_byte, 2);
        let image = TableImage::parse(&blob).unwrap();
        assert_eq!(image.lookup(0x8141), Lookup::Single(0x3001));
    }

    #[test]
    fn out_of_band_rejection_propagates() {
        let opts = GenerateOptions {
            out_of_band: OutOfBandPolicy::Reject,
            ..GenerateOptions::default()
        };
        let err = compile("0xA040 U+3000 # x\n".as_bytes(), &opts).unwrap_err();
        assert!(matches!(err, MapError::OutOfBand { line: 1, .. }));
    }

    // --- verify ---

    fn sample_tables() -> (Vec<u8>, MappingTables) {
        let mut classifier = Classifier::new(&GenerateOptions::default());
        for item in MappingParser::new(SAMPLE.as_bytes()) {
            classifier.push(item.unwrap()).unwrap();
        }
        let tables = classifier.finish();
        let blob = encode(&tables, &DbcsLayout::SHIFT_JIS).unwrap();
        (blob, tables)
    }

    #[test]
    fn verify_accepts_faithful_blob() {
        let (blob, tables) = sample_tables();
        verify(&blob, &tables, &DbcsLayout::SHIFT_JIS).unwrap();
    }

    #[test]
    fn verify_rejects_flipped_single_byte_value() {
        let (mut blob, tables) = sample_tables();
        // Low byte of SINGLEBYTE slot 0x41: header, INDEXC2B, SINGLEBYTE tag and count.
        let at = crate::encoder::HEADER_SIZE + (4 + 256) + 4 + 0x41 * 4 + 3;
        blob[at] ^= 0x01;
        let err = verify(&blob, &tables, &DbcsLayout::SHIFT_JIS).unwrap_err();
        assert!(matches!(err, MapError::InvalidTable(ref msg) if msg.contains("SINGLEBYTE")));
    }

    #[test]
    fn verify_rejects_differing_double_byte_value() {
        let (blob, mut tables) = sample_tables();
        tables.double.set(0x8140, 0x3001);
        let err = verify(&blob, &tables, &DbcsLayout::SHIFT_JIS).unwrap_err();
        assert!(matches!(err, MapError::InvalidTable(ref msg) if msg.contains("0x8140")));
    }

    #[test]
    fn verify_rejects_differing_list_contents() {
        let (blob, mut tables) = sample_tables();
        tables.composite[0].secondary = Some(0x309A);
        let err = verify(&blob, &tables, &DbcsLayout::SHIFT_JIS).unwrap_err();
        assert!(matches!(err, MapError::InvalidTable(ref msg) if msg.contains("COMPOSITE")));
    }

    // --- generate ---

    #[test]
    fn generate_writes_output_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sjis0213.map");
        let output = dir.path().join("sjis0213.dat");
        std::fs::write(&input, SAMPLE).unwrap();

        let summary = generate(&input, &output, &GenerateOptions::default()).unwrap();

        let written = std::fs::read(&output).unwrap();
        assert_eq!(written.len(), summary.bytes);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn failed_generate_keeps_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.map");
        let output = dir.path().join("table.dat");
        std::fs::write(&input, "0x8140 oops\n").unwrap();
        std::fs::write(&output, b"previous").unwrap();

        assert!(generate(&input, &output, &GenerateOptions::default()).is_err());
        assert_eq!(std::fs::read(&output).unwrap(), b"previous");
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(
            &dir.path().join("absent.map"),
            &dir.path().join("out.dat"),
            &GenerateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Io(_)));
        assert!(!dir.path().join("out.dat").exists());
    }
}
