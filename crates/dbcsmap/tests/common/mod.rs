//! Shared helpers for dbcsmap integration tests.

#![allow(dead_code)]

use std::fmt::Write;

use dbcsmap::{DbcsLayout, GenerateOptions, TableImage, compile};

/// Compile `input` with default options and parse the resulting blob.
pub fn compile_image(input: &str) -> TableImage {
    compile_image_with(input, &GenerateOptions::default())
}

/// Compile `input` with `options` and parse the resulting blob.
pub fn compile_image_with(input: &str, options: &GenerateOptions) -> TableImage {
    let (blob, _) = compile(input.as_bytes(), options).expect("compile failed");
    TableImage::parse(&blob).expect("blob does not parse")
}

/// Decode one Shift_JIS byte sequence with `encoding_rs`, if it maps to
/// exactly one character.
pub fn shift_jis_char(bytes: &[u8]) -> Option<char> {
    let text = encoding_rs::SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// A full Shift_JIS mapping table in `0x.... U+.... # ...` form, derived from
/// `encoding_rs`: half-width katakana plus every decodable in-band pair.
pub fn shift_jis_table() -> String {
    let layout = DbcsLayout::SHIFT_JIS;
    let mut out = String::from("# Shift_JIS derived from encoding_rs\n");
    for byte in 0xA1..=0xDFu8 {
        if let Some(ch) = shift_jis_char(&[byte]) {
            writeln!(out, "0x{byte:02X} U+{:04X} # single", u32::from(ch)).unwrap();
        }
    }
    for lead in (layout.lead1.low..=layout.lead1.high).chain(layout.lead2.low..=layout.lead2.high) {
        for trail in layout.trail.low..=layout.trail.high {
            if let Some(ch) = shift_jis_char(&[lead, trail]) {
                writeln!(
                    out,
                    "0x{lead:02X}{trail:02X} U+{:04X} # double",
                    u32::from(ch)
                )
                .unwrap();
            }
        }
    }
    out
}
