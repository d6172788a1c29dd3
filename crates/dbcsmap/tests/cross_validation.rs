//! Cross-validation of compiled tables against `encoding_rs`'s Shift_JIS decoder.

mod common;

use common::{compile_image, shift_jis_char, shift_jis_table};
use dbcsmap::{DbcsLayout, Lookup};

#[test]
fn full_shift_jis_table_matches_encoding_rs() {
    let image = compile_image(&shift_jis_table());
    let layout = DbcsLayout::SHIFT_JIS;

    let mut checked = 0;
    for lead in (layout.lead1.low..=layout.lead1.high).chain(layout.lead2.low..=layout.lead2.high) {
        for trail in layout.trail.low..=layout.trail.high {
            let seq = u16::from_be_bytes([lead, trail]);
            let expected = match shift_jis_char(&[lead, trail]) {
                Some(ch) => Lookup::Single(u32::from(ch)),
                None => Lookup::Unmappable,
            };
            assert_eq!(image.lookup(seq), expected, "{seq:#06X}");
            checked += 1;
        }
    }
    assert_eq!(checked, (31 + 29) * 191);
}

#[test]
fn half_width_katakana_match_encoding_rs() {
    let image = compile_image(&shift_jis_table());
    for byte in 0xA1..=0xDFu8 {
        let ch = shift_jis_char(&[byte]).expect("half-width katakana decodes");
        assert_eq!(image.lookup(u16::from(byte)), Lookup::Single(u32::from(ch)));
    }
}

#[test]
fn well_known_code_points() {
    let image = compile_image(&shift_jis_table());
    // IDEOGRAPHIC SPACE, HIRAGANA LETTER A, CJK UNIFIED IDEOGRAPH-4E9C
    assert_eq!(image.lookup(0x8140), Lookup::Single(0x3000));
    assert_eq!(image.lookup(0x82A0), Lookup::Single(0x3042));
    assert_eq!(image.lookup(0x889F), Lookup::Single(0x4E9C));
    assert!(image.index_contains(0x30));
    assert!(image.index_contains(0x4E));
}
