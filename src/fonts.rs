//! Text measurement for the built-in Helvetica face.
//!
//! Labels are drawn with the PDF base-14 Helvetica font, which is never
//! embedded, so widths come from its published AFM advance table instead of
//! a parsed font file.

/// Advance widths (1/1000 em) for WinAnsi code points 0x20..=0x7E.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, // space ! " # $ % & '
    333, 333, 389, 584, 278, 333, 278, 278, // ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, // 0-7
    556, 556, 278, 278, 584, 584, 584, 556, // 8 9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, // @ A-G
    722, 278, 500, 667, 556, 833, 722, 778, // H-O
    667, 778, 722, 667, 611, 722, 667, 944, // P-W
    667, 667, 611, 278, 278, 278, 469, 556, // X Y Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556, // ` a-g
    556, 222, 222, 500, 222, 833, 556, 556, // h-o
    556, 556, 333, 500, 278, 556, 500, 722, // p-w
    500, 500, 500, 334, 260, 334, 584, // x y z { | } ~
];

/// Width used for glyphs outside the ASCII table.
const FALLBACK_ADVANCE: u16 = 556;

/// Cap height of Helvetica as a fraction of the font size.
pub const HELVETICA_CAP_HEIGHT: f32 = 0.718;

/// Ascender of Helvetica as a fraction of the font size.
pub const HELVETICA_ASCENDER: f32 = 0.718;

fn advance(ch: char) -> u16 {
    match ch as u32 {
        c @ 0x20..=0x7E => HELVETICA_ASCII[(c - 0x20) as usize],
        _ => FALLBACK_ADVANCE,
    }
}

/// Width of `text` in points when set in Helvetica at `font_size` points.
pub fn helvetica_text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(advance(c))).sum();
    units as f32 * font_size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_tabular() {
        let w1 = helvetica_text_width("000000", 10.0);
        let w2 = helvetica_text_width("918273", 10.0);
        assert!((w1 - w2).abs() < 1e-4);
        assert!((w1 - 33.36).abs() < 1e-3);
    }

    #[test]
    fn width_scales_with_size() {
        let small = helvetica_text_width("ASN000123", 6.0);
        let large = helvetica_text_width("ASN000123", 12.0);
        assert!((large - 2.0 * small).abs() < 1e-4);
    }

    #[test]
    fn known_glyph_widths() {
        assert!((helvetica_text_width("W", 1000.0) - 944.0).abs() < 1e-3);
        assert!((helvetica_text_width("i", 1000.0) - 222.0).abs() < 1e-3);
        assert!((helvetica_text_width("~", 1000.0) - 584.0).abs() < 1e-3);
        assert_eq!(helvetica_text_width("", 10.0), 0.0);
    }

    #[test]
    fn non_ascii_uses_fallback() {
        assert!((helvetica_text_width("é", 1000.0) - 556.0).abs() < 1e-3);
    }
}
