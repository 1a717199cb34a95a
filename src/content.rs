//! Content policy – what goes on a label and how large its text is set.

use serde::{Deserialize, Serialize};

/// Font size the printed text is measured at before fitting.
pub const REFERENCE_FONT_SIZE: f32 = 10.0;

/// Smallest font size the fit will return.
pub const MIN_FONT_SIZE: f32 = 6.0;

/// Headroom for glyph-width estimation error.
pub const FIT_SAFETY_FACTOR: f32 = 0.95;

/// Space between the code image and the text, in millimetres before scaling.
pub const TEXT_GUTTER_MM: f32 = 2.0;

/// Widest accepted zero padding; `u64::MAX` has 20 digits.
pub const MAX_COUNTER_DIGITS: usize = 20;

/// Numbering parameters for the label sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentPolicy {
    /// First sequence number.
    pub counter_start: u64,
    /// Minimum number of digits; shorter numbers are zero padded.
    pub counter_digits: usize,
    /// Prefix of the scannable payload.
    pub code_prefix: String,
    /// Prefix of the printed text. Falls back to `code_prefix` when unset.
    pub print_prefix: Option<String>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            counter_start: 1,
            counter_digits: 6,
            code_prefix: "ASN".to_string(),
            print_prefix: None,
        }
    }
}

/// The two strings rendered for one sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelText {
    pub code: String,
    pub print: String,
}

impl ContentPolicy {
    pub fn print_prefix(&self) -> &str {
        self.print_prefix.as_deref().unwrap_or(&self.code_prefix)
    }

    pub fn code_text(&self, n: u64) -> String {
        format!("{}{}", self.code_prefix, zero_pad(n, self.counter_digits))
    }

    pub fn print_text(&self, n: u64) -> String {
        format!("{}{}", self.print_prefix(), zero_pad(n, self.counter_digits))
    }

    pub fn texts(&self, n: u64) -> LabelText {
        LabelText {
            code: self.code_text(n),
            print: self.print_text(n),
        }
    }
}

/// Left-pad `n` with zeros to `digits`. Numbers that are already longer are
/// returned in full, never truncated.
pub fn zero_pad(n: u64, digits: usize) -> String {
    format!("{n:0digits$}")
}

/// Font size that makes text of `reference_width` (measured at
/// `reference_size`) fill `available_width`, less the safety factor.
///
/// The result never drops below [`MIN_FONT_SIZE`]; text that still does not
/// fit simply overflows. A zero-width measurement returns the reference size
/// clamped the same way.
pub fn fit_font_size(reference_size: f32, reference_width: f32, available_width: f32) -> f32 {
    if reference_width <= 0.0 || !reference_width.is_finite() {
        return reference_size.max(MIN_FONT_SIZE);
    }
    let fitted = reference_size * (available_width / reference_width) * FIT_SAFETY_FACTOR;
    fitted.max(MIN_FONT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_requested_width() {
        assert_eq!(zero_pad(42, 6), "000042");
        assert_eq!(zero_pad(0, 3), "000");
        assert_eq!(zero_pad(7, 0), "7");
    }

    #[test]
    fn never_truncates() {
        assert_eq!(zero_pad(123_456, 3), "123456");
    }

    #[test]
    fn padded_number_parses_back() {
        for digits in 1..=4usize {
            let limit = 10u64.pow(digits as u32);
            for n in (0..limit).step_by(7).chain([limit - 1, limit, limit * 12 + 5]) {
                let s = zero_pad(n, digits);
                assert!(s.len() >= digits);
                if n >= limit {
                    assert!(s.len() > digits);
                }
                assert_eq!(s.parse::<u64>().unwrap(), n);
            }
        }
    }

    #[test]
    fn print_prefix_falls_back_to_code_prefix() {
        let policy = ContentPolicy {
            counter_digits: 3,
            code_prefix: "A".into(),
            ..ContentPolicy::default()
        };
        assert_eq!(policy.texts(7), LabelText { code: "A007".into(), print: "A007".into() });

        let split = ContentPolicy {
            print_prefix: Some("Box ".into()),
            ..policy
        };
        assert_eq!(split.code_text(7), "A007");
        assert_eq!(split.print_text(7), "Box 007");
    }

    #[test]
    fn fit_scales_to_available_width() {
        let size = fit_font_size(10.0, 20.0, 30.0);
        assert!((size - 14.25).abs() < 1e-4);
    }

    #[test]
    fn fit_clamps_to_minimum() {
        assert_eq!(fit_font_size(10.0, 50.0, 1.0), MIN_FONT_SIZE);
        assert_eq!(fit_font_size(10.0, 50.0, -5.0), MIN_FONT_SIZE);
        assert_eq!(fit_font_size(10.0, 0.0, 30.0), 10.0);
    }
}
