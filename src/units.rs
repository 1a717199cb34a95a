//! Unit conversion. The core works in millimetres; backends convert at the
//! boundary.

pub const MM_PER_INCH: f32 = 25.4;
pub const PT_PER_INCH: f32 = 72.0;

/// Millimetres → PDF points (1/72 inch).
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_INCH / MM_PER_INCH
}

/// PDF points → millimetres.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_INCH / PT_PER_INCH
}

pub fn inch_to_mm(inches: f32) -> f32 {
    inches * MM_PER_INCH
}

/// Pixels needed to cover `mm` at `dpi`, rounded up.
pub fn mm_to_px(mm: f32, dpi: f32) -> u32 {
    if mm <= 0.0 {
        return 0;
    }
    (mm / MM_PER_INCH * dpi).ceil() as u32
}
