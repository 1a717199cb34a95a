//! Capabilities the renderer needs from its surroundings: a drawing surface
//! and a code-image generator.
//!
//! Geometry crosses these traits in millimetres (origin top-left); font sizes
//! are points. Each backend converts to its own native units.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Which part of the text line the `y` coordinate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Middle,
    #[default]
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points.
    pub font_size: f32,
    /// Box width the alignment is computed against, in millimetres.
    pub width: f32,
    pub align: TextAlign,
    pub anchor: VerticalAnchor,
}

/// A raster produced by a [`CodeImageGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodeImage {
    /// The text encoded in the image.
    pub payload: String,
    /// PNG bytes.
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// A page-oriented drawing surface. A fresh backend has its first page open.
pub trait DrawingBackend {
    /// Start a new page; subsequent drawing goes there.
    fn create_page(&mut self) -> Result<()>;

    fn stroke_rect(&mut self, rect: Rect) -> Result<()>;

    fn draw_image(&mut self, image: &CodeImage, rect: Rect) -> Result<()>;

    /// Width of `text` at `font_size` points, in millimetres.
    fn measure_text_width(&self, text: &str, font_size: f32) -> f32;

    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<()>;

    /// Finish the document and return its bytes.
    fn finalize(&mut self) -> Result<Vec<u8>>;
}

/// Turns a payload into a scannable raster. Output must be deterministic and
/// carry no quiet zone.
pub trait CodeImageGenerator {
    /// `size_px` is the smallest acceptable edge length in pixels.
    fn generate(&self, text: &str, size_px: u32) -> Result<CodeImage>;
}
