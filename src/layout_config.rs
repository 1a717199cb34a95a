//! Layout snapshot – the "frozen" record of exactly what was drawn on each
//! page, independent of any output format.
//!
//! [`RecordingBackend`] produces it; [`DocumentLayout::replay`] draws it
//! again onto any other backend (e.g. to turn an edited snapshot into a PDF).

use serde::{Deserialize, Serialize};

use crate::backend::{CodeImage, CodeImageGenerator, DrawingBackend, TextStyle};
use crate::error::{LabelError, Result};
use crate::fonts::helvetica_text_width;
use crate::layout::{Point, Rect, Size};
use crate::units::{mm_to_px, pt_to_mm};

/// Raster density at which code images are requested, in pixels per inch.
pub const CODE_RASTER_DPI: f32 = 300.0;

/// A complete document layout, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLayout {
    #[serde(default = "DocumentLayout::default_title")]
    pub title: String,
    pub page_size: Size,
    pub pages: Vec<PageLayout>,
}

/// Everything drawn on one page, in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_index: usize,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    StrokeRect {
        rect: Rect,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        payload: String,
        rect: Rect,
        width_px: u32,
        height_px: u32,
    },
    Text {
        text: String,
        origin: Point,
        style: TextStyle,
    },
}

impl DocumentLayout {
    pub fn new(title: impl Into<String>, page_size: Size) -> Self {
        Self {
            title: title.into(),
            page_size,
            pages: vec![PageLayout {
                page_index: 0,
                ops: Vec::new(),
            }],
        }
    }

    fn default_title() -> String {
        "Labels".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Printed texts in document order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(PageLayout::texts)
    }

    /// Draw the snapshot onto `backend`. Code images are regenerated from
    /// their payloads, which reproduces them exactly since generation is
    /// deterministic.
    pub fn replay(
        &self,
        backend: &mut dyn DrawingBackend,
        codes: &dyn CodeImageGenerator,
    ) -> Result<()> {
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                backend.create_page()?;
            }
            for op in &page.ops {
                match op {
                    DrawOp::StrokeRect { rect } => backend.stroke_rect(*rect)?,
                    DrawOp::Image {
                        payload,
                        rect,
                        width_px,
                        ..
                    } => {
                        let image = codes.generate(payload, *width_px)?;
                        backend.draw_image(&image, *rect)?;
                    }
                    DrawOp::Text {
                        text,
                        origin,
                        style,
                    } => backend.draw_text(text, *origin, style)?,
                }
            }
        }
        Ok(())
    }
}

impl PageLayout {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&str, &Rect)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { payload, rect, .. } => Some((payload.as_str(), rect)),
            _ => None,
        })
    }

    pub fn outlines(&self) -> impl Iterator<Item = &Rect> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::StrokeRect { rect } => Some(rect),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Recording backend
// ---------------------------------------------------------------------------

/// A [`DrawingBackend`] that records operations into a [`DocumentLayout`].
/// Text is measured as Helvetica, matching the PDF backend.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    layout: DocumentLayout,
}

impl RecordingBackend {
    pub fn new(title: impl Into<String>, page_size: Size) -> Self {
        Self {
            layout: DocumentLayout::new(title, page_size),
        }
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn into_layout(self) -> DocumentLayout {
        self.layout
    }

    fn push(&mut self, op: DrawOp) -> Result<()> {
        let page = self
            .layout
            .pages
            .last_mut()
            .ok_or_else(|| LabelError::Backend("no open page".to_string()))?;
        page.ops.push(op);
        Ok(())
    }
}

impl DrawingBackend for RecordingBackend {
    fn create_page(&mut self) -> Result<()> {
        let page_index = self.layout.pages.len();
        self.layout.pages.push(PageLayout {
            page_index,
            ops: Vec::new(),
        });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<()> {
        self.push(DrawOp::StrokeRect { rect })
    }

    fn draw_image(&mut self, image: &CodeImage, rect: Rect) -> Result<()> {
        self.push(DrawOp::Image {
            payload: image.payload.clone(),
            rect,
            width_px: image.width_px,
            height_px: image.height_px,
        })
    }

    fn measure_text_width(&self, text: &str, font_size: f32) -> f32 {
        pt_to_mm(helvetica_text_width(text, font_size))
    }

    fn draw_text(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<()> {
        self.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            style: *style,
        })
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        Ok(self.layout.to_json().into_bytes())
    }
}

/// Smallest raster edge, in pixels, for a code image `edge_mm` wide.
pub fn code_raster_px(edge_mm: f32) -> u32 {
    mm_to_px(edge_mm, CODE_RASTER_DPI)
}
