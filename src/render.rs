//! PDF backend – implements [`DrawingBackend`] with `printpdf` (v0.8
//! ops-based API).
//!
//! The core hands over millimetres with a top-left origin; this is the only
//! place they become PDF points with a bottom-left origin.

use printpdf::*;

use crate::backend::{CodeImage, DrawingBackend, TextAlign, TextStyle, VerticalAnchor};
use crate::error::{LabelError, Result};
use crate::fonts::{helvetica_text_width, HELVETICA_ASCENDER, HELVETICA_CAP_HEIGHT};
use crate::layout::{Rect, Size};
use crate::units::{mm_to_pt, pt_to_mm};

/// Stroke width of cell outlines, in points.
const OUTLINE_THICKNESS_PT: f32 = 0.25;

const FONT: BuiltinFont = BuiltinFont::Helvetica;

fn black() -> Color {
    Color::Rgb(Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        icc_profile: None,
    })
}

fn line_point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Renders label pages into a PDF document.
pub struct PdfBackend {
    doc: PdfDocument,
    page_size: Size,
    finished_pages: Vec<Vec<Op>>,
    current: Vec<Op>,
    image_count: usize,
    finalized: bool,
}

impl PdfBackend {
    /// A document titled `title` whose pages are `page_size` millimetres.
    pub fn new(title: &str, page_size: Size) -> Self {
        Self {
            doc: PdfDocument::new(title),
            page_size,
            finished_pages: Vec::new(),
            current: Vec::new(),
            image_count: 0,
            finalized: false,
        }
    }

    pub fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    fn page_height_pt(&self) -> f32 {
        mm_to_pt(self.page_size.height)
    }

    /// Top-left millimetres → bottom-left points.
    fn flip_y(&self, y_mm: f32) -> f32 {
        self.page_height_pt() - mm_to_pt(y_mm)
    }
}

impl DrawingBackend for PdfBackend {
    fn create_page(&mut self) -> Result<()> {
        let ops = std::mem::take(&mut self.current);
        self.finished_pages.push(ops);
        log::debug!("PDF page {} started", self.page_count());
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<()> {
        let x1 = mm_to_pt(rect.x);
        let x2 = mm_to_pt(rect.right());
        let y1 = self.flip_y(rect.bottom());
        let y2 = self.flip_y(rect.y);

        self.current.push(Op::SetOutlineColor { col: black() });
        self.current.push(Op::SetOutlineThickness {
            pt: Pt(OUTLINE_THICKNESS_PT),
        });
        self.current.push(Op::DrawLine {
            line: Line {
                points: vec![
                    line_point(x1, y2),
                    line_point(x2, y2),
                    line_point(x2, y1),
                    line_point(x1, y1),
                ],
                is_closed: true,
            },
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &CodeImage, rect: Rect) -> Result<()> {
        if rect.width <= 0.0 || rect.height <= 0.0 || image.width_px == 0 || image.height_px == 0 {
            log::debug!("Code image '{}' has no area, nothing drawn", image.payload);
            return Ok(());
        }

        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&image.png, &mut warnings).map_err(|e| {
            LabelError::Backend(format!("cannot embed code image '{}': {e}", image.payload))
        })?;
        let xobj_id = self.doc.add_image(&raw);
        self.image_count += 1;

        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        let scale_x = mm_to_pt(rect.width) / image.width_px as f32;
        let scale_y = mm_to_pt(rect.height) / image.height_px as f32;

        self.current.push(Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(mm_to_pt(rect.x))),
                translate_y: Some(Pt(self.flip_y(rect.bottom()))),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        });
        Ok(())
    }

    fn measure_text_width(&self, text: &str, font_size: f32) -> f32 {
        pt_to_mm(helvetica_text_width(text, font_size))
    }

    fn draw_text(
        &mut self,
        text: &str,
        origin: crate::layout::Point,
        style: &TextStyle,
    ) -> Result<()> {
        let text_width_pt = helvetica_text_width(text, style.font_size);
        let box_width_pt = mm_to_pt(style.width);
        let dx = match style.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (box_width_pt - text_width_pt) / 2.0,
            TextAlign::Right => box_width_pt - text_width_pt,
        };
        let dy = match style.anchor {
            VerticalAnchor::Top => style.font_size * HELVETICA_ASCENDER,
            VerticalAnchor::Middle => style.font_size * HELVETICA_CAP_HEIGHT / 2.0,
            VerticalAnchor::Baseline => 0.0,
        };

        let x = mm_to_pt(origin.x) + dx;
        let y = self.flip_y(origin.y) - dy;

        self.current.push(Op::StartTextSection);
        self.current.push(Op::SetTextCursor {
            pos: Point { x: Pt(x), y: Pt(y) },
        });
        self.current.push(Op::SetFontSizeBuiltinFont {
            size: Pt(style.font_size),
            font: FONT,
        });
        self.current.push(Op::SetFillColor { col: black() });
        self.current.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(to_builtin_text(text))],
            font: FONT,
        });
        self.current.push(Op::EndTextSection);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        if self.finalized {
            return Err(LabelError::Backend("document already finalized".to_string()));
        }
        self.finalized = true;

        let page_w = Mm(self.page_size.width);
        let page_h = Mm(self.page_size.height);

        let mut all_ops = std::mem::take(&mut self.finished_pages);
        all_ops.push(std::mem::take(&mut self.current));
        let pages: Vec<PdfPage> = all_ops
            .into_iter()
            .map(|ops| PdfPage::new(page_w, page_h, ops))
            .collect();

        log::debug!(
            "Writing PDF: {} pages, {} embedded images",
            pages.len(),
            self.image_count
        );
        self.doc.with_pages(pages);
        let mut warnings = Vec::new();
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        for w in &warnings {
            log::debug!("printpdf: {w:?}");
        }
        Ok(bytes)
    }
}

/// Builtin fonts use WinAnsiEncoding; anything outside printable ASCII is
/// replaced so the content stream stays valid.
fn to_builtin_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{00A0}' => ' ',
            c if (' '..='~').contains(&c) => c,
            _ => '?',
        })
        .collect()
}
