//! Label renderer – draws one slot: position, calibration, bounds check,
//! outline, code image and fitted text.

use crate::backend::{CodeImageGenerator, DrawingBackend, TextAlign, TextStyle, VerticalAnchor};
use crate::content::{fit_font_size, MIN_FONT_SIZE, REFERENCE_FONT_SIZE, TEXT_GUTTER_MM};
use crate::error::{LabelError, Result};
use crate::layout::{GridPositioner, Point, Rect, Size};
use crate::layout_config::code_raster_px;
use crate::options::{ContentMode, RenderOptions};
use crate::sheet::SheetLayout;

/// Mutable state of one render run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    /// Sequence number the next drawn label gets.
    pub counter: u64,
    /// Index of the page being drawn.
    pub page: usize,
}

/// What happened to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Code and text were drawn; carries the encoded payload.
    Drawn { code: String },
    /// Only the cell outline was drawn (blank mode).
    Outline,
    /// The calibrated cell leaves the page; nothing was drawn.
    OutOfBounds,
}

pub struct LabelRenderer<'a> {
    layout: &'a SheetLayout,
    options: &'a RenderOptions,
    positioner: GridPositioner<'a>,
    codes: &'a dyn CodeImageGenerator,
    page_size: Size,
    state: RenderState,
}

impl<'a> LabelRenderer<'a> {
    pub fn new(
        layout: &'a SheetLayout,
        options: &'a RenderOptions,
        codes: &'a dyn CodeImageGenerator,
    ) -> Self {
        Self {
            layout,
            options,
            positioner: GridPositioner::new(layout, options.orientation),
            codes,
            page_size: layout.page_dimensions(),
            state: RenderState {
                counter: options.numbering.counter_start,
                page: 0,
            },
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn set_page(&mut self, page: usize) {
        self.state.page = page;
    }

    /// Calibrated outer rectangle of a slot.
    pub fn outer_rect(&self, slot_on_page: usize) -> Rect {
        let raw = self.positioner.position(slot_on_page);
        self.options
            .calibration
            .apply_rect(raw, self.layout.cell_size)
    }

    /// Render the label for `slot_on_page` on the current page.
    ///
    /// The sequence counter advances only when code and text were drawn.
    pub fn render_one(
        &mut self,
        slot_on_page: usize,
        backend: &mut dyn DrawingBackend,
    ) -> Result<SlotOutcome> {
        let outer = self.outer_rect(slot_on_page);

        if !outer.fits_within(self.page_size) {
            log::warn!(
                "Page {} slot {slot_on_page}: calibrated cell {:?} leaves the {}x{} mm page, skipped",
                self.state.page + 1,
                outer,
                self.page_size.width,
                self.page_size.height
            );
            return Ok(SlotOutcome::OutOfBounds);
        }

        let blank = self.options.content == ContentMode::Blank;
        if self.options.border || blank {
            backend.stroke_rect(outer)?;
        }
        if blank {
            return Ok(SlotOutcome::Outline);
        }

        let calibration = &self.options.calibration;
        let scale = calibration.scale;
        let inner = outer.inset(calibration.apply_spacing(self.options.inner_margin));
        let n = self.state.counter;
        let next = n.checked_add(1).ok_or_else(|| {
            LabelError::invalid_option("counterStart", format!("sequence overflows after {n}"))
        })?;
        let text = self.options.numbering.texts(n);

        // Height is the limiting axis: the code is square in sheet units and
        // distorted by the calibration like everything else.
        let code_edge = inner.height / scale.y;
        let code_rect = Rect::new(inner.x, inner.y, code_edge * scale.x, inner.height);
        let image = self.codes.generate(&text.code, code_raster_px(code_edge))?;
        backend.draw_image(&image, code_rect)?;

        let gutter = TEXT_GUTTER_MM * scale.x;
        let available = inner.width - code_rect.width - gutter;
        let reference_width = backend.measure_text_width(&text.print, REFERENCE_FONT_SIZE);
        let font_size = fit_font_size(REFERENCE_FONT_SIZE, reference_width, available);
        if font_size <= MIN_FONT_SIZE
            && backend.measure_text_width(&text.print, font_size) > available
        {
            log::warn!(
                "Label {}: '{}' does not fit in {available:.2} mm even at {MIN_FONT_SIZE} pt",
                n,
                text.print
            );
        }

        let style = TextStyle {
            font_size,
            width: available.max(0.0),
            align: TextAlign::Left,
            anchor: VerticalAnchor::Middle,
        };
        let origin = Point::new(code_rect.right() + gutter, inner.center_y());
        backend.draw_text(&text.print, origin, &style)?;

        self.state.counter = next;
        Ok(SlotOutcome::Drawn { code: text.code })
    }
}
