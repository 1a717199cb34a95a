//! Pipeline – ties together validation, pagination and per-label rendering
//! into a single call.

use crate::backend::{CodeImageGenerator, DrawingBackend};
use crate::error::{LabelError, Result};
use crate::label::{LabelRenderer, SlotOutcome};
use crate::layout_config::{DocumentLayout, RecordingBackend};
use crate::options::RenderOptions;
use crate::pagination::{plan, slots_to_render};
use crate::qr::QrCodeGenerator;
use crate::render::PdfBackend;
use crate::sheet::{SheetLayout, SheetRegistry};

/// The pipeline cedes the thread after this many slots.
pub const YIELD_EVERY: usize = 50;

/// How a run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    /// Pages in the document, blank ones included.
    pub pages: usize,
    /// Labels whose content (or outline, in blank mode) was drawn.
    pub labels_drawn: usize,
    /// Slots left empty because their calibrated cell leaves the page.
    pub slots_omitted: usize,
    /// Sequence number the next run should start at.
    pub next_counter: u64,
}

/// Renders a whole document for one sheet layout and one set of options.
pub struct RenderPipeline<'a> {
    layout: &'a SheetLayout,
    options: &'a RenderOptions,
    codes: &'a dyn CodeImageGenerator,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(
        layout: &'a SheetLayout,
        options: &'a RenderOptions,
        codes: &'a dyn CodeImageGenerator,
    ) -> Self {
        Self {
            layout,
            options,
            codes,
        }
    }

    /// Render `total` slots (skipped ones included) onto `backend`, whose
    /// first page must already be open.
    ///
    /// `on_progress` receives a percentage after every rendered slot; it is
    /// non-decreasing and capped at 100.
    pub fn run(
        &self,
        total: usize,
        backend: &mut dyn DrawingBackend,
        mut on_progress: Option<&mut dyn FnMut(f32)>,
    ) -> Result<RenderSummary> {
        self.options.validate(total)?;

        let skip = self.options.skip;
        let pages = plan(self.layout.slots_per_page(), total, skip);
        let to_render = slots_to_render(total, skip);
        let mut renderer = LabelRenderer::new(self.layout, self.options, self.codes);
        let mut summary = RenderSummary {
            pages: pages.len(),
            ..RenderSummary::default()
        };

        let mut processed = 0usize;
        for page in &pages {
            if page.page_index > 0 {
                backend.create_page()?;
            }
            renderer.set_page(page.page_index);
            if page.is_blank() {
                log::debug!("Page {} left blank", page.page_index + 1);
                continue;
            }
            log::debug!(
                "Page {}: slots {}..{}",
                page.page_index + 1,
                page.slots.start,
                page.slots.end
            );

            for slot in page.slots.clone() {
                match renderer.render_one(slot, backend)? {
                    SlotOutcome::Drawn { .. } | SlotOutcome::Outline => summary.labels_drawn += 1,
                    SlotOutcome::OutOfBounds => summary.slots_omitted += 1,
                }

                processed += 1;
                if let Some(report) = on_progress.as_deref_mut() {
                    report(progress_percent(processed, to_render));
                }
                if processed % YIELD_EVERY == 0 {
                    std::thread::yield_now();
                }
            }
        }

        if to_render == 0 {
            if let Some(report) = on_progress.as_deref_mut() {
                report(100.0);
            }
        }

        summary.next_counter = renderer.state().counter;
        log::info!(
            "Rendered {} labels on {} pages ({} omitted off-page)",
            summary.labels_drawn,
            summary.pages,
            summary.slots_omitted
        );
        Ok(summary)
    }
}

fn progress_percent(processed: usize, to_render: usize) -> f32 {
    if to_render == 0 {
        return 100.0;
    }
    (processed as f32 / to_render as f32 * 100.0).min(100.0)
}

/// Full pipeline: format key + options → PDF bytes.
pub fn generate_pdf(
    registry: &SheetRegistry,
    format: &str,
    options: &RenderOptions,
    total: usize,
) -> Result<(Vec<u8>, RenderSummary)> {
    generate_pdf_with_progress(registry, format, options, total, None)
}

/// [`generate_pdf`] with a progress callback.
pub fn generate_pdf_with_progress(
    registry: &SheetRegistry,
    format: &str,
    options: &RenderOptions,
    total: usize,
    on_progress: Option<&mut dyn FnMut(f32)>,
) -> Result<(Vec<u8>, RenderSummary)> {
    let layout = registry.get(format)?;
    let codes = QrCodeGenerator::new();
    let mut backend = PdfBackend::new(&options.title, layout.page_dimensions());
    let summary = RenderPipeline::new(layout, options, &codes).run(total, &mut backend, on_progress)?;
    let bytes = backend.finalize()?;
    Ok((bytes, summary))
}

/// Run the pipeline against a [`RecordingBackend`] – useful for testing and
/// for dry runs.
pub fn compute_layout(
    registry: &SheetRegistry,
    format: &str,
    options: &RenderOptions,
    total: usize,
) -> Result<(DocumentLayout, RenderSummary)> {
    let layout = registry.get(format)?;
    let codes = QrCodeGenerator::new();
    let mut backend = RecordingBackend::new(options.title.clone(), layout.page_dimensions());
    let summary = RenderPipeline::new(layout, options, &codes).run(total, &mut backend, None)?;
    Ok((backend.into_layout(), summary))
}

/// Render a previously computed (possibly edited) layout snapshot to PDF.
pub fn render_layout_pdf(document: &DocumentLayout) -> Result<Vec<u8>> {
    let mut backend = PdfBackend::new(&document.title, document.page_size);
    document.replay(&mut backend, &QrCodeGenerator::new())?;
    backend.finalize()
}

/// Total slot count: an explicit label count, or whole pages.
pub fn resolve_total(layout: &SheetLayout, labels: Option<usize>, pages: usize) -> Result<usize> {
    if let Some(labels) = labels {
        return Ok(labels);
    }
    pages.checked_mul(layout.slots_per_page()).ok_or_else(|| {
        LabelError::invalid_option(
            "pages",
            format!("{pages} pages of {} labels is too many", layout.slots_per_page()),
        )
    })
}
