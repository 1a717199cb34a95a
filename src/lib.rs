//! # asn-labels – Deterministic label-sheet placement and QR label rendering
//!
//! This crate lays numbered QR code labels onto pre-cut label sheets and
//! renders them to PDF. The pipeline stages are:
//!
//! 1. **Resolve** – format key → sheet geometry ([`sheet`])
//! 2. **Paginate** – split the slot sequence into pages, honouring skips ([`pagination`])
//! 3. **Position** – slot index → calibrated cell rectangle ([`layout`])
//! 4. **Compose** – code image plus fitted text per label ([`label`], [`content`], [`qr`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`]) or a JSON
//!    layout snapshot ([`layout_config`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod backend;
pub mod content;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod label;
pub mod layout;
pub mod layout_config;
pub mod options;
pub mod pagination;
pub mod pipeline;
pub mod qr;
pub mod render;
pub mod sheet;
pub mod units;

// Re-exports for convenience
pub use error::{LabelError, Result};
pub use options::RenderOptions;
pub use pipeline::{compute_layout, generate_pdf, RenderSummary};
pub use sheet::{SheetLayout, SheetRegistry};
