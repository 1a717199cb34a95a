//! QR code rasteriser.
//!
//! The module matrix comes from `qrcode`; the raster is built and encoded as
//! PNG here. No quiet zone is added, the sheet grid provides the spacing.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};

use crate::backend::{CodeImage, CodeImageGenerator};
use crate::error::{LabelError, Result};

/// Generates margin-free QR codes with medium error correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeGenerator;

impl QrCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeImageGenerator for QrCodeGenerator {
    fn generate(&self, text: &str, size_px: u32) -> Result<CodeImage> {
        let code = QrCode::new(text.as_bytes()).map_err(|e| LabelError::CodeImage {
            payload: text.to_string(),
            reason: e.to_string(),
        })?;

        let modules = code.width() as u32;
        let module_px = size_px.div_ceil(modules).max(1);
        let edge = modules * module_px;
        let colors = code.to_colors();

        let raster = GrayImage::from_fn(edge, edge, |x, y| {
            let idx = ((y / module_px) * modules + x / module_px) as usize;
            match colors[idx] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        });

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(raster)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| LabelError::CodeImage {
                payload: text.to_string(),
                reason: e.to_string(),
            })?;

        Ok(CodeImage {
            payload: text.to_string(),
            png,
            width_px: edge,
            height_px: edge,
        })
    }
}
