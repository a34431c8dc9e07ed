//! Export capability handed to collaborators that need full-resolution frames.
//!
//! The session that owns the renderer wraps it in a [`SharedRenderer`] and
//! passes `&dyn FrameExporter` to whoever exports. Nothing reaches the
//! renderer through global state.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lumen_core::{EditParameters, Mask};
use parking_lot::{Mutex, MutexGuard};

use crate::error::ExportError;
use crate::renderer::Renderer;

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    /// Quality 1..=100. Alpha is dropped.
    Jpeg { quality: u8 },
}

/// Encode tightly packed RGBA8 pixels.
pub fn encode_rgba8(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: ExportFormat,
) -> Result<Vec<u8>, ExportError> {
    if pixels.len() != width as usize * height as usize * 4 {
        return Err(ExportError::InvalidSize { width, height });
    }
    let mut out = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut out).write_image(&pixels, width, height, ExtendedColorType::Rgba8)?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb: Vec<u8> = pixels
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
                &rgb,
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(out.into_inner())
}

/// Narrow capability for producing encoded frames at arbitrary resolution.
pub trait FrameExporter: Send + Sync {
    fn export_frame(
        &self,
        params: &EditParameters,
        masks: &[Mask],
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError>;
}

/// A renderer shared between the display path and export.
#[derive(Clone)]
pub struct SharedRenderer {
    inner: Arc<Mutex<Renderer>>,
}

impl SharedRenderer {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(renderer)),
        }
    }

    /// Lock the renderer for display-path calls.
    pub fn lock(&self) -> MutexGuard<'_, Renderer> {
        self.inner.lock()
    }
}

impl FrameExporter for SharedRenderer {
    fn export_frame(
        &self,
        params: &EditParameters,
        masks: &[Mask],
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        self.inner
            .lock()
            .render_for_export_with_masks(params, masks, width, height, format)
    }
}
