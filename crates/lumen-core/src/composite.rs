//! CPU reference compositor.
//!
//! Same pass structure as the GPU renderer: develop the base layer into the
//! accumulator, then for each enabled mask develop a layer with the mask's
//! deltas folded in, rasterize the mask, and blend the layer over the
//! accumulator through it. The accumulator is a [`PingPong`] pair, so each
//! mask reads one buffer and writes the other.

use crate::image::SourceImage;
use crate::mask::raster::{MaskRasterizer, PixelSource, RasterTarget};
use crate::mask::{Mask, enabled_masks};
use crate::ping_pong::PingPong;
use crate::transform::evaluate::{DevelopConstants, develop_image, develop_image_with, to_unorm8};
use crate::transform::params::EditParameters;

/// `out = base + (layer − base) × alpha`, per channel on normalized values.
///
/// `alpha` holds one byte per pixel; the color buffers hold four.
pub fn blend_through_mask(base: &[u8], layer: &[u8], alpha: &[u8], out: &mut [u8]) {
    for (((b, l), a), o) in base
        .chunks_exact(4)
        .zip(layer.chunks_exact(4))
        .zip(alpha.iter())
        .zip(out.chunks_exact_mut(4))
    {
        let t = *a as f32 / 255.0;
        for i in 0..4 {
            let bv = b[i] as f32 / 255.0;
            let lv = l[i] as f32 / 255.0;
            o[i] = to_unorm8(bv + (lv - bv) * t);
        }
    }
}

/// Reusable CPU compositor. Buffers persist across calls.
#[derive(Debug, Default)]
pub struct CpuCompositor {
    rasterizer: MaskRasterizer,
    accum: Option<PingPong<Vec<u8>>>,
    alpha: Vec<u8>,
    base: Vec<u8>,
    merged: EditParameters,
}

impl CpuCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `source` with `params` and `masks` at `width × height`, RGBA8.
    pub fn render(
        &mut self,
        source: &SourceImage,
        params: &EditParameters,
        masks: &[Mask],
        width: u32,
        height: u32,
    ) -> Vec<u8> {
        let len = width as usize * height as usize * 4;
        let accum = self
            .accum
            .get_or_insert_with(|| PingPong::from_fn(|_| Vec::new()));
        accum.reset();
        accum.src_mut().clear();
        accum.src_mut().extend(develop_image(source, params, width, height));
        accum.dst_mut().resize(len, 0);

        self.base.clone_from(accum.src());
        let target = RasterTarget::new(width, height, source.width());

        for mask in enabled_masks(masks) {
            params.merge_local_into(&mask.adjustments, &mut self.merged);
            let constants = DevelopConstants::derive_layer(&self.merged, &mask.adjustments.tone_curve);
            let layer = develop_image_with(source, &self.merged, &constants, width, height);
            let pixels = mask.kind.needs_pixels().then_some(PixelSource {
                width,
                height,
                rgba: &self.base,
            });
            self.rasterizer
                .rasterize(mask, target, pixels, &mut self.alpha);

            let (src, dst) = accum.split();
            blend_through_mask(src, &layer, &self.alpha, dst);
            accum.swap();
            tracing::trace!(mask = %mask.id, "composited mask layer");
        }

        accum.src().clone()
    }
}
