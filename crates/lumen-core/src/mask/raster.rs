//! CPU rasterization of mask definitions into single-channel alpha.
//!
//! Each mask becomes a `width × height` raster of `u8` alpha in `0..=255`,
//! independent of the develop shader. The renderer uploads the raster as an
//! `R8Unorm` texture and blends through it.
//!
//! Every kind first fills a float coverage buffer, which is then quantized,
//! inverted when the geometry asks for it, and finally scaled by opacity:
//! ```text
//! coverage ──→ round(×255) ──→ [255 − a] ──→ ×opacity/100 ──→ alpha
//! ```
//! Inverting after quantization makes an inverted and a non-inverted mask
//! with the same geometry sum to exactly 255.

use glam::Vec2;

use crate::mask::{BrushStroke, LuminosityRange, Mask, MaskKind};
use crate::transform::color::{LUMA_REC709, smoothstep};

/// Resolution of the raster being produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterTarget {
    pub width: u32,
    pub height: u32,
    /// Raster pixels per source-image pixel. Brush sizes are expressed in
    /// source pixels and scaled by this factor.
    pub brush_scale: f32,
}

impl RasterTarget {
    /// A raster for a target of `width × height` over a source image `source_width` wide.
    pub fn new(width: u32, height: u32, source_width: u32) -> Self {
        Self {
            width,
            height,
            brush_scale: width as f32 / source_width.max(1) as f32,
        }
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Rendered RGBA8 pixels used by luminosity masks.
#[derive(Debug, Clone, Copy)]
pub struct PixelSource<'a> {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width × height × 4` bytes.
    pub rgba: &'a [u8],
}

impl PixelSource<'_> {
    /// Rec. 709 luminance of the pixel nearest to raster pixel `(x, y)`.
    fn luminance_at(&self, x: u32, y: u32, target: &RasterTarget) -> f32 {
        let sx = (x as u64 * self.width as u64 / target.width.max(1) as u64) as usize;
        let sy = (y as u64 * self.height as u64 / target.height.max(1) as u64) as usize;
        let idx = (sy * self.width as usize + sx) * 4;
        match self.rgba.get(idx..idx + 3) {
            Some(px) => {
                (px[0] as f32 * LUMA_REC709.x
                    + px[1] as f32 * LUMA_REC709.y
                    + px[2] as f32 * LUMA_REC709.z)
                    / 255.0
            }
            None => 0.0,
        }
    }
}

/// Rasterizes masks, reusing its coverage buffer between calls.
#[derive(Debug, Default)]
pub struct MaskRasterizer {
    coverage: Vec<f32>,
}

impl MaskRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize `mask` at `target` resolution into `out`.
    ///
    /// `out` is resized to `width × height`; its allocation is reused when
    /// large enough. `pixels` feeds luminosity masks; without it they fall
    /// back to a horizontal-gradient placeholder.
    pub fn rasterize(
        &mut self,
        mask: &Mask,
        target: RasterTarget,
        pixels: Option<PixelSource<'_>>,
        out: &mut Vec<u8>,
    ) {
        let count = target.pixel_count();
        self.coverage.clear();
        self.coverage.resize(count, 0.0);

        let mut invert = false;
        match &mask.kind {
            MaskKind::Brush { strokes } => {
                for stroke in strokes {
                    stamp_stroke(&mut self.coverage, target, stroke);
                }
            }
            MaskKind::LinearGradient { start, end } => {
                fill_linear(&mut self.coverage, target, Vec2::from(*start), Vec2::from(*end));
            }
            MaskKind::RadialGradient {
                center,
                radius_x,
                radius_y,
                feather,
                invert: inv,
            } => {
                invert = *inv;
                fill_radial(
                    &mut self.coverage,
                    target,
                    Vec2::from(*center),
                    Vec2::new(*radius_x, *radius_y),
                    *feather,
                );
            }
            MaskKind::Luminosity {
                range,
                threshold,
                feather,
            } => {
                if pixels.is_none() {
                    tracing::warn!(
                        mask = %mask.id,
                        "luminosity mask without rendered pixels, using gradient placeholder"
                    );
                }
                fill_luminosity(&mut self.coverage, target, pixels, *range, *threshold, *feather);
            }
        }

        let opacity = (mask.opacity / 100.0).clamp(0.0, 1.0);
        out.clear();
        out.extend(self.coverage.iter().map(|&c| {
            let mut a = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            if invert {
                a = 255 - a;
            }
            (a as f32 * opacity).round() as u8
        }));
    }
}

fn pixel_center(x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn to_pixels(normalized: Vec2, target: RasterTarget) -> Vec2 {
    normalized * Vec2::new(target.width as f32, target.height as f32)
}

/// Stamp every point of a stroke. Paint adds, erase subtracts; each stamp
/// clamps to `0..=1` so a full-strength erase always clears what came before.
fn stamp_stroke(coverage: &mut [f32], target: RasterTarget, stroke: &BrushStroke) {
    let radius = stroke.size * 0.5 * target.brush_scale;
    if radius <= 0.0 {
        return;
    }
    let inner = radius * (1.0 - stroke.feather.clamp(0.0, 1.0));
    let width = target.width as usize;

    for point in &stroke.points {
        let strength = (point.pressure * stroke.flow).clamp(0.0, 1.0);
        if strength <= 0.0 {
            continue;
        }
        let center = to_pixels(Vec2::new(point.x, point.y), target);

        let x0 = (center.x - radius).floor().max(0.0) as u32;
        let y0 = (center.y - radius).floor().max(0.0) as u32;
        let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(target.width);
        let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(target.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let d = pixel_center(x, y).distance(center);
                let falloff = if d <= inner {
                    1.0
                } else if d >= radius {
                    continue;
                } else {
                    1.0 - (d - inner) / (radius - inner)
                };
                let value = strength * falloff;
                let cell = &mut coverage[y as usize * width + x as usize];
                *cell = if stroke.erase {
                    (*cell - value).max(0.0)
                } else {
                    (*cell + value).min(1.0)
                };
            }
        }
    }
}

/// 1 at `start`, 0 at `end`, linear in between along the gradient axis.
fn fill_linear(coverage: &mut [f32], target: RasterTarget, start: Vec2, end: Vec2) {
    let start = to_pixels(start, target);
    let axis = to_pixels(end, target) - start;
    let len2 = axis.length_squared();
    if len2 < 1e-6 {
        tracing::debug!("zero-length linear gradient, mask is empty");
        return;
    }

    let width = target.width as usize;
    for y in 0..target.height {
        for x in 0..target.width {
            let t = (pixel_center(x, y) - start).dot(axis) / len2;
            coverage[y as usize * width + x as usize] = 1.0 - t.clamp(0.0, 1.0);
        }
    }
}

/// 1 inside the ellipse, easing to 0 across `feather × radius` outside it.
fn fill_radial(
    coverage: &mut [f32],
    target: RasterTarget,
    center: Vec2,
    radius: Vec2,
    feather: f32,
) {
    let radius = to_pixels(radius, target);
    if radius.x <= 0.0 || radius.y <= 0.0 {
        return;
    }
    let center = to_pixels(center, target);
    let feather = feather.max(0.0);

    let width = target.width as usize;
    for y in 0..target.height {
        for x in 0..target.width {
            // Scale around the center so the ellipse becomes the unit circle.
            let d = ((pixel_center(x, y) - center) / radius).length();
            coverage[y as usize * width + x as usize] = 1.0 - smoothstep(1.0, 1.0 + feather, d);
        }
    }
}

fn fill_luminosity(
    coverage: &mut [f32],
    target: RasterTarget,
    pixels: Option<PixelSource<'_>>,
    range: LuminosityRange,
    threshold: f32,
    feather: f32,
) {
    let t = (threshold / 100.0).clamp(0.0, 1.0);
    let half_feather = (feather / 100.0).clamp(0.0, 1.0) * 0.5;
    let width = target.width as usize;
    let span = target.width.saturating_sub(1).max(1) as f32;

    for y in 0..target.height {
        for x in 0..target.width {
            let lum = match &pixels {
                Some(source) => source.luminance_at(x, y, &target),
                None => x as f32 / span,
            };
            let value = match range {
                LuminosityRange::Highlights => {
                    smoothstep(t - half_feather, t + half_feather, lum)
                }
                LuminosityRange::Shadows => {
                    let edge = 1.0 - t;
                    1.0 - smoothstep(edge - half_feather, edge + half_feather, lum)
                }
                LuminosityRange::Midtones => {
                    let half_width = t * 0.5;
                    let dist = (lum - 0.5).abs();
                    1.0 - smoothstep(half_width - half_feather, half_width + half_feather, dist)
                }
            };
            coverage[y as usize * width + x as usize] = value;
        }
    }
}
