//! CPU reference of the develop transform. `develop.wgsl` mirrors this.
//!
//! Applies the complete adjustment chain to one pixel, in order:
//! 1. Exposure
//! 2. Contrast
//! 3. White balance
//! 4. Highlight/shadow/white/black bands
//! 5. Tone curve
//! 6. 8-band HSL
//! 7. Vibrance
//! 8. Saturation
//! 9. Color grading
//! 10. Calibration
//! 11. Dehaze
//! 12. Clarity
//! 13. Texture
//! 14. Sharpening
//! 15. Vignette
//! 16. Grain
//!
//! Values are never clamped between stages; headroom carries through to the
//! final output clamp.

use glam::{Vec2, Vec3, Vec4};

use crate::image::SourceImage;
use crate::transform::color::{
    grading_tint, hsl_to_rgb, hue_distance, luminance, rgb_to_hsl, smoothstep,
};
use crate::transform::lut::CurveLut;
use crate::transform::params::{
    Calibration, ColorGrading, EditParameters, Grain, HslAdjustments, Sharpening, ToneCurve,
    Vignette,
};

/// Largest contrast slider value in the slope formula's domain. The formula is
/// singular at 259.
const CONTRAST_LIMIT: f32 = 254.0;
const WHITE_BALANCE_SCALE: f32 = 0.1;
const TONE_BAND_SCALE: f32 = 0.25;
const WHITE_BLACK_SCALE: f32 = 0.2;
/// Width of each hue band's smoothstep window, in degrees.
const HUE_WINDOW: f32 = 30.0;
const HUE_SHIFT_DEGREES: f32 = 30.0;
/// Tap distance of the clarity blur, in source texels.
pub const CLARITY_RADIUS: f32 = 4.0;

/// Per-call constants derived from an [`EditParameters`] snapshot.
///
/// The GPU path packs the same values into its uniform block.
#[derive(Debug, Clone)]
pub struct DevelopConstants {
    pub curve: CurveLut,
    pub hsl_enabled: bool,
    /// Tint offset and strength per grading zone: shadows, midtones, highlights.
    pub grade_tints: [(Vec3, f32); 3],
}

impl DevelopConstants {
    pub fn derive(params: &EditParameters) -> Self {
        let grading = &params.color_grading;
        let zone = |z: &crate::transform::params::GradeZone| {
            (grading_tint(z.hue), (z.saturation / 100.0).clamp(0.0, 1.0))
        };
        Self {
            curve: CurveLut::build(&params.tone_curve),
            hsl_enabled: !params.hsl.is_neutral(),
            grade_tints: [
                zone(&grading.shadows),
                zone(&grading.midtones),
                zone(&grading.highlights),
            ],
        }
    }

    /// Constants for a mask pass: `merged` is the global snapshot with the
    /// mask's deltas folded in, and `local_curve` runs after the global curve.
    pub fn derive_layer(merged: &EditParameters, local_curve: &ToneCurve) -> Self {
        let mut constants = Self::derive(merged);
        let local = CurveLut::build(local_curve);
        if local.enabled {
            constants.curve = constants.curve.then(&local);
        }
        constants
    }
}

/// Source-texture neighbourhood of one pixel, gathered before the chain runs.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood {
    /// Mean of the 8 sharpening taps at `radius` texels.
    pub blur: Vec3,
    /// Mean luminance of the 4 direct neighbours at one texel.
    pub neighbor_luma: f32,
    /// Mean of 4 axial taps at [`CLARITY_RADIUS`] texels.
    pub wide_blur: Vec3,
}

/// Where the pixel sits in the output frame.
#[derive(Debug, Clone, Copy)]
pub struct FramePosition {
    /// Normalized coordinates, 0..1.
    pub uv: Vec2,
    /// Pixel-center coordinates in the output.
    pub pixel: Vec2,
    /// Output width / height.
    pub aspect: f32,
}

/// Apply the full chain to one pixel and clamp the result.
pub fn evaluate_pixel(
    rgb: Vec3,
    around: &Neighborhood,
    at: &FramePosition,
    params: &EditParameters,
    constants: &DevelopConstants,
) -> Vec3 {
    let source = rgb;
    let mut c = apply_exposure(rgb, params.exposure);
    c = apply_contrast(c, params.contrast);
    c = apply_white_balance(c, params.temperature, params.tint);
    c = apply_tone_bands(c, params);
    if constants.curve.enabled {
        c = Vec3::new(
            constants.curve.lookup(c.x),
            constants.curve.lookup(c.y),
            constants.curve.lookup(c.z),
        );
    }
    if constants.hsl_enabled {
        c = apply_hsl(c, &params.hsl);
    }
    c = apply_vibrance(c, params.vibrance);
    c = apply_saturation(c, params.saturation);
    c = apply_color_grading(c, &params.color_grading, &constants.grade_tints);
    c = apply_calibration(c, &params.calibration);
    c = apply_dehaze(c, params.dehaze);
    c = apply_clarity(c, source - around.wide_blur, params.clarity);
    c = apply_texture(c, luminance(source) - around.neighbor_luma, params.texture);
    c = apply_sharpening(c, source - around.blur, &params.sharpening);
    c = apply_vignette(c, at, &params.vignette);
    c = apply_grain(c, at.pixel, &params.grain);
    c.clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn apply_exposure(c: Vec3, stops: f32) -> Vec3 {
    c * stops.exp2()
}

/// Slope `259(k+255) / (255(259−k))` pivoted at 0.5, with the slider scaled to
/// ±255 and kept clear of the singularity.
pub fn apply_contrast(c: Vec3, contrast: f32) -> Vec3 {
    let k = (contrast * 2.55).clamp(-255.0, CONTRAST_LIMIT);
    let slope = 259.0 * (k + 255.0) / (255.0 * (259.0 - k));
    (c - Vec3::splat(0.5)) * slope + Vec3::splat(0.5)
}

pub fn apply_white_balance(c: Vec3, temperature: f32, tint: f32) -> Vec3 {
    let t = temperature / 100.0 * WHITE_BALANCE_SCALE;
    let g = tint / 100.0 * WHITE_BALANCE_SCALE;
    c + Vec3::new(t, -g, -t)
}

/// Additive luminance-banded terms. Highlights/shadows split at 0.5, whites
/// sit around 0.75 and blacks around 0.25.
pub fn apply_tone_bands(c: Vec3, params: &EditParameters) -> Vec3 {
    let l = luminance(c);
    let highlights = smoothstep(0.25, 0.75, l);
    let shadows = 1.0 - highlights;
    let whites = smoothstep(0.5, 1.0, l);
    let blacks = 1.0 - smoothstep(0.0, 0.5, l);
    let delta = (params.highlights * highlights + params.shadows * shadows) / 100.0
        * TONE_BAND_SCALE
        + (params.whites * whites + params.blacks * blacks) / 100.0 * WHITE_BLACK_SCALE;
    c + Vec3::splat(delta)
}

fn band_weight(hue: f32, center: f32) -> f32 {
    1.0 - smoothstep(0.0, HUE_WINDOW, hue_distance(hue, center))
}

pub fn apply_hsl(c: Vec3, hsl: &HslAdjustments) -> Vec3 {
    let mut h = rgb_to_hsl(c);
    // Near-gray pixels have no meaningful hue.
    let gate = smoothstep(0.0, 0.1, h.y);

    let mut delta = Vec3::ZERO;
    for (center, band) in hsl.bands() {
        let w = band_weight(h.x, center) * gate;
        delta += w * Vec3::new(
            band.hue / 100.0 * HUE_SHIFT_DEGREES,
            band.saturation / 100.0,
            band.luminance / 100.0,
        );
    }

    h.x = (h.x + delta.x).rem_euclid(360.0);
    h.y = (h.y * (1.0 + delta.y)).clamp(0.0, 1.0);
    h.z += delta.z * 0.2;
    hsl_to_rgb(h)
}

fn scale_chroma(c: Vec3, amount: f32) -> Vec3 {
    let gray = Vec3::splat(luminance(c));
    gray + (c - gray) * amount
}

/// Saturation boost that fades out as the pixel is already saturated.
pub fn apply_vibrance(c: Vec3, vibrance: f32) -> Vec3 {
    let chroma = (c.max_element() - c.min_element()).clamp(0.0, 1.0);
    let boost = vibrance / 100.0 * (1.0 - chroma);
    scale_chroma(c, 1.0 + boost)
}

pub fn apply_saturation(c: Vec3, saturation: f32) -> Vec3 {
    scale_chroma(c, (1.0 + saturation / 100.0).max(0.0))
}

/// Zone weights for shadows, midtones and highlights at luminance `l`.
pub fn grading_weights(l: f32, grading: &ColorGrading) -> Vec3 {
    let balance = (grading.balance / 100.0).clamp(-1.0, 1.0);
    let split = 0.5 - balance * 0.25;
    let softness = (grading.blending / 100.0).clamp(0.05, 1.0);
    let exponent = 1.0 / (2.0 * softness);

    let shadows = (1.0 - smoothstep(0.0, split, l)).powf(exponent);
    let highlights = smoothstep(split, 1.0, l).powf(exponent);
    let midtones = (1.0 - shadows - highlights).clamp(0.0, 1.0);
    Vec3::new(shadows, midtones, highlights)
}

pub fn apply_color_grading(c: Vec3, grading: &ColorGrading, tints: &[(Vec3, f32); 3]) -> Vec3 {
    let w = grading_weights(luminance(c), grading);
    let push = tints[0].0 * tints[0].1 * w.x
        + tints[1].0 * tints[1].1 * w.y
        + tints[2].0 * tints[2].1 * w.z;
    c + push * 0.5
}

pub fn apply_calibration(c: Vec3, cal: &Calibration) -> Vec3 {
    let shadow = (1.0 - smoothstep(0.0, 0.4, luminance(c))) * cal.shadow_tint / 100.0 * 0.1;
    Vec3::new(
        c.x * (1.0 + cal.red_saturation / 200.0) + c.z * cal.blue_hue / 1000.0,
        c.y * (1.0 + cal.green_saturation / 200.0) + c.x * cal.red_hue / 1000.0 - shadow,
        c.z * (1.0 + cal.blue_saturation / 200.0) + c.y * cal.green_hue / 1000.0,
    )
}

pub fn apply_dehaze(c: Vec3, dehaze: f32) -> Vec3 {
    let d = dehaze / 100.0;
    (c - Vec3::splat(0.5)) * (1.0 + d * 0.3) + Vec3::splat(0.5 - d * 0.02)
}

/// Local contrast: add back `detail = center − wide blur`, weighted toward
/// midtones with `w = 1 − 2|lum − 0.5|`. Flat regions are left alone.
pub fn apply_clarity(c: Vec3, detail: Vec3, clarity: f32) -> Vec3 {
    let l = luminance(c);
    let w = (1.0 - 2.0 * (l - 0.5).abs()).max(0.0);
    c + detail * (clarity / 100.0 * w)
}

pub fn apply_texture(c: Vec3, luma_delta: f32, texture: f32) -> Vec3 {
    c + Vec3::splat(luma_delta * texture / 100.0)
}

/// Unsharp mask: add back `detail = center − blur`, gated by edge strength.
pub fn apply_sharpening(c: Vec3, detail: Vec3, sharpening: &Sharpening) -> Vec3 {
    let amount = sharpening.amount / 100.0;
    let gain = amount * (0.5 + sharpening.detail / 100.0);
    let edge = luminance(detail).abs();
    let gate = smoothstep(0.0, sharpening.masking / 100.0 * 0.1, edge);
    c + detail * (gain * gate)
}

pub fn apply_vignette(c: Vec3, at: &FramePosition, vignette: &Vignette) -> Vec3 {
    let amount = vignette.amount / 100.0;
    if amount == 0.0 {
        return c;
    }
    let roundness = (vignette.roundness / 100.0 + 1.0) * 0.5;
    let mut p = at.uv - Vec2::splat(0.5);
    p.x *= 1.0 + (at.aspect - 1.0) * roundness;
    let dist = p.length() * 2.0;

    let mid = vignette.midpoint / 100.0;
    let feather = (vignette.feather / 100.0).max(0.01);
    let falloff = smoothstep(mid, mid + feather, dist);

    let mut factor = 1.0 + amount * falloff;
    if amount < 0.0 {
        let protect = vignette.highlights / 100.0 * smoothstep(0.5, 1.0, luminance(c));
        factor += (1.0 - factor) * protect;
    }
    c * factor
}

/// Deterministic value noise in `0..1` keyed by a cell coordinate.
pub fn grain_hash(cell: Vec2) -> f32 {
    let v = (cell.dot(Vec2::new(12.9898, 78.233))).sin() * 43758.5453;
    v - v.floor()
}

pub fn apply_grain(c: Vec3, pixel: Vec2, grain: &Grain) -> Vec3 {
    let amount = grain.amount / 100.0;
    if amount <= 0.0 {
        return c;
    }
    let cell_size = 1.0 + grain.size.max(0.0) / 25.0;
    let cell = (pixel / cell_size).floor();
    let coarse = grain_hash(cell) - 0.5;
    let fine = grain_hash(cell * 2.0 + Vec2::splat(17.0)) - 0.5;
    let noise = coarse + (fine - coarse) * (grain.roughness / 100.0 * 0.5);
    c + Vec3::splat(noise * amount * 0.2)
}

/// Bilinear sample with clamp-to-edge, matching a linear GPU sampler.
pub fn sample_bilinear(src: &SourceImage, uv: Vec2) -> Vec4 {
    let p = uv * Vec2::new(src.width() as f32, src.height() as f32) - Vec2::splat(0.5);
    let base = p.floor();
    let f = p - base;
    let (x, y) = (base.x as i64, base.y as i64);

    let texel = |dx: i64, dy: i64| {
        let px = src.pixel_clamped(x + dx, y + dy);
        Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32) / 255.0
    };
    let top = texel(0, 0).lerp(texel(1, 0), f.x);
    let bottom = texel(0, 1).lerp(texel(1, 1), f.x);
    top.lerp(bottom, f.y)
}

/// Gather the sharpening and texture neighbourhood around `uv`.
pub fn gather_neighborhood(src: &SourceImage, uv: Vec2, radius: f32) -> Neighborhood {
    let texel = Vec2::new(1.0 / src.width() as f32, 1.0 / src.height() as f32);
    let r = radius.clamp(0.5, 3.0);
    let d = r * std::f32::consts::FRAC_1_SQRT_2;
    let taps = [
        Vec2::new(r, 0.0),
        Vec2::new(-r, 0.0),
        Vec2::new(0.0, r),
        Vec2::new(0.0, -r),
        Vec2::new(d, d),
        Vec2::new(-d, d),
        Vec2::new(d, -d),
        Vec2::new(-d, -d),
    ];
    let blur = taps
        .iter()
        .map(|&o| sample_bilinear(src, uv + o * texel).truncate())
        .sum::<Vec3>()
        / taps.len() as f32;

    let neighbor_luma = [
        Vec2::new(1.0, 0.0),
        Vec2::new(-1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(0.0, -1.0),
    ]
    .iter()
    .map(|&o| luminance(sample_bilinear(src, uv + o * texel).truncate()))
    .sum::<f32>()
        / 4.0;

    let wide_blur = [
        Vec2::new(CLARITY_RADIUS, 0.0),
        Vec2::new(-CLARITY_RADIUS, 0.0),
        Vec2::new(0.0, CLARITY_RADIUS),
        Vec2::new(0.0, -CLARITY_RADIUS),
    ]
    .iter()
    .map(|&o| sample_bilinear(src, uv + o * texel).truncate())
    .sum::<Vec3>()
        / 4.0;

    Neighborhood {
        blur,
        neighbor_luma,
        wide_blur,
    }
}

/// Develop a whole image on the CPU at `width × height`, returning RGBA8.
pub fn develop_image(
    src: &SourceImage,
    params: &EditParameters,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let constants = DevelopConstants::derive(params);
    develop_image_with(src, params, &constants, width, height)
}

/// [`develop_image`] with caller-derived constants, used by mask layers.
pub fn develop_image_with(
    src: &SourceImage,
    params: &EditParameters,
    constants: &DevelopConstants,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let size = Vec2::new(width as f32, height as f32);
    let aspect = width as f32 / height.max(1) as f32;

    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let uv = pixel / size;
            let center = sample_bilinear(src, uv);
            let around = gather_neighborhood(src, uv, params.sharpening.radius);
            let at = FramePosition { uv, pixel, aspect };
            let rgb = evaluate_pixel(center.truncate(), &around, &at, params, constants);
            out.extend_from_slice(&[
                to_unorm8(rgb.x),
                to_unorm8(rgb.y),
                to_unorm8(rgb.z),
                to_unorm8(center.w),
            ]);
        }
    }
    out
}

/// Quantize a normalized value the way an `Rgba8Unorm` target stores it.
pub fn to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::params::{HueBand, ToneCurve};

    fn gradient(width: u32, height: u32) -> SourceImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / (width - 1)) as u8;
                let g = (y * 255 / (height - 1)) as u8;
                pixels.extend_from_slice(&[r, g, 100, 255]);
            }
        }
        SourceImage::from_rgba8(width, height, pixels).expect("valid gradient")
    }

    fn max_channel_diff(a: &[u8], b: &[u8]) -> i32 {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x as i32 - y as i32).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_neutral_params_pass_through() {
        let src = gradient(16, 12);
        let out = develop_image(&src, &EditParameters::default(), 16, 12);
        let diff = max_channel_diff(src.as_bytes(), &out);
        assert!(diff <= 1, "neutral develop changed pixels by {diff}");
    }

    #[test]
    fn test_exposure_plus_one_doubles() {
        let mut pixels = Vec::new();
        for v in [10u8, 40, 64, 100, 127] {
            pixels.extend_from_slice(&[v, v / 2, v, 255]);
        }
        let src = SourceImage::from_rgba8(5, 1, pixels).expect("valid image");
        let mut params = EditParameters::default();
        params.exposure = 1.0;
        let out = develop_image(&src, &params, 5, 1);
        for (i, (a, b)) in src.as_bytes().iter().zip(out.iter()).enumerate() {
            if i % 4 == 3 {
                assert_eq!(a, b, "alpha must pass through");
                continue;
            }
            let expected = (*a as i32 * 2).min(255);
            assert!(
                (*b as i32 - expected).abs() <= 1,
                "byte {i}: in={a} out={b} expected={expected}"
            );
        }
    }

    #[test]
    fn test_exposure_is_not_clamped_between_stages() {
        // +1 stop then −1 stop of contrast-neutral exposure: headroom above 1.0
        // survives until the curve stage.
        let c = apply_exposure(Vec3::splat(0.8), 1.0);
        assert!(c.x > 1.0);
        let back = apply_exposure(c, -1.0);
        assert!((back.x - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_contrast_zero_is_identity_and_pivots_at_half() {
        let c = Vec3::new(0.2, 0.5, 0.9);
        assert!((apply_contrast(c, 0.0) - c).abs().max_element() < 1e-6);
        let mid = apply_contrast(Vec3::splat(0.5), 80.0);
        assert!((mid.x - 0.5).abs() < 1e-6);
        assert!(apply_contrast(Vec3::splat(0.8), 50.0).x > 0.8);
        assert!(apply_contrast(Vec3::splat(0.8), -50.0).x < 0.8);
    }

    #[test]
    fn test_contrast_stays_finite_at_extremes() {
        for contrast in [-1000.0, -100.0, 100.0, 101.57, 1000.0] {
            let c = apply_contrast(Vec3::new(0.1, 0.5, 0.9), contrast);
            assert!(c.is_finite(), "contrast {contrast} produced {c:?}");
        }
        let flat = apply_contrast(Vec3::new(0.1, 0.5, 0.9), -100.0);
        assert!((flat - Vec3::splat(0.5)).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_temperature_warms_and_cools() {
        let c = Vec3::splat(0.5);
        let warm = apply_white_balance(c, 50.0, 0.0);
        assert!(warm.x > c.x && warm.z < c.z);
        let magenta = apply_white_balance(c, 0.0, 50.0);
        assert!(magenta.y < c.y);
    }

    #[test]
    fn test_tone_bands_target_their_range() {
        let mut params = EditParameters::default();
        params.shadows = 100.0;
        let dark = apply_tone_bands(Vec3::splat(0.1), &params) - Vec3::splat(0.1);
        let bright = apply_tone_bands(Vec3::splat(0.9), &params) - Vec3::splat(0.9);
        assert!(dark.x > 0.2);
        assert!(bright.x.abs() < 1e-6);
    }

    #[test]
    fn test_hsl_band_only_affects_its_hue() {
        let mut hsl = HslAdjustments::default();
        hsl.blue = HueBand {
            hue: 0.0,
            saturation: -100.0,
            luminance: 0.0,
        };
        let blue = apply_hsl(Vec3::new(0.1, 0.1, 0.8), &hsl);
        assert!((blue.x - blue.z).abs() < 1e-3, "blue should desaturate: {blue:?}");
        let red = Vec3::new(0.8, 0.1, 0.1);
        assert!((apply_hsl(red, &hsl) - red).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_hsl_leaves_grays_alone() {
        let mut hsl = HslAdjustments::default();
        hsl.red.luminance = 100.0;
        let gray = Vec3::splat(0.4);
        assert!((apply_hsl(gray, &hsl) - gray).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_vibrance_boosts_muted_more_than_saturated() {
        let muted = Vec3::new(0.5, 0.45, 0.4);
        let vivid = Vec3::new(0.9, 0.1, 0.1);
        let chroma = |c: Vec3| c.max_element() - c.min_element();
        let muted_gain = chroma(apply_vibrance(muted, 100.0)) / chroma(muted);
        let vivid_gain = chroma(apply_vibrance(vivid, 100.0)) / chroma(vivid);
        assert!(muted_gain > vivid_gain);
    }

    #[test]
    fn test_saturation_minus_100_is_monochrome() {
        let c = apply_saturation(Vec3::new(0.8, 0.4, 0.2), -100.0);
        assert!((c.x - c.y).abs() < 1e-6 && (c.y - c.z).abs() < 1e-6);
    }

    #[test]
    fn test_grading_weights_partition_unity() {
        let grading = ColorGrading::default();
        for i in 0..=20 {
            let w = grading_weights(i as f32 / 20.0, &grading);
            assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5, "l={}: {w:?}", i as f32 / 20.0);
        }
        let dark = grading_weights(0.05, &grading);
        assert!(dark.x > dark.z);
    }

    #[test]
    fn test_grading_balance_shifts_split() {
        let mut grading = ColorGrading::default();
        let neutral = grading_weights(0.5, &grading).z;
        grading.balance = 100.0;
        assert!(grading_weights(0.5, &grading).z > neutral);
    }

    #[test]
    fn test_shadow_grading_tints_dark_pixels() {
        let mut params = EditParameters::default();
        params.color_grading.shadows.hue = 240.0;
        params.color_grading.shadows.saturation = 100.0;
        let constants = DevelopConstants::derive(&params);
        let dark = apply_color_grading(Vec3::splat(0.1), &params.color_grading, &constants.grade_tints);
        assert!(dark.z > dark.x);
        let bright = apply_color_grading(Vec3::splat(0.95), &params.color_grading, &constants.grade_tints);
        assert!((bright.z - bright.x).abs() < 1e-3);
    }

    #[test]
    fn test_calibration_neutral_is_identity() {
        let c = Vec3::new(0.3, 0.6, 0.2);
        assert_eq!(apply_calibration(c, &Calibration::default()), c);
    }

    #[test]
    fn test_clarity_weight_vanishes_at_extremes() {
        let detail = Vec3::splat(0.2);
        assert_eq!(apply_clarity(Vec3::ZERO, detail, 100.0), Vec3::ZERO);
        assert_eq!(apply_clarity(Vec3::ONE, detail, 100.0), Vec3::ONE);
        let mid = apply_clarity(Vec3::splat(0.5), detail, 100.0);
        assert!((mid.x - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_clarity_leaves_flat_regions_alone() {
        let mut params = EditParameters::default();
        params.clarity = 100.0;
        let src = SourceImage::filled(12, 12, [128, 128, 128, 255]).expect("valid image");
        let out = develop_image(&src, &params, 12, 12);
        assert!(max_channel_diff(src.as_bytes(), &out) <= 1);
    }

    #[test]
    fn test_clarity_steepens_midtone_edges() {
        // Left half 100, right half 156: a midtone step edge.
        let mut pixels = Vec::new();
        for _ in 0..4 {
            for x in 0..16 {
                let v = if x < 8 { 100u8 } else { 156 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let src = SourceImage::from_rgba8(16, 4, pixels).expect("valid image");
        let mut params = EditParameters::default();
        params.clarity = 100.0;
        let out = develop_image(&src, &params, 16, 4);
        let at = |x: usize| out[(16 + x) * 4] as i32;
        assert!(at(7) < 100, "dark side of the edge should darken: {}", at(7));
        assert!(at(8) > 156, "bright side of the edge should brighten: {}", at(8));
        assert!((at(0) - 100).abs() <= 1, "far from the edge stays put");
    }

    #[test]
    fn test_layer_constants_run_local_curve_after_global() {
        let mut params = EditParameters::default();
        params.tone_curve = ToneCurve::new(vec![[0.0, 0.0], [128.0, 192.0], [255.0, 255.0]]);
        let invert = ToneCurve::new(vec![[0.0, 255.0], [255.0, 0.0]]);
        let layer = DevelopConstants::derive_layer(&params, &invert);
        assert_eq!(layer.curve.table[128], CurveLut::build(&invert).table[192]);

        let unchanged = DevelopConstants::derive_layer(&params, &ToneCurve::default());
        assert_eq!(unchanged.curve, DevelopConstants::derive(&params).curve);
    }

    #[test]
    fn test_sharpening_adds_detail_scaled_by_amount() {
        let mut sharpening = Sharpening::default();
        let c = Vec3::splat(0.5);
        let detail = Vec3::splat(0.1);
        assert_eq!(apply_sharpening(c, detail, &sharpening), c);
        sharpening.amount = 100.0;
        let sharp = apply_sharpening(c, detail, &sharpening);
        assert!((sharp.x - (0.5 + 0.1 * 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_sharpening_masking_suppresses_flat_areas() {
        let sharpening = Sharpening {
            amount: 100.0,
            masking: 100.0,
            ..Sharpening::default()
        };
        let c = Vec3::splat(0.5);
        let faint = apply_sharpening(c, Vec3::splat(0.001), &sharpening);
        let strong = apply_sharpening(c, Vec3::splat(0.2), &sharpening);
        assert!((faint.x - 0.5).abs() < 1e-4);
        assert!(strong.x > 0.6);
    }

    #[test]
    fn test_vignette_darkens_corners_not_center() {
        let vignette = Vignette {
            amount: -100.0,
            ..Vignette::default()
        };
        let at = |u: f32, v: f32| FramePosition {
            uv: Vec2::new(u, v),
            pixel: Vec2::ZERO,
            aspect: 1.5,
        };
        let c = Vec3::splat(0.5);
        assert_eq!(apply_vignette(c, &at(0.5, 0.5), &vignette), c);
        assert!(apply_vignette(c, &at(0.0, 0.0), &vignette).x < 0.05);
    }

    #[test]
    fn test_grain_is_deterministic_and_cell_quantized() {
        let grain = Grain {
            amount: 100.0,
            size: 75.0,
            ..Grain::default()
        };
        let c = Vec3::splat(0.5);
        let a = apply_grain(c, Vec2::new(0.5, 0.5), &grain);
        let b = apply_grain(c, Vec2::new(0.5, 0.5), &grain);
        assert_eq!(a, b);
        // Cell size is 4px at size 75: pixels in the same cell share noise.
        let same_cell = apply_grain(c, Vec2::new(2.5, 3.5), &grain);
        assert_eq!(a, same_cell);
    }

    #[test]
    fn test_tone_curve_applies_through_constants() {
        let mut params = EditParameters::default();
        params.tone_curve = ToneCurve::new(vec![[0.0, 255.0], [255.0, 0.0]]);
        let src = SourceImage::filled(2, 2, [0, 0, 0, 255]).expect("valid image");
        let out = develop_image(&src, &params, 2, 2);
        assert_eq!(&out[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_develop_resamples_to_requested_size() {
        let src = gradient(8, 8);
        let out = develop_image(&src, &EditParameters::default(), 4, 2);
        assert_eq!(out.len(), 4 * 2 * 4);
    }
}
