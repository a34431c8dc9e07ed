//! Color math shared by the CPU reference transform, the mask rasterizer and
//! the uniform packer. The WGSL helpers in `develop_common.wgsl` mirror these.

use glam::Vec3;
use palette::{FromColor, Hsl, Srgb};

/// Rec. 709 luminance weights.
pub const LUMA_REC709: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Rec. 709 luminance.
pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(LUMA_REC709)
}

/// Cubic Hermite step `3t² − 2t³` of `x` between `edge0` and `edge1`.
///
/// Degenerate edges act as a hard step at `edge0`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Convert RGB to HSL (hue in degrees, saturation and lightness in 0..1).
pub fn rgb_to_hsl(rgb: Vec3) -> Vec3 {
    let max = rgb.max_element();
    let min = rgb.min_element();
    let lum = (max + min) * 0.5;
    let delta = max - min;

    if delta < 1e-6 {
        return Vec3::new(0.0, 0.0, lum);
    }

    let sat = if lum > 0.5 {
        delta / (2.0 - max - min).max(1e-6)
    } else {
        delta / (max + min).max(1e-6)
    };

    let hue = if max == rgb.x {
        (rgb.y - rgb.z) / delta + if rgb.y < rgb.z { 6.0 } else { 0.0 }
    } else if max == rgb.y {
        (rgb.z - rgb.x) / delta + 2.0
    } else {
        (rgb.x - rgb.y) / delta + 4.0
    };

    Vec3::new(hue * 60.0, sat, lum)
}

/// Convert HSL (hue in degrees) back to RGB.
pub fn hsl_to_rgb(hsl: Vec3) -> Vec3 {
    let (hue, sat, lum) = (hsl.x, hsl.y, hsl.z);
    if sat <= 0.0 {
        return Vec3::splat(lum);
    }

    let q = if lum < 0.5 {
        lum * (1.0 + sat)
    } else {
        lum + sat - lum * sat
    };
    let p = 2.0 * lum - q;
    let h = hue / 360.0;

    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Shortest angular distance between two hues, in degrees (0..=180).
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Signed tint offset for a color-grading zone hue.
///
/// The fully saturated color at `hue` minus mid-gray, so adding it pushes
/// toward the hue and leaves the average level untouched.
pub fn grading_tint(hue_degrees: f32) -> Vec3 {
    let hsl: Hsl = Hsl::new(hue_degrees, 1.0, 0.5);
    let rgb = Srgb::from_color(hsl);
    Vec3::new(rgb.red, rgb.green, rgb.blue) - Vec3::splat(0.5)
}
