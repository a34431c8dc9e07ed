//! Tone-curve 1D LUT building.
//!
//! Sparse control points become a dense 256-entry table so the shader does a
//! single texel fetch per channel instead of evaluating the curve per pixel.
//!
//! # Algorithm
//! For each level `i` in `0..256`, find the control points bracketing `i`,
//! parameterize linearly and ease with smoothstep before interpolating:
//! ```text
//! t = (i − x0) / (x1 − x0)
//! y = y0 + (y1 − y0) × (3t² − 2t³)
//! ```
//! Smoothstep has zero slope at both ends of each segment, so the curve is
//! C¹ at the control points and never overshoots between monotonic neighbours.

use std::borrow::Cow;

use crate::transform::color::smoothstep;
use crate::transform::params::ToneCurve;

/// Number of entries in the tone-curve LUT.
pub const CURVE_LUT_SIZE: usize = 256;

/// Control points within this distance of the diagonal count as identity.
const IDENTITY_TOLERANCE: f32 = 0.5;

/// A baked tone curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveLut {
    /// Output level for each input level.
    pub table: [u8; CURVE_LUT_SIZE],
    /// `false` when the curve is numerically identity and lookups can be
    /// skipped entirely.
    pub enabled: bool,
}

impl Default for CurveLut {
    fn default() -> Self {
        Self::identity()
    }
}

impl CurveLut {
    pub fn identity() -> Self {
        Self {
            table: std::array::from_fn(|i| i as u8),
            enabled: false,
        }
    }

    /// Bake a tone curve into a 256-entry table.
    ///
    /// Fewer than two control points produce the identity table.
    pub fn build(curve: &ToneCurve) -> Self {
        if curve.points.len() < 2 {
            return Self::identity();
        }

        // A diagonal curve would still ease between its points; short-circuit
        // to the exact identity table instead.
        if is_identity(&curve.points) {
            return Self::identity();
        }

        let points: Cow<'_, [[f32; 2]]> = if curve.points.windows(2).all(|w| w[0][0] <= w[1][0]) {
            Cow::Borrowed(curve.points.as_slice())
        } else {
            let mut sorted = curve.points.clone();
            sorted.sort_by(|a, b| a[0].total_cmp(&b[0]));
            Cow::Owned(sorted)
        };

        let table = std::array::from_fn(|level| {
            let y = evaluate_sorted(&points, level as f32);
            y.round().clamp(0.0, 255.0) as u8
        });

        Self {
            table,
            enabled: true,
        }
    }

    /// The curve `self` followed by `next`, baked into one table.
    pub fn then(&self, next: &CurveLut) -> CurveLut {
        if !next.enabled {
            return self.clone();
        }
        if !self.enabled {
            return next.clone();
        }
        let table: [u8; CURVE_LUT_SIZE] = std::array::from_fn(|i| next.table[self.table[i] as usize]);
        Self {
            table,
            enabled: table != Self::identity().table,
        }
    }

    /// Look up a normalized channel value. Out-of-range inputs use the end
    /// entries.
    pub fn lookup(&self, value: f32) -> f32 {
        let index = (value.clamp(0.0, 1.0) * 255.0).round() as usize;
        self.table[index] as f32 / 255.0
    }

    /// The table replicated across RGBA for upload as an `Rgba8Unorm` texture.
    pub fn to_rgba8(&self) -> [[u8; 4]; CURVE_LUT_SIZE] {
        std::array::from_fn(|i| {
            let v = self.table[i];
            [v, v, v, 255]
        })
    }
}

/// Whether every control point lies on the diagonal.
fn is_identity(points: &[[f32; 2]]) -> bool {
    points
        .iter()
        .all(|p| (p[0] - p[1]).abs() <= IDENTITY_TOLERANCE)
}

/// Evaluate a curve with points sorted by x at level `x`.
fn evaluate_sorted(points: &[[f32; 2]], x: f32) -> f32 {
    let first = points[0];
    let last = points[points.len() - 1];
    if x <= first[0] {
        return first[1];
    }
    if x >= last[0] {
        return last[1];
    }

    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        if x >= p0[0] && x <= p1[0] {
            let span = p1[0] - p0[0];
            if span <= f32::EPSILON {
                return p1[1];
            }
            let t = (x - p0[0]) / span;
            return p0[1] + (p1[1] - p0[1]) * smoothstep(0.0, 1.0, t);
        }
    }
    last[1]
}
