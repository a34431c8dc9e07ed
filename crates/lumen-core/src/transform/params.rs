//! Central parameter snapshot that defines the entire develop transform.
//!
//! `EditParameters` is the contract between the external edit-state store and
//! the renderer. Every field defaults to neutral, and `#[serde(default)]` on
//! every struct means a partial snapshot resolves to neutral for whatever is
//! missing. Out-of-range values are accepted here and clamped inside the
//! formula that consumes them.

use serde::{Deserialize, Serialize};

use crate::mask::MaskAdjustments;

/// Adjustment for one of the eight hue bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueBand {
    /// Hue shift, −100..100 (maps to ±30°).
    pub hue: f32,
    /// Saturation shift, −100..100.
    pub saturation: f32,
    /// Luminance shift, −100..100.
    pub luminance: f32,
}

impl HueBand {
    pub fn is_neutral(&self) -> bool {
        self.hue == 0.0 && self.saturation == 0.0 && self.luminance == 0.0
    }

    fn offset(&self, delta: &HueBand) -> HueBand {
        HueBand {
            hue: self.hue + delta.hue,
            saturation: self.saturation + delta.saturation,
            luminance: self.luminance + delta.luminance,
        }
    }
}

/// The eight hue bands, named by their center hue.
///
/// Kept as named fields rather than an array: the shader evaluates them as an
/// unrolled ladder and the uniform layout mirrors that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HslAdjustments {
    /// Centered at 0°.
    pub red: HueBand,
    /// Centered at 30°.
    pub orange: HueBand,
    /// Centered at 60°.
    pub yellow: HueBand,
    /// Centered at 120°.
    pub green: HueBand,
    /// Centered at 180°.
    pub aqua: HueBand,
    /// Centered at 240°.
    pub blue: HueBand,
    /// Centered at 280°.
    pub purple: HueBand,
    /// Centered at 320°.
    pub magenta: HueBand,
}

impl HslAdjustments {
    /// Bands paired with their center hue in degrees, in ladder order.
    pub fn bands(&self) -> [(f32, &HueBand); 8] {
        [
            (0.0, &self.red),
            (30.0, &self.orange),
            (60.0, &self.yellow),
            (120.0, &self.green),
            (180.0, &self.aqua),
            (240.0, &self.blue),
            (280.0, &self.purple),
            (320.0, &self.magenta),
        ]
    }

    pub fn is_neutral(&self) -> bool {
        self.bands().iter().all(|(_, band)| band.is_neutral())
    }

    /// Band-wise sum with a set of deltas.
    pub fn offset(&self, delta: &HslAdjustments) -> HslAdjustments {
        HslAdjustments {
            red: self.red.offset(&delta.red),
            orange: self.orange.offset(&delta.orange),
            yellow: self.yellow.offset(&delta.yellow),
            green: self.green.offset(&delta.green),
            aqua: self.aqua.offset(&delta.aqua),
            blue: self.blue.offset(&delta.blue),
            purple: self.purple.offset(&delta.purple),
            magenta: self.magenta.offset(&delta.magenta),
        }
    }
}

/// Hue and strength of one color-grading zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeZone {
    /// Tint hue in degrees, 0..360.
    pub hue: f32,
    /// Tint strength, 0..100.
    pub saturation: f32,
}

impl GradeZone {
    fn offset(&self, delta: &GradeZone) -> GradeZone {
        GradeZone {
            hue: self.hue + delta.hue,
            saturation: self.saturation + delta.saturation,
        }
    }
}

/// Three-way color grading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrading {
    pub shadows: GradeZone,
    pub midtones: GradeZone,
    pub highlights: GradeZone,
    /// Softness of the zone transitions, 0..100. Default: 50.
    pub blending: f32,
    /// Shifts the shadow/highlight split, −100..100.
    pub balance: f32,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            shadows: GradeZone::default(),
            midtones: GradeZone::default(),
            highlights: GradeZone::default(),
            blending: 50.0,
            balance: 0.0,
        }
    }
}

/// Unsharp-mask sharpening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sharpening {
    /// Strength, 0..150.
    pub amount: f32,
    /// Blur radius in texels, 0.5..3.0. Default: 1.0.
    pub radius: f32,
    /// Detail emphasis, 0..100. Default: 25.
    pub detail: f32,
    /// Edge masking, 0..100. Higher values restrict sharpening to edges.
    pub masking: f32,
}

impl Default for Sharpening {
    fn default() -> Self {
        Self {
            amount: 0.0,
            radius: 1.0,
            detail: 25.0,
            masking: 0.0,
        }
    }
}

/// Post-crop style vignette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vignette {
    /// −100 darkens the corners, +100 lightens them.
    pub amount: f32,
    /// Distance from center where the falloff starts, 0..100. Default: 50.
    pub midpoint: f32,
    /// −100 follows the frame aspect, +100 is circular.
    pub roundness: f32,
    /// Falloff width, 0..100. Default: 50.
    pub feather: f32,
    /// Highlight protection for darkening vignettes, 0..100.
    pub highlights: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            amount: 0.0,
            midpoint: 50.0,
            roundness: 0.0,
            feather: 50.0,
            highlights: 0.0,
        }
    }
}

/// Film grain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grain {
    /// Strength, 0..100.
    pub amount: f32,
    /// Grain cell size, 0..100. Default: 25.
    pub size: f32,
    /// Second-octave mix, 0..100. Default: 50.
    pub roughness: f32,
}

impl Default for Grain {
    fn default() -> Self {
        Self {
            amount: 0.0,
            size: 25.0,
            roughness: 50.0,
        }
    }
}

/// Camera calibration: shadow tint and primary shifts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Green (−) to magenta (+) tint in the shadows, −100..100.
    pub shadow_tint: f32,
    pub red_hue: f32,
    pub red_saturation: f32,
    pub green_hue: f32,
    pub green_saturation: f32,
    pub blue_hue: f32,
    pub blue_saturation: f32,
}

impl Calibration {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    fn offset(&self, delta: &Calibration) -> Calibration {
        Calibration {
            shadow_tint: self.shadow_tint + delta.shadow_tint,
            red_hue: self.red_hue + delta.red_hue,
            red_saturation: self.red_saturation + delta.red_saturation,
            green_hue: self.green_hue + delta.green_hue,
            green_saturation: self.green_saturation + delta.green_saturation,
            blue_hue: self.blue_hue + delta.blue_hue,
            blue_saturation: self.blue_saturation + delta.blue_saturation,
        }
    }
}

/// Tone curve control points as `[x, y]` pairs in `0..=255`.
///
/// Fewer than two points is the identity curve. Points need not be sorted;
/// the LUT builder sorts them by x.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneCurve {
    pub points: Vec<[f32; 2]>,
}

impl ToneCurve {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    /// The explicit two-point identity curve.
    pub fn linear() -> Self {
        Self::new(vec![[0.0, 0.0], [255.0, 255.0]])
    }
}

/// Every slider writes here. The develop shader reads the full snapshot.
/// This is the immutable contract between the edit-state store and the GPU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditParameters {
    // Basic tone
    /// Exposure in stops. Applied as a `2^exposure` multiplier.
    pub exposure: f32,
    /// Contrast, −100..100.
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,

    // White balance
    /// Blue (−) to yellow (+), −100..100.
    pub temperature: f32,
    /// Green (−) to magenta (+), −100..100.
    pub tint: f32,

    // Presence
    pub vibrance: f32,
    /// −100 is monochrome, +100 doubles chroma.
    pub saturation: f32,
    pub texture: f32,
    pub clarity: f32,
    pub dehaze: f32,

    pub hsl: HslAdjustments,
    pub color_grading: ColorGrading,
    pub tone_curve: ToneCurve,
    pub sharpening: Sharpening,
    pub vignette: Vignette,
    pub grain: Grain,
    pub calibration: Calibration,
}

impl Default for EditParameters {
    /// Produces a neutral (no-op) transform — the image passes through unchanged.
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            temperature: 0.0,
            tint: 0.0,
            vibrance: 0.0,
            saturation: 0.0,
            texture: 0.0,
            clarity: 0.0,
            dehaze: 0.0,
            hsl: HslAdjustments::default(),
            color_grading: ColorGrading::default(),
            tone_curve: ToneCurve::default(),
            sharpening: Sharpening::default(),
            vignette: Vignette::default(),
            grain: Grain::default(),
            calibration: Calibration::default(),
        }
    }
}

impl EditParameters {
    /// Parse a snapshot from JSON. Missing fields resolve to neutral.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// The global snapshot with a mask's local deltas folded in.
    ///
    /// See [`EditParameters::merge_local_into`] for the merge rules.
    pub fn with_local(&self, local: &MaskAdjustments) -> Self {
        let mut merged = Self::default();
        self.merge_local_into(local, &mut merged);
        merged
    }

    /// Write the global snapshot plus a mask's deltas into `out`, reusing
    /// its tone-curve allocation.
    ///
    /// Every field accumulates field-wise, nested structures included. Local
    /// `sharpness` adds to `sharpening.amount` on top of the local
    /// `sharpening.amount` delta. The local tone curve is not merged here: it
    /// runs after the global curve, see
    /// [`DevelopConstants::derive_layer`](crate::transform::evaluate::DevelopConstants::derive_layer).
    pub fn merge_local_into(&self, local: &MaskAdjustments, out: &mut Self) {
        out.exposure = self.exposure + local.exposure;
        out.contrast = self.contrast + local.contrast;
        out.highlights = self.highlights + local.highlights;
        out.shadows = self.shadows + local.shadows;
        out.whites = self.whites + local.whites;
        out.blacks = self.blacks + local.blacks;
        out.temperature = self.temperature + local.temperature;
        out.tint = self.tint + local.tint;
        out.vibrance = self.vibrance + local.vibrance;
        out.saturation = self.saturation + local.saturation;
        out.texture = self.texture + local.texture;
        out.clarity = self.clarity + local.clarity;
        out.dehaze = self.dehaze + local.dehaze;

        out.hsl = self.hsl.offset(&local.hsl);

        let (g, dg) = (&self.color_grading, &local.color_grading);
        out.color_grading = ColorGrading {
            shadows: g.shadows.offset(&dg.shadows),
            midtones: g.midtones.offset(&dg.midtones),
            highlights: g.highlights.offset(&dg.highlights),
            blending: g.blending + dg.blending,
            balance: g.balance + dg.balance,
        };

        out.tone_curve.points.clone_from(&self.tone_curve.points);

        let (s, ds) = (&self.sharpening, &local.sharpening);
        out.sharpening = Sharpening {
            amount: s.amount + ds.amount + local.sharpness,
            radius: s.radius + ds.radius,
            detail: s.detail + ds.detail,
            masking: s.masking + ds.masking,
        };

        let (v, dv) = (&self.vignette, &local.vignette);
        out.vignette = Vignette {
            amount: v.amount + dv.amount,
            midpoint: v.midpoint + dv.midpoint,
            roundness: v.roundness + dv.roundness,
            feather: v.feather + dv.feather,
            highlights: v.highlights + dv.highlights,
        };

        let (gr, dgr) = (&self.grain, &local.grain);
        out.grain = Grain {
            amount: gr.amount + dgr.amount,
            size: gr.size + dgr.size,
            roughness: gr.roughness + dgr.roughness,
        };

        out.calibration = self.calibration.offset(&local.calibration);
    }
}
