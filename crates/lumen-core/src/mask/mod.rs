//! Local-adjustment masks: declarative region selectors plus delta adjustments.
//!
//! Masks are owned by the calling session. The renderer and rasterizer only
//! borrow them for the duration of one call.

pub mod raster;

use serde::{Deserialize, Serialize};

use crate::transform::params::{Calibration, GradeZone, HslAdjustments, ToneCurve};

/// Delta adjustments applied inside a mask, on top of the global snapshot.
///
/// Same shape and units as [`EditParameters`](crate::EditParameters), read
/// as offsets: every scalar adds to its global counterpart. Two exceptions:
/// `sharpness` also folds into the global sharpening amount, and
/// `tone_curve` runs after the global curve instead of summing with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskAdjustments {
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub temperature: f32,
    pub tint: f32,
    pub vibrance: f32,
    pub saturation: f32,
    pub texture: f32,
    pub clarity: f32,
    pub dehaze: f32,
    pub sharpness: f32,

    pub hsl: HslAdjustments,
    pub color_grading: GradingDelta,
    pub tone_curve: ToneCurve,
    pub sharpening: SharpeningDelta,
    pub vignette: VignetteDelta,
    pub grain: GrainDelta,
    pub calibration: Calibration,
}

/// Offsets for [`ColorGrading`](crate::transform::params::ColorGrading).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingDelta {
    pub shadows: GradeZone,
    pub midtones: GradeZone,
    pub highlights: GradeZone,
    pub blending: f32,
    pub balance: f32,
}

/// Offsets for [`Sharpening`](crate::transform::params::Sharpening).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpeningDelta {
    pub amount: f32,
    pub radius: f32,
    pub detail: f32,
    pub masking: f32,
}

/// Offsets for [`Vignette`](crate::transform::params::Vignette).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteDelta {
    pub amount: f32,
    pub midpoint: f32,
    pub roundness: f32,
    pub feather: f32,
    pub highlights: f32,
}

/// Offsets for [`Grain`](crate::transform::params::Grain).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainDelta {
    pub amount: f32,
    pub size: f32,
    pub roughness: f32,
}

/// One sampled point of a brush stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushPoint {
    /// Normalized horizontal position, 0..1.
    pub x: f32,
    /// Normalized vertical position, 0..1.
    pub y: f32,
    /// Pen pressure, 0..1.
    pub pressure: f32,
}

impl Default for BrushPoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            pressure: 1.0,
        }
    }
}

/// A brush stroke: a run of stamped points sharing one brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushStroke {
    pub points: Vec<BrushPoint>,
    /// Brush diameter in source-image pixels.
    pub size: f32,
    /// Soft edge as a fraction of the radius, 0..1.
    pub feather: f32,
    /// Per-stamp strength, 0..1.
    pub flow: f32,
    /// Subtract from the mask instead of adding.
    pub erase: bool,
}

impl Default for BrushStroke {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            size: 50.0,
            feather: 0.5,
            flow: 1.0,
            erase: false,
        }
    }
}

/// Which luminance range a luminosity mask selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LuminosityRange {
    #[default]
    Highlights,
    Midtones,
    Shadows,
}

/// Geometry of a mask, tagged by mask type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MaskKind {
    /// Painted strokes, applied in append order.
    Brush {
        #[serde(default)]
        strokes: Vec<BrushStroke>,
    },
    /// Fully selected at `start`, fading linearly to nothing at `end`.
    /// Missing endpoints coincide, which selects nothing.
    #[serde(rename_all = "camelCase")]
    LinearGradient {
        /// Normalized `[x, y]`.
        #[serde(default)]
        start: [f32; 2],
        /// Normalized `[x, y]`.
        #[serde(default)]
        end: [f32; 2],
    },
    /// Fully selected inside the ellipse, feathered outside it.
    #[serde(rename_all = "camelCase")]
    RadialGradient {
        /// Normalized `[x, y]`.
        #[serde(default = "default_center")]
        center: [f32; 2],
        /// Horizontal radius as a fraction of the raster width. Zero selects
        /// nothing.
        #[serde(default)]
        radius_x: f32,
        /// Vertical radius as a fraction of the raster height.
        #[serde(default)]
        radius_y: f32,
        /// Width of the outer falloff band as a fraction of the radius.
        #[serde(default)]
        feather: f32,
        #[serde(default)]
        invert: bool,
    },
    /// Selects pixels by rendered luminance.
    Luminosity {
        #[serde(default)]
        range: LuminosityRange,
        /// 0..100. Default: 50.
        #[serde(default = "default_threshold")]
        threshold: f32,
        /// 0..100.
        #[serde(default)]
        feather: f32,
    },
}

impl MaskKind {
    /// Whether rasterizing this mask needs rendered pixels.
    pub fn needs_pixels(&self) -> bool {
        matches!(self, Self::Luminosity { .. })
    }
}

/// A local adjustment: where it applies and what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub id: String,
    #[serde(flatten)]
    pub kind: MaskKind,
    /// 0..100.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub adjustments: MaskAdjustments,
}

fn default_center() -> [f32; 2] {
    [0.5, 0.5]
}

fn default_threshold() -> f32 {
    50.0
}

fn default_opacity() -> f32 {
    100.0
}

fn default_enabled() -> bool {
    true
}

impl Mask {
    /// An enabled, fully opaque mask with no adjustments.
    pub fn new(id: impl Into<String>, kind: MaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
            opacity: default_opacity(),
            enabled: default_enabled(),
            adjustments: MaskAdjustments::default(),
        }
    }

    pub fn with_adjustments(mut self, adjustments: MaskAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Enabled masks in declaration order.
pub fn enabled_masks(masks: &[Mask]) -> impl Iterator<Item = &Mask> {
    masks.iter().filter(|mask| mask.enabled)
}
