//! GPU uniform layout for the develop programs.
//!
//! Mirrors `DevelopUniforms` in `develop_common.wgsl`. Every field is a
//! `vec4<f32>` so the Rust and WGSL layouts agree without padding rules.

use lumen_core::EditParameters;
use lumen_core::transform::evaluate::DevelopConstants;
use lumen_core::transform::params::HueBand;

/// GPU-side develop parameters. 23 × 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DevelopUniforms {
    pub tone: [f32; 4],
    pub bands: [f32; 4],
    pub color: [f32; 4],
    pub detail: [f32; 4],
    pub detail2: [f32; 4],
    pub hsl_red: [f32; 4],
    pub hsl_orange: [f32; 4],
    pub hsl_yellow: [f32; 4],
    pub hsl_green: [f32; 4],
    pub hsl_aqua: [f32; 4],
    pub hsl_blue: [f32; 4],
    pub hsl_purple: [f32; 4],
    pub hsl_magenta: [f32; 4],
    pub grade_shadows: [f32; 4],
    pub grade_midtones: [f32; 4],
    pub grade_highlights: [f32; 4],
    pub grade: [f32; 4],
    pub calib0: [f32; 4],
    pub calib1: [f32; 4],
    pub vignette0: [f32; 4],
    pub vignette1: [f32; 4],
    pub frame: [f32; 4],
    pub flags: [f32; 4],
}

fn band(b: &HueBand) -> [f32; 4] {
    [b.hue, b.saturation, b.luminance, 0.0]
}

fn flag(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}

impl DevelopUniforms {
    /// Pack a parameter snapshot for a pass over a `source` image into an
    /// `output` target.
    pub fn pack(
        params: &EditParameters,
        constants: &DevelopConstants,
        source: (u32, u32),
        output: (u32, u32),
    ) -> Self {
        let hsl = &params.hsl;
        let grading = &params.color_grading;
        let cal = &params.calibration;
        let vig = &params.vignette;
        let zone = |i: usize| {
            let (tint, strength) = constants.grade_tints[i];
            [tint.x, tint.y, tint.z, strength]
        };

        Self {
            tone: [
                params.exposure,
                params.contrast,
                params.temperature,
                params.tint,
            ],
            bands: [params.highlights, params.shadows, params.whites, params.blacks],
            color: [params.vibrance, params.saturation, params.dehaze, params.clarity],
            detail: [
                params.texture,
                params.sharpening.amount,
                params.sharpening.radius,
                params.sharpening.detail,
            ],
            detail2: [
                params.sharpening.masking,
                params.grain.amount,
                params.grain.size,
                params.grain.roughness,
            ],
            hsl_red: band(&hsl.red),
            hsl_orange: band(&hsl.orange),
            hsl_yellow: band(&hsl.yellow),
            hsl_green: band(&hsl.green),
            hsl_aqua: band(&hsl.aqua),
            hsl_blue: band(&hsl.blue),
            hsl_purple: band(&hsl.purple),
            hsl_magenta: band(&hsl.magenta),
            grade_shadows: zone(0),
            grade_midtones: zone(1),
            grade_highlights: zone(2),
            grade: [grading.blending, grading.balance, 0.0, 0.0],
            calib0: [cal.shadow_tint, cal.red_hue, cal.red_saturation, cal.green_hue],
            calib1: [cal.green_saturation, cal.blue_hue, cal.blue_saturation, 0.0],
            vignette0: [vig.amount, vig.midpoint, vig.roundness, vig.feather],
            vignette1: [vig.highlights, 0.0, 0.0, 0.0],
            frame: [
                1.0 / source.0.max(1) as f32,
                1.0 / source.1.max(1) as f32,
                output.0 as f32,
                output.1 as f32,
            ],
            flags: [flag(constants.curve.enabled), flag(constants.hsl_enabled), 0.0, 0.0],
        }
    }
}
