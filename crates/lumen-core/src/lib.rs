//! Lumen Core — domain layer for non-destructive photo adjustments.
//!
//! Edit parameters, the tone-curve LUT, mask definitions and their CPU
//! rasterizer, plus a CPU reference of the develop transform and the mask
//! compositor. No GPU or framework dependencies.

pub mod composite;
pub mod image;
pub mod mask;
pub mod ping_pong;
pub mod transform;

// Re-exports for convenience.
pub use composite::CpuCompositor;
pub use crate::image::{ImageError, SourceImage};
pub use mask::raster::{MaskRasterizer, PixelSource, RasterTarget};
pub use mask::{Mask, MaskAdjustments, MaskKind};
pub use ping_pong::PingPong;
pub use transform::evaluate::develop_image;
pub use transform::lut::{CURVE_LUT_SIZE, CurveLut};
pub use transform::params::{EditParameters, ToneCurve};
