//! Lumen GPU — wgpu renderer for the develop transform and mask compositor.
//!
//! This crate owns all GPU resources. It works either on its own headless
//! device or on a device handed in by the host; the domain model lives in
//! `lumen-core`.

pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod programs;
pub mod readback;
pub mod renderer;
pub mod targets;
pub mod uniforms;

pub use config::RendererConfig;
pub use context::GpuContext;
pub use error::{ExportError, GpuError};
pub use export::{ExportFormat, FrameExporter, SharedRenderer};
pub use programs::{ShaderProgramSet, ShaderVariant};
pub use renderer::{FrameOutcome, Renderer, RendererState, RendererStatus, SkipReason};
pub use uniforms::DevelopUniforms;
