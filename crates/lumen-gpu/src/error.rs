use thiserror::Error;

/// Errors creating GPU state. Per-frame failures never surface as errors;
/// they are logged and reported as [`FrameOutcome::Skipped`](crate::FrameOutcome).
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("no develop program compiled: {message}")]
    ProgramCompile { message: String },
    #[error("GPU device was lost")]
    DeviceLost,
    #[error("failed to map readback buffer: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
}

/// Errors producing an encoded export frame.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },
    #[error("renderer is not ready to export: {0}")]
    NotReady(&'static str),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to encode export: {0}")]
    Encode(#[from] image::ImageError),
}
