//! wgpu device and queue, plus device-loss tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RendererConfig;
use crate::error::GpuError;

/// A device/queue pair the renderer draws with.
///
/// Either created headless by the renderer or handed in by a host that
/// already owns a device. A device-lost callback flips `lost` so the renderer
/// can drop its cached resources on the next call.
#[derive(Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Wrap a host-owned device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            if matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                tracing::debug!("GPU device destroyed: {message}");
            } else {
                tracing::error!(?reason, "GPU device lost: {message}");
            }
            flag.store(true, Ordering::Release);
        });
        Self {
            device,
            queue,
            lost,
        }
    }

    /// Create a headless context. Blocks until the device is ready.
    pub fn create_blocking(config: &RendererConfig) -> Result<Self, GpuError> {
        pollster::block_on(Self::create(config.power_preference))
    }

    pub async fn create(power_preference: wgpu::PowerPreference) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                ..Default::default()
            })
            .await?;

        let info = adapter.get_info();
        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            "creating lumen GPU device"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await?;

        Ok(Self::new(device, queue))
    }

    /// Whether the device has been lost since this context was created.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Largest texture edge this device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("lost", &self.is_lost())
            .finish_non_exhaustive()
    }
}
