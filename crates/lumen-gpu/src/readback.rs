//! GPU-to-CPU readback of render targets as tightly packed RGBA8.

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::targets::{RenderTarget, extent};

/// Row pitch for a texture-to-buffer copy of `width` RGBA8 pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the row padding from a mapped copy.
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    strip_row_padding_into(padded, width, height, &mut out);
    out
}

/// Like [`strip_row_padding`], writing into `out` and keeping its allocation.
pub fn strip_row_padding_into(padded: &[u8], width: u32, height: u32, out: &mut Vec<u8>) {
    let row = width as usize * 4;
    let pitch = padded_bytes_per_row(width) as usize;
    out.clear();
    if pitch == row {
        out.extend_from_slice(&padded[..row * height as usize]);
        return;
    }
    out.reserve(row * height as usize);
    for chunk in padded.chunks(pitch).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
}

/// Reads render targets back, reusing one staging buffer while it is large
/// enough.
#[derive(Default)]
pub struct Readback {
    staging: Option<wgpu::Buffer>,
}

impl Readback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `target` into the staging buffer and return its pixels. Blocks
    /// until the GPU has finished.
    pub fn read_target(
        &mut self,
        ctx: &GpuContext,
        target: &RenderTarget,
    ) -> Result<Vec<u8>, GpuError> {
        let mut pixels = Vec::new();
        self.read_target_into(ctx, target, &mut pixels)?;
        Ok(pixels)
    }

    /// Like [`Readback::read_target`], reusing the allocation behind `out`.
    pub fn read_target_into(
        &mut self,
        ctx: &GpuContext,
        target: &RenderTarget,
        out: &mut Vec<u8>,
    ) -> Result<(), GpuError> {
        let pitch = padded_bytes_per_row(target.width);
        let size = pitch as u64 * target.height as u64;

        let staging = match self.staging.take() {
            Some(buf) if buf.size() >= size => buf,
            _ => ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("lumen_readback_staging"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }),
        };

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(pitch),
                    rows_per_image: Some(target.height),
                },
            },
            extent(target.width, target.height),
        );
        ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device.poll(wgpu::PollType::wait_indefinitely())?;
        rx.recv().map_err(|_| GpuError::DeviceLost)??;

        let data = slice.get_mapped_range();
        strip_row_padding_into(&data, target.width, target.height, out);
        drop(data);
        staging.unmap();
        self.staging = Some(staging);
        Ok(())
    }
}
