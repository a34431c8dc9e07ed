//! Offscreen render targets and the accumulation pool used for masks.

use lumen_core::PingPong;

use crate::programs::{MASK_FORMAT, ShaderProgramSet, TARGET_FORMAT};

/// A texture that can be drawn into, sampled and copied out.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub(crate) fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// Two accumulators, a scratch layer target and the mask alpha texture, all
/// at the output resolution. Reallocated only when that resolution changes.
pub struct TargetPool {
    width: u32,
    height: u32,
    accum: PingPong<RenderTarget>,
    scratch: RenderTarget,
    mask: wgpu::Texture,
    /// Blend bind groups indexed by the accumulator's source index.
    blend_groups: [wgpu::BindGroup; 2],
    /// Present bind groups indexed by the accumulator's source index.
    present_groups: [wgpu::BindGroup; 2],
}

impl TargetPool {
    pub fn new(device: &wgpu::Device, programs: &ShaderProgramSet, width: u32, height: u32) -> Self {
        tracing::debug!(width, height, "allocating render target pool");
        let accum = PingPong::from_fn(|i| {
            RenderTarget::new(device, &format!("lumen_accum_{i}"), width, height)
        });
        let scratch = RenderTarget::new(device, "lumen_scratch", width, height);

        let mask = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen_mask_alpha"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: MASK_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let mask_view = mask.create_view(&wgpu::TextureViewDescriptor::default());

        let blend_groups = std::array::from_fn(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen_blend_bg"),
                layout: programs.blend_layout(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&accum.stores()[i].view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&scratch.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&mask_view),
                    },
                ],
            })
        });
        let present_groups = std::array::from_fn(|i| {
            present_bind_group(device, programs, &accum.stores()[i].view)
        });

        Self {
            width,
            height,
            accum,
            scratch,
            mask,
            blend_groups,
            present_groups,
        }
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn accum(&self) -> &PingPong<RenderTarget> {
        &self.accum
    }

    /// Flip the accumulator roles after a blend.
    pub fn swap(&mut self) {
        self.accum.swap();
    }

    /// Start a frame with store 0 as the accumulator source.
    pub fn reset(&mut self) {
        self.accum.reset();
    }

    pub fn scratch(&self) -> &RenderTarget {
        &self.scratch
    }

    /// Blend bind group reading the current accumulator source.
    pub fn blend_group(&self) -> &wgpu::BindGroup {
        &self.blend_groups[self.accum.src_index()]
    }

    /// Present bind group reading the current accumulator source.
    pub fn present_group(&self) -> &wgpu::BindGroup {
        &self.present_groups[self.accum.src_index()]
    }

    /// Upload one mask raster (`width × height` bytes).
    pub fn upload_mask(&self, queue: &wgpu::Queue, alpha: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.mask,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            alpha,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width),
                rows_per_image: Some(self.height),
            },
            extent(self.width, self.height),
        );
    }
}

pub(crate) fn present_bind_group(
    device: &wgpu::Device,
    programs: &ShaderProgramSet,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lumen_present_bg"),
        layout: programs.present_layout(),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(programs.sampler()),
            },
        ],
    })
}

/// Record a full-screen draw of `pipeline` with `bind_group` into `target`.
pub(crate) fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}
