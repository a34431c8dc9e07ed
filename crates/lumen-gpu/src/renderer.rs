//! Renderer and mask compositor.
//!
//! ```text
//! Uninitialized ──compile──→ Ready ──load_image──→ ImageLoaded
//!        ↑                                              │
//!        └──────────── device lost (recreate) ──────────┘
//! ```
//!
//! Without masks a frame is one develop pass into the output target. With
//! masks the base edit goes into the accumulator, then every enabled mask
//! renders its adjusted layer into the scratch target, uploads its alpha and
//! blends accumulator and layer into the other accumulator store. The final
//! accumulator is drawn to the output.
//!
//! Nothing here returns an error per frame: missing prerequisites produce
//! [`FrameOutcome::Skipped`] and a `warn!` log, and the caller simply renders
//! again on its next parameter or resize event.

use lumen_core::mask::enabled_masks;
use lumen_core::transform::evaluate::DevelopConstants;
use lumen_core::{
    CURVE_LUT_SIZE, CurveLut, EditParameters, Mask, MaskRasterizer, PixelSource, RasterTarget,
    SourceImage,
};

use crate::config::RendererConfig;
use crate::context::GpuContext;
use crate::error::{ExportError, GpuError};
use crate::export::{ExportFormat, encode_rgba8};
use crate::programs::{DevelopSources, ShaderProgramSet, ShaderVariant, TARGET_FORMAT};
use crate::readback::Readback;
use crate::targets::{RenderTarget, TargetPool, draw_fullscreen, extent};
use crate::uniforms::DevelopUniforms;

/// Lifecycle state. Rendering itself is transient inside a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// No GPU context or no compiled program.
    Uninitialized,
    /// Programs compiled, no source image.
    Ready,
    /// Source texture bound.
    ImageLoaded,
}

/// Readiness and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererStatus {
    pub state: RendererState,
    pub image_loaded: bool,
    pub program_compiled: bool,
    /// Active develop program, when one compiled.
    pub variant: Option<ShaderVariant>,
}

/// Why a frame was not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No GPU context is attached.
    NoContext,
    /// Initialization failed; the renderer will not retry.
    InitFailed,
    /// No source image has been loaded.
    NoImage,
    /// The device was lost. A host-owned context must be re-attached; an
    /// owned one is recreated on a later call.
    DeviceLost,
    /// Reading back the base layer for a luminosity mask failed.
    Readback,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoContext => "no GPU context",
            Self::InitFailed => "GPU initialization failed",
            Self::NoImage => "no image loaded",
            Self::DeviceLost => "GPU device lost",
            Self::Readback => "base layer readback failed",
        }
    }
}

/// Result of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The output target was updated, compositing `masks` enabled masks.
    Drawn { masks: usize },
    /// Nothing was drawn this frame.
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn is_drawn(self) -> bool {
        matches!(self, Self::Drawn { .. })
    }
}

/// The uploaded source image and its develop bind group.
struct SourceTexture {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
    develop_group: wgpu::BindGroup,
}

/// Everything created from one [`GpuContext`]. Dropped wholesale on device
/// loss.
struct GpuResources {
    programs: ShaderProgramSet,
    uniforms: wgpu::Buffer,
    curve: wgpu::Texture,
    curve_view: wgpu::TextureView,
    /// Table currently in `curve`.
    uploaded_curve: [u8; CURVE_LUT_SIZE],
    output: RenderTarget,
    source: Option<SourceTexture>,
    /// Allocated on the first masked render at the current output size.
    pool: Option<TargetPool>,
    readback: Readback,
}

impl GpuResources {
    fn new(
        ctx: &GpuContext,
        config: &RendererConfig,
        sources: &DevelopSources,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        let device = &ctx.device;
        let programs = ShaderProgramSet::compile_with(device, config.force_basic_program, sources)?;

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen_develop_uniforms"),
            size: std::mem::size_of::<DevelopUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let curve = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen_curve_lut"),
            size: extent(CURVE_LUT_SIZE as u32, 1),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let curve_view = curve.create_view(&wgpu::TextureViewDescriptor::default());
        let identity = CurveLut::identity();
        write_curve(&ctx.queue, &curve, &identity);

        Ok(Self {
            programs,
            uniforms,
            curve,
            curve_view,
            uploaded_curve: identity.table,
            output: RenderTarget::new(device, "lumen_output", width, height),
            source: None,
            pool: None,
            readback: Readback::new(),
        })
    }

    fn upload_source(&mut self, ctx: &GpuContext, image: &SourceImage) {
        let (width, height) = (image.width(), image.height());
        let reuse = matches!(&self.source, Some(s) if s.width == width && s.height == height);
        if !reuse {
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("lumen_source"),
                size: extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let develop_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen_develop_bg"),
                layout: self.programs.develop_layout(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(self.programs.sampler()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&self.curve_view),
                    },
                ],
            });
            self.source = Some(SourceTexture {
                texture,
                width,
                height,
                develop_group,
            });
        }

        if let Some(source) = &self.source {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &source.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.as_bytes(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(height),
                },
                extent(width, height),
            );
        }
        tracing::info!(width, height, reused = reuse, "source image uploaded");
    }

    fn sync_curve(&mut self, queue: &wgpu::Queue, curve: &CurveLut) {
        if curve.enabled && curve.table != self.uploaded_curve {
            write_curve(queue, &self.curve, curve);
            self.uploaded_curve = curve.table;
        }
    }

    /// The accumulation pool at the current output size.
    fn pool(&mut self, device: &wgpu::Device) -> &mut TargetPool {
        let (width, height) = self.output.size();
        if !self.pool.as_ref().is_some_and(|p| p.matches(width, height)) {
            self.pool = None;
        }
        self.pool
            .get_or_insert_with(|| TargetPool::new(device, &self.programs, width, height))
    }
}

fn write_curve(queue: &wgpu::Queue, texture: &wgpu::Texture, curve: &CurveLut) {
    let rgba = curve.to_rgba8();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&rgba),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(CURVE_LUT_SIZE as u32 * 4),
            rows_per_image: Some(1),
        },
        extent(CURVE_LUT_SIZE as u32, 1),
    );
}

/// GPU renderer for one source image and one output surface.
pub struct Renderer {
    config: RendererConfig,
    ctx: Option<GpuContext>,
    /// Whether the renderer created `ctx` itself and may recreate it.
    owns_context: bool,
    /// Set when initialization failed. Terminal until a new context is attached.
    init_failed: bool,
    /// An owned context was lost and has not been recreated yet.
    recovering: bool,
    /// Bumped every time a context is installed.
    generation: u64,
    recreate: fn(&RendererConfig) -> Result<GpuContext, GpuError>,
    sources: DevelopSources,
    gpu: Option<GpuResources>,
    /// Last loaded image, kept for re-upload after device loss.
    image: Option<SourceImage>,
    width: u32,
    height: u32,
    rasterizer: MaskRasterizer,
    mask_alpha: Vec<u8>,
    /// Per-mask merged parameters, reused across passes.
    merged: EditParameters,
    base_pixels: Vec<u8>,
}

impl Renderer {
    /// Create a renderer with its own headless GPU context.
    ///
    /// Never fails: if no adapter or program is available the renderer stays
    /// [`RendererState::Uninitialized`] and every frame is skipped.
    pub fn new(config: RendererConfig) -> Self {
        let mut renderer = Self::empty(config, true);
        match GpuContext::create_blocking(&renderer.config) {
            Ok(ctx) => renderer.install_context(ctx),
            Err(err) => {
                tracing::error!("lumen renderer has no GPU context: {err}");
                renderer.init_failed = true;
            }
        }
        renderer
    }

    /// Create a renderer on a host-owned device and queue.
    pub fn with_context(ctx: GpuContext, config: RendererConfig) -> Self {
        let mut renderer = Self::empty(config, false);
        renderer.install_context(ctx);
        renderer
    }

    fn empty(config: RendererConfig, owns_context: bool) -> Self {
        let (width, height) = (config.width.max(1), config.height.max(1));
        Self {
            config,
            ctx: None,
            owns_context,
            init_failed: false,
            recovering: false,
            generation: 0,
            recreate: GpuContext::create_blocking,
            sources: DevelopSources::BUILTIN,
            gpu: None,
            image: None,
            width,
            height,
            rasterizer: MaskRasterizer::new(),
            mask_alpha: Vec::new(),
            merged: EditParameters::default(),
            base_pixels: Vec::new(),
        }
    }

    /// Attach a fresh host-owned context, e.g. after the previous device was
    /// lost. Rebuilds every GPU resource and re-uploads the last image.
    pub fn attach_context(&mut self, ctx: GpuContext) {
        self.owns_context = false;
        self.install_context(ctx);
    }

    fn install_context(&mut self, ctx: GpuContext) {
        self.gpu = None;
        self.init_failed = false;
        self.recovering = false;
        self.generation += 1;

        let max = ctx.max_texture_dimension();
        if self.width > max || self.height > max {
            tracing::warn!(
                width = self.width,
                height = self.height,
                max,
                "output size exceeds the device texture limit, clamping"
            );
            self.width = self.width.min(max);
            self.height = self.height.min(max);
        }

        match GpuResources::new(&ctx, &self.config, &self.sources, self.width, self.height) {
            Ok(mut gpu) => {
                if let Some(image) = &self.image {
                    gpu.upload_source(&ctx, image);
                }
                self.gpu = Some(gpu);
            }
            Err(err) => {
                tracing::error!("lumen renderer initialization failed: {err}");
                self.init_failed = true;
            }
        }
        self.ctx = Some(ctx);
    }

    /// Drop resources from a lost device and, when the context is ours,
    /// recreate it. A failed recreation is retried on the next call.
    fn ensure_live(&mut self) -> Result<(), SkipReason> {
        if self.ctx.as_ref().is_some_and(GpuContext::is_lost) {
            tracing::warn!("GPU device lost, dropping cached resources");
            self.gpu = None;
            self.ctx = None;
            self.recovering = self.owns_context;
        }

        if self.recovering {
            match (self.recreate)(&self.config) {
                Ok(ctx) => {
                    tracing::info!("GPU context recreated after device loss");
                    self.install_context(ctx);
                }
                Err(err) => {
                    tracing::warn!("failed to recreate GPU context, retrying next frame: {err}");
                    return Err(SkipReason::DeviceLost);
                }
            }
        }

        if self.init_failed {
            return Err(SkipReason::InitFailed);
        }
        if self.ctx.is_none() {
            return Err(if self.owns_context {
                SkipReason::NoContext
            } else {
                SkipReason::DeviceLost
            });
        }
        Ok(())
    }

    pub fn state(&self) -> RendererState {
        match &self.gpu {
            None => RendererState::Uninitialized,
            Some(gpu) if gpu.source.is_some() => RendererState::ImageLoaded,
            Some(_) => RendererState::Ready,
        }
    }

    pub fn status(&self) -> RendererStatus {
        RendererStatus {
            state: self.state(),
            image_loaded: self.gpu.as_ref().is_some_and(|g| g.source.is_some()),
            program_compiled: self.gpu.is_some(),
            variant: self.gpu.as_ref().map(|g| g.programs.variant()),
        }
    }

    /// Whether a render call would draw.
    pub fn is_ready(&self) -> bool {
        self.state() == RendererState::ImageLoaded
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The attached GPU context, if any.
    pub fn context(&self) -> Option<&GpuContext> {
        self.ctx.as_ref()
    }

    /// The live output texture, for hosts that display it directly.
    pub fn output_view(&self) -> Option<&wgpu::TextureView> {
        self.gpu.as_ref().map(|g| &g.output.view)
    }

    /// Replace the source image. Same-size images are written into the
    /// existing texture.
    pub fn load_image(&mut self, image: SourceImage) {
        if let (Some(ctx), Some(gpu)) = (&self.ctx, &mut self.gpu) {
            let max = ctx.max_texture_dimension();
            if image.width() > max || image.height() > max {
                tracing::warn!(
                    width = image.width(),
                    height = image.height(),
                    max,
                    "source image exceeds the device texture limit, not uploaded"
                );
            } else {
                gpu.upload_source(ctx, &image);
            }
        } else {
            tracing::debug!("no GPU resources yet, image kept for later upload");
        }
        self.image = Some(image);
    }

    /// Resize the output target. The mask pool follows on the next masked
    /// render.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::warn!(width, height, "ignoring zero-sized resize");
            return;
        }
        if (width, height) == (self.width, self.height) {
            return;
        }
        if let Some(ctx) = &self.ctx {
            let max = ctx.max_texture_dimension();
            if width > max || height > max {
                tracing::warn!(
                    width,
                    height,
                    max,
                    "resize exceeds the device texture limit, keeping {}x{}",
                    self.width,
                    self.height
                );
                return;
            }
        }
        self.width = width;
        self.height = height;
        if let (Some(ctx), Some(gpu)) = (&self.ctx, &mut self.gpu) {
            gpu.output = RenderTarget::new(&ctx.device, "lumen_output", width, height);
            tracing::debug!(width, height, "output target resized");
        }
    }

    /// Render the global edit with no masks.
    pub fn render(&mut self, params: &EditParameters) -> FrameOutcome {
        self.render_with_masks(params, &[])
    }

    /// Render the global edit and composite every enabled mask in
    /// declaration order.
    pub fn render_with_masks(&mut self, params: &EditParameters, masks: &[Mask]) -> FrameOutcome {
        if let Err(reason) = self.ensure_live() {
            tracing::warn!("skipping frame: {}", reason.as_str());
            return FrameOutcome::Skipped(reason);
        }
        let Self {
            ctx: Some(ctx),
            gpu: Some(gpu),
            rasterizer,
            mask_alpha,
            merged,
            base_pixels,
            ..
        } = self
        else {
            tracing::warn!("skipping frame: renderer not initialized");
            return FrameOutcome::Skipped(SkipReason::NoContext);
        };
        let Some(source) = gpu.source.as_ref() else {
            tracing::warn!("skipping frame: {}", SkipReason::NoImage.as_str());
            return FrameOutcome::Skipped(SkipReason::NoImage);
        };
        let source_size = (source.width, source.height);
        let source_width = source.width;
        let output_size = gpu.output.size();

        let constants = DevelopConstants::derive(params);
        gpu.sync_curve(&ctx.queue, &constants.curve);

        let mask_count = enabled_masks(masks).count();
        if mask_count == 0 {
            write_uniforms(ctx, gpu, params, &constants, source_size, output_size);
            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("lumen_develop_encoder"),
                });
            if let Some(source) = &gpu.source {
                draw_fullscreen(
                    &mut encoder,
                    "lumen_develop_pass",
                    &gpu.output.view,
                    gpu.programs.develop(),
                    &source.develop_group,
                );
            }
            ctx.queue.submit(std::iter::once(encoder.finish()));
            tracing::debug!(?output_size, "frame drawn");
            return FrameOutcome::Drawn { masks: 0 };
        }

        gpu.pool(&ctx.device).reset();

        // Base layer into the accumulator source.
        write_uniforms(ctx, gpu, params, &constants, source_size, output_size);
        submit_pass(ctx, gpu, "lumen_base_pass", |encoder, gpu| {
            if let (Some(source), Some(pool)) = (&gpu.source, &gpu.pool) {
                draw_fullscreen(
                    encoder,
                    "lumen_base_pass",
                    &pool.accum().src().view,
                    gpu.programs.develop(),
                    &source.develop_group,
                );
            }
        });

        let needs_pixels = enabled_masks(masks).any(|m| m.kind.needs_pixels());
        if needs_pixels {
            let GpuResources { pool, readback, .. } = &mut *gpu;
            let result = match pool {
                Some(pool) => readback.read_target_into(ctx, pool.accum().src(), base_pixels),
                None => Err(GpuError::DeviceLost),
            };
            if let Err(err) = result {
                tracing::warn!("skipping frame: base layer readback failed: {err}");
                return FrameOutcome::Skipped(SkipReason::Readback);
            }
        }

        let target = RasterTarget::new(output_size.0, output_size.1, source_width);
        for mask in enabled_masks(masks) {
            // Each pass is its own submission, so the curve and uniform
            // writes below land between the previous pass and this one.
            params.merge_local_into(&mask.adjustments, merged);
            let layer = DevelopConstants::derive_layer(merged, &mask.adjustments.tone_curve);
            gpu.sync_curve(&ctx.queue, &layer.curve);
            write_uniforms(ctx, gpu, merged, &layer, source_size, output_size);

            let pixels = needs_pixels.then_some(PixelSource {
                width: output_size.0,
                height: output_size.1,
                rgba: base_pixels.as_slice(),
            });
            rasterizer.rasterize(mask, target, pixels, mask_alpha);
            if let Some(pool) = &gpu.pool {
                pool.upload_mask(&ctx.queue, mask_alpha);
            }

            submit_pass(ctx, gpu, "lumen_mask_pass", |encoder, gpu| {
                if let (Some(source), Some(pool)) = (&gpu.source, &gpu.pool) {
                    draw_fullscreen(
                        encoder,
                        "lumen_layer_pass",
                        &pool.scratch().view,
                        gpu.programs.develop(),
                        &source.develop_group,
                    );
                    draw_fullscreen(
                        encoder,
                        "lumen_blend_pass",
                        &pool.accum().dst().view,
                        gpu.programs.blend(),
                        pool.blend_group(),
                    );
                }
            });
            if let Some(pool) = &mut gpu.pool {
                pool.swap();
            }
            tracing::trace!(mask = %mask.id, "mask composited");
        }

        submit_pass(ctx, gpu, "lumen_present_pass", |encoder, gpu| {
            if let Some(pool) = &gpu.pool {
                draw_fullscreen(
                    encoder,
                    "lumen_present_pass",
                    &gpu.output.view,
                    gpu.programs.present(),
                    pool.present_group(),
                );
            }
        });

        tracing::debug!(?output_size, masks = mask_count, "frame drawn");
        FrameOutcome::Drawn { masks: mask_count }
    }

    /// Read the live output target back as tightly packed RGBA8.
    pub fn capture_output(&mut self) -> Result<Vec<u8>, GpuError> {
        match (&self.ctx, &mut self.gpu) {
            (Some(ctx), Some(gpu)) => {
                let GpuResources {
                    output, readback, ..
                } = gpu;
                readback.read_target(ctx, output)
            }
            _ => Err(GpuError::DeviceLost),
        }
    }

    /// Render without masks at `width × height` and encode the result.
    pub fn render_for_export(
        &mut self,
        params: &EditParameters,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        self.render_for_export_with_masks(params, &[], width, height, format)
    }

    /// Render at an arbitrary resolution, independent of the live output, and
    /// encode the result. The live output target and its contents are
    /// restored afterwards.
    pub fn render_for_export_with_masks(
        &mut self,
        params: &EditParameters,
        masks: &[Mask],
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ExportError> {
        let pixels = self.render_offscreen(params, masks, width, height)?;
        let encoded = encode_rgba8(pixels, width, height, format)?;
        tracing::info!(width, height, ?format, bytes = encoded.len(), "frame exported");
        Ok(encoded)
    }

    /// Render at `width × height` into a temporary output target and read it
    /// back as RGBA8.
    pub fn render_offscreen(
        &mut self,
        params: &EditParameters,
        masks: &[Mask],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidSize { width, height });
        }
        if let Err(reason) = self.ensure_live() {
            return Err(ExportError::NotReady(reason.as_str()));
        }
        if let Some(ctx) = &self.ctx {
            let max = ctx.max_texture_dimension();
            if width > max || height > max {
                return Err(ExportError::InvalidSize { width, height });
            }
        }

        let live_size = (self.width, self.height);
        let generation = self.generation;
        let live = match (&self.ctx, &mut self.gpu) {
            (Some(ctx), Some(gpu)) => std::mem::replace(
                &mut gpu.output,
                RenderTarget::new(&ctx.device, "lumen_export_output", width, height),
            ),
            _ => return Err(ExportError::NotReady(SkipReason::NoContext.as_str())),
        };
        self.width = width;
        self.height = height;

        let outcome = self.render_with_masks(params, masks);
        let captured = match outcome {
            FrameOutcome::Drawn { .. } => self.capture_output().map_err(ExportError::from),
            FrameOutcome::Skipped(reason) => Err(ExportError::NotReady(reason.as_str())),
        };

        self.restore_live(live, live_size, generation);
        captured
    }

    /// Put the live output back after an offscreen render. A target from a
    /// context replaced mid-call is dropped and rebuilt on the current device.
    fn restore_live(&mut self, live: RenderTarget, live_size: (u32, u32), generation: u64) {
        (self.width, self.height) = live_size;
        let (Some(ctx), Some(gpu)) = (&self.ctx, &mut self.gpu) else {
            return;
        };
        if generation == self.generation {
            gpu.output = live;
        } else {
            tracing::debug!("GPU context changed during export, rebuilding live output");
            gpu.output = RenderTarget::new(&ctx.device, "lumen_output", live_size.0, live_size.1);
        }
        // The pool follows the live size again on the next masked render.
    }
}

fn write_uniforms(
    ctx: &GpuContext,
    gpu: &GpuResources,
    params: &EditParameters,
    constants: &DevelopConstants,
    source: (u32, u32),
    output: (u32, u32),
) {
    let packed = DevelopUniforms::pack(params, constants, source, output);
    ctx.queue
        .write_buffer(&gpu.uniforms, 0, bytemuck::bytes_of(&packed));
}

/// Record one or more passes and submit them as a single command buffer.
fn submit_pass(
    ctx: &GpuContext,
    gpu: &GpuResources,
    label: &str,
    record: impl FnOnce(&mut wgpu::CommandEncoder, &GpuResources),
) {
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    record(&mut encoder, gpu);
    ctx.queue.submit(std::iter::once(encoder.finish()));
}
