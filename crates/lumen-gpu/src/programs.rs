//! The shader program set: develop (full or basic), blend and present.
//!
//! The full develop program is compiled inside a validation error scope. If
//! the driver rejects it, the basic program is compiled instead and the
//! active [`ShaderVariant`] records which one is in use. Blend and present
//! are small and expected to compile everywhere.

use std::num::NonZeroU64;

use crate::error::GpuError;
use crate::uniforms::DevelopUniforms;

/// Format of every render target the programs draw into.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Format of the uploaded mask alpha.
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

const DEVELOP_FULL_SRC: &str = concat!(
    include_str!("../shaders/develop_common.wgsl"),
    include_str!("../shaders/develop.wgsl"),
);
const DEVELOP_BASIC_SRC: &str = concat!(
    include_str!("../shaders/develop_common.wgsl"),
    include_str!("../shaders/develop_basic.wgsl"),
);

/// WGSL for the two develop programs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DevelopSources {
    pub full: &'static str,
    pub basic: &'static str,
}

impl DevelopSources {
    pub const BUILTIN: Self = Self {
        full: DEVELOP_FULL_SRC,
        basic: DEVELOP_BASIC_SRC,
    };
}

/// Which develop program is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderVariant {
    /// All sixteen stages.
    Full,
    /// Exposure, contrast, white balance, tone bands, vibrance, saturation,
    /// dehaze and clarity only.
    Basic,
}

/// Compiled render pipelines and their bind group layouts.
pub struct ShaderProgramSet {
    variant: ShaderVariant,
    develop: wgpu::RenderPipeline,
    develop_layout: wgpu::BindGroupLayout,
    blend: wgpu::RenderPipeline,
    blend_layout: wgpu::BindGroupLayout,
    present: wgpu::RenderPipeline,
    present_layout: wgpu::BindGroupLayout,
    /// Linear clamp-to-edge sampler shared by develop and present.
    sampler: wgpu::Sampler,
}

impl ShaderProgramSet {
    /// Compile every program. Tries the full develop program first unless
    /// `force_basic` is set.
    pub fn compile(device: &wgpu::Device, force_basic: bool) -> Result<Self, GpuError> {
        Self::compile_with(device, force_basic, &DevelopSources::BUILTIN)
    }

    pub(crate) fn compile_with(
        device: &wgpu::Device,
        force_basic: bool,
        sources: &DevelopSources,
    ) -> Result<Self, GpuError> {
        let develop_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen_develop_layout"),
            entries: &[
                // binding 0: develop uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<DevelopUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                // binding 1: source image
                texture_entry(1, wgpu::TextureViewDimension::D2, true),
                // binding 2: source sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // binding 3: tone curve LUT, read with textureLoad
                texture_entry(3, wgpu::TextureViewDimension::D2, false),
            ],
        });

        let (variant, develop) = if force_basic {
            tracing::info!("basic develop program forced by configuration");
            let pipeline = try_develop_pipeline(device, &develop_layout, sources.basic, "basic")
                .map_err(|message| GpuError::ProgramCompile { message })?;
            (ShaderVariant::Basic, pipeline)
        } else {
            match try_develop_pipeline(device, &develop_layout, sources.full, "full") {
                Ok(pipeline) => (ShaderVariant::Full, pipeline),
                Err(full_err) => {
                    tracing::warn!("full develop program rejected, falling back: {full_err}");
                    let pipeline =
                        try_develop_pipeline(device, &develop_layout, sources.basic, "basic")
                            .map_err(|basic_err| GpuError::ProgramCompile {
                                message: format!("full: {full_err}; basic: {basic_err}"),
                            })?;
                    (ShaderVariant::Basic, pipeline)
                }
            }
        };

        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen_blend_layout"),
            entries: &[
                // binding 0: accumulator (src)
                texture_entry(0, wgpu::TextureViewDimension::D2, false),
                // binding 1: adjusted layer
                texture_entry(1, wgpu::TextureViewDimension::D2, false),
                // binding 2: mask alpha
                texture_entry(2, wgpu::TextureViewDimension::D2, false),
            ],
        });
        let blend_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen_blend_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blend.wgsl").into()),
        });
        let blend = fullscreen_pipeline(device, "lumen_blend", &blend_layout, &blend_module, "fs_blend");

        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen_present_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let present_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen_present_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/present.wgsl").into()),
        });
        let present = fullscreen_pipeline(
            device,
            "lumen_present",
            &present_layout,
            &present_module,
            "fs_present",
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen_linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        tracing::info!(?variant, "lumen shader programs compiled");
        Ok(Self {
            variant,
            develop,
            develop_layout,
            blend,
            blend_layout,
            present,
            present_layout,
            sampler,
        })
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn develop(&self) -> &wgpu::RenderPipeline {
        &self.develop
    }

    pub fn develop_layout(&self) -> &wgpu::BindGroupLayout {
        &self.develop_layout
    }

    pub fn blend(&self) -> &wgpu::RenderPipeline {
        &self.blend
    }

    pub fn blend_layout(&self) -> &wgpu::BindGroupLayout {
        &self.blend_layout
    }

    pub fn present(&self) -> &wgpu::RenderPipeline {
        &self.present
    }

    pub fn present_layout(&self) -> &wgpu::BindGroupLayout {
        &self.present_layout
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Build a develop pipeline, capturing validation errors instead of letting
/// them reach the device's uncaptured-error handler.
fn try_develop_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    source: &str,
    name: &str,
) -> Result<wgpu::RenderPipeline, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("lumen_develop_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline = fullscreen_pipeline(
        device,
        &format!("lumen_develop_{name}"),
        layout,
        &module,
        "fs_develop",
    );
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(pipeline),
        Some(err) => Err(err.to_string()),
    }
}

/// A pipeline that draws one full-screen triangle into a [`TARGET_FORMAT`] target.
fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
    fragment_entry: &str,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label}_pipeline_layout")),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_fullscreen"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(fragment_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn texture_entry(
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}
