//! GPU integration tests. Need a real wgpu adapter; each test returns early
//! when none is available.
//!
//! Run with: `cargo test -p lumen-gpu`

use std::sync::{Mutex, OnceLock};

use lumen_core::mask::{BrushPoint, BrushStroke, LuminosityRange};
use lumen_core::{
    CpuCompositor, EditParameters, Mask, MaskAdjustments, MaskKind, SourceImage, ToneCurve,
};
use lumen_gpu::{
    ExportFormat, FrameExporter, FrameOutcome, GpuContext, Renderer, RendererConfig,
    RendererState, SharedRenderer, ShaderVariant, SkipReason,
};

const W: u32 = 16;
const H: u32 = 12;

fn gpu_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn renderer_config(force_basic_program: bool) -> RendererConfig {
    RendererConfig {
        width: W,
        height: H,
        force_basic_program,
        power_preference: wgpu::PowerPreference::HighPerformance,
    }
}

/// A renderer on a fresh device, or `None` when the machine has no adapter.
fn create_test_renderer(force_basic_program: bool) -> Option<Renderer> {
    match pollster::block_on(GpuContext::create(wgpu::PowerPreference::HighPerformance)) {
        Ok(ctx) => Some(Renderer::with_context(ctx, renderer_config(force_basic_program))),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn gradient(width: u32, height: u32) -> SourceImage {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 127 / (width - 1)) as u8;
            let g = (y * 127 / (height - 1)) as u8;
            pixels.extend_from_slice(&[r, g, 60, 255]);
        }
    }
    SourceImage::from_rgba8(width, height, pixels).expect("valid gradient")
}

fn gray(v: u8) -> SourceImage {
    SourceImage::filled(W, H, [v, v, v, 255]).expect("valid image")
}

fn exposure(stops: f32) -> MaskAdjustments {
    MaskAdjustments {
        exposure: stops,
        ..MaskAdjustments::default()
    }
}

fn full_frame_brush(id: &str) -> Mask {
    Mask::new(
        id,
        MaskKind::Brush {
            strokes: vec![BrushStroke {
                points: vec![BrushPoint {
                    x: 0.5,
                    y: 0.5,
                    pressure: 1.0,
                }],
                size: 1000.0,
                feather: 0.0,
                ..BrushStroke::default()
            }],
        },
    )
}

fn max_diff(a: &[u8], b: &[u8]) -> i32 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x as i32 - y as i32).abs())
        .max()
        .unwrap_or(0)
}

fn render_capture(renderer: &mut Renderer, params: &EditParameters, masks: &[Mask]) -> Vec<u8> {
    let outcome = renderer.render_with_masks(params, masks);
    assert!(outcome.is_drawn(), "frame skipped: {outcome:?}");
    renderer.capture_output().expect("output readback")
}

#[test]
fn test_status_follows_lifecycle() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };

    let status = renderer.status();
    assert_eq!(status.state, RendererState::Ready);
    assert!(status.program_compiled);
    assert!(!status.image_loaded);
    assert!(status.variant.is_some());
    assert_eq!(
        renderer.render(&EditParameters::default()),
        FrameOutcome::Skipped(SkipReason::NoImage)
    );

    renderer.load_image(gray(50));
    assert_eq!(renderer.status().state, RendererState::ImageLoaded);
    assert!(renderer.is_ready());
}

#[test]
fn test_default_params_reproduce_source() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    let src = gradient(W, H);
    renderer.load_image(src.clone());

    let out = render_capture(&mut renderer, &EditParameters::default(), &[]);
    assert!(max_diff(&out, src.as_bytes()) <= 1);
}

#[test]
fn test_exposure_plus_one_doubles() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    let src = gradient(W, H);
    renderer.load_image(src.clone());

    let mut params = EditParameters::default();
    params.exposure = 1.0;
    let out = render_capture(&mut renderer, &params, &[]);

    let expected: Vec<u8> = src
        .as_bytes()
        .chunks_exact(4)
        .flat_map(|px| {
            [
                (px[0] as u32 * 2).min(255) as u8,
                (px[1] as u32 * 2).min(255) as u8,
                (px[2] as u32 * 2).min(255) as u8,
                px[3],
            ]
        })
        .collect();
    assert!(max_diff(&out, &expected) <= 1);
}

#[test]
fn test_full_frame_brush_matches_global_exposure() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    renderer.load_image(gradient(W, H));

    let mut global = EditParameters::default();
    global.exposure = 1.0;
    let expected = render_capture(&mut renderer, &global, &[]);

    let mask = full_frame_brush("all").with_adjustments(exposure(1.0));
    let masked = render_capture(&mut renderer, &EditParameters::default(), &[mask]);
    assert!(max_diff(&masked, &expected) <= 1);
}

#[test]
fn test_midtone_luminosity_mask_covers_flat_gray() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    renderer.load_image(gray(128));

    let mask = Mask::new(
        "mids",
        MaskKind::Luminosity {
            range: LuminosityRange::Midtones,
            threshold: 100.0,
            feather: 0.0,
        },
    )
    .with_adjustments(exposure(-1.0));
    let out = render_capture(&mut renderer, &EditParameters::default(), &[mask]);
    for px in out.chunks_exact(4) {
        assert!((px[0] as i32 - 64).abs() <= 1, "pixel {px:?}");
    }
}

#[test]
fn test_overlapping_masks_depend_on_order() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    renderer.load_image(gray(100));

    let up = full_frame_brush("up")
        .with_adjustments(exposure(1.0))
        .with_opacity(50.0);
    let down = full_frame_brush("down")
        .with_adjustments(exposure(-1.0))
        .with_opacity(50.0);
    let params = EditParameters::default();

    let forward = render_capture(&mut renderer, &params, &[up.clone(), down.clone()]);
    let reverse = render_capture(&mut renderer, &params, &[down, up]);
    assert!((forward[0] as i32 - 100).abs() <= 1);
    assert!((reverse[0] as i32 - 138).abs() <= 1);
}

#[test]
fn test_gpu_matches_cpu_reference() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    if renderer.status().variant != Some(ShaderVariant::Full) {
        return;
    }
    let src = gradient(W, H);
    renderer.load_image(src.clone());

    let mut params = EditParameters::default();
    params.contrast = 25.0;
    params.temperature = 30.0;
    params.shadows = 40.0;
    params.saturation = 20.0;
    params.tone_curve.points = vec![[0.0, 10.0], [128.0, 140.0], [255.0, 250.0]];
    params.vignette.amount = -40.0;
    let masks = [Mask::new(
        "sky",
        MaskKind::LinearGradient {
            start: [0.5, 0.0],
            end: [0.5, 1.0],
        },
    )
    .with_adjustments(exposure(-0.5))];

    let gpu = render_capture(&mut renderer, &params, &masks);
    let cpu = CpuCompositor::new().render(&src, &params, &masks, W, H);
    let diff = max_diff(&gpu, &cpu);
    assert!(diff <= 2, "GPU and CPU differ by {diff}");
}

#[test]
fn test_basic_program_still_renders_tone() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(true) else {
        return;
    };
    assert_eq!(renderer.status().variant, Some(ShaderVariant::Basic));
    renderer.load_image(gray(60));

    let mut params = EditParameters::default();
    params.exposure = 1.0;
    // Grain is outside the basic program and must have no effect.
    params.grain.amount = 100.0;
    let out = render_capture(&mut renderer, &params, &[]);
    assert!(out.chunks_exact(4).all(|px| (px[0] as i32 - 120).abs() <= 1));
}

#[test]
fn test_masked_render_after_resize() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    renderer.load_image(gray(60));
    let mask = full_frame_brush("all").with_adjustments(exposure(1.0));
    render_capture(&mut renderer, &EditParameters::default(), &[mask.clone()]);

    renderer.resize(40, 30);
    let out = render_capture(&mut renderer, &EditParameters::default(), &[mask]);
    assert_eq!(out.len(), 40 * 30 * 4);
    assert!(out.chunks_exact(4).all(|px| (px[0] as i32 - 120).abs() <= 1));
}

#[test]
fn test_export_renders_at_requested_size_and_restores_live_output() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    renderer.load_image(gray(60));
    let params = EditParameters::default();
    let live = render_capture(&mut renderer, &params, &[]);

    let shared = SharedRenderer::new(renderer);
    let exporter: &dyn FrameExporter = &shared;
    let mut bright = EditParameters::default();
    bright.exposure = 1.0;
    let png = exporter
        .export_frame(&bright, &[], 48, 20, ExportFormat::Png)
        .expect("export succeeds");

    let decoded = image::load_from_memory(&png).expect("png decodes").to_rgba8();
    assert_eq!(decoded.dimensions(), (48, 20));
    assert!((decoded.get_pixel(10, 10)[0] as i32 - 120).abs() <= 1);

    let mut renderer = shared.lock();
    assert_eq!(renderer.output_size(), (W, H));
    let restored = renderer.capture_output().expect("output readback");
    assert_eq!(restored, live);
}

#[test]
fn test_resize_past_device_limit_keeps_size() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    let max = renderer
        .context()
        .map(GpuContext::max_texture_dimension)
        .expect("context attached");
    renderer.load_image(gray(60));

    renderer.resize(max + 1, 4);
    assert_eq!(renderer.output_size(), (W, H));
    let out = render_capture(&mut renderer, &EditParameters::default(), &[]);
    assert_eq!(out.len(), (W * H * 4) as usize);
}

#[test]
fn test_host_context_recovers_through_attach_after_loss() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let ctx = match pollster::block_on(GpuContext::create(wgpu::PowerPreference::HighPerformance)) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            return;
        }
    };
    let mut renderer = Renderer::with_context(ctx.clone(), renderer_config(false));
    renderer.load_image(gray(60));
    render_capture(&mut renderer, &EditParameters::default(), &[]);

    ctx.device.destroy();
    if !ctx.is_lost() {
        eprintln!("skipping: device loss was not reported synchronously");
        return;
    }
    assert_eq!(
        renderer.render(&EditParameters::default()),
        FrameOutcome::Skipped(SkipReason::DeviceLost)
    );
    assert_eq!(renderer.status().state, RendererState::Uninitialized);
    // Host-owned contexts are never recreated behind the host's back.
    assert_eq!(
        renderer.render(&EditParameters::default()),
        FrameOutcome::Skipped(SkipReason::DeviceLost)
    );

    let fresh = pollster::block_on(GpuContext::create(wgpu::PowerPreference::HighPerformance))
        .expect("second device");
    renderer.attach_context(fresh);
    assert_eq!(renderer.status().state, RendererState::ImageLoaded);
    let out = render_capture(&mut renderer, &EditParameters::default(), &[]);
    assert!(out.chunks_exact(4).all(|px| (px[0] as i32 - 60).abs() <= 1));
}

#[test]
fn test_mask_hsl_and_vignette_deltas_reach_the_layer() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    if renderer.status().variant != Some(ShaderVariant::Full) {
        return;
    }
    let src = SourceImage::filled(W, H, [200, 30, 30, 255]).expect("valid image");
    renderer.load_image(src.clone());

    let mut adjustments = MaskAdjustments::default();
    adjustments.hsl.red.saturation = -100.0;
    adjustments.vignette.amount = -100.0;
    let mask = Mask::new(
        "spot",
        MaskKind::RadialGradient {
            center: [0.5, 0.5],
            radius_x: 2.0,
            radius_y: 2.0,
            feather: 0.0,
            invert: false,
        },
    )
    .with_adjustments(adjustments);
    let masks = [mask];
    let params = EditParameters::default();

    let gpu = render_capture(&mut renderer, &params, &masks);
    assert!(max_diff(&gpu, src.as_bytes()) > 50, "mask deltas had no effect");
    let cpu = CpuCompositor::new().render(&src, &params, &masks, W, H);
    let diff = max_diff(&gpu, &cpu);
    assert!(diff <= 2, "GPU and CPU differ by {diff}");
}

#[test]
fn test_mask_tone_curve_runs_after_global_curve() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some(mut renderer) = create_test_renderer(false) else {
        return;
    };
    if renderer.status().variant != Some(ShaderVariant::Full) {
        return;
    }
    let src = gradient(W, H);
    renderer.load_image(src.clone());

    let mut params = EditParameters::default();
    params.tone_curve = ToneCurve::new(vec![[0.0, 40.0], [255.0, 255.0]]);
    let local = MaskAdjustments {
        tone_curve: ToneCurve::new(vec![[0.0, 255.0], [255.0, 0.0]]),
        ..MaskAdjustments::default()
    };
    let masks = [full_frame_brush("invert").with_adjustments(local)];

    let gpu = render_capture(&mut renderer, &params, &masks);
    let cpu = CpuCompositor::new().render(&src, &params, &masks, W, H);
    let diff = max_diff(&gpu, &cpu);
    assert!(diff <= 2, "GPU and CPU differ by {diff}");

    // A plain frame afterwards goes back to the global curve alone.
    let plain = render_capture(&mut renderer, &params, &[]);
    let expected = CpuCompositor::new().render(&src, &params, &[], W, H);
    assert!(max_diff(&plain, &expected) <= 2);
}
