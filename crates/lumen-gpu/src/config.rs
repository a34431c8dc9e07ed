//! Renderer configuration.

/// Default output width before the host sizes the view.
const DEFAULT_WIDTH: u32 = 1280;
/// Default output height before the host sizes the view.
const DEFAULT_HEIGHT: u32 = 720;

/// Runtime configuration for a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial output width in pixels.
    pub width: u32,
    /// Initial output height in pixels.
    pub height: u32,
    /// Skip the full develop program and compile only the basic one.
    pub force_basic_program: bool,
    /// Adapter preference when the renderer creates its own context.
    pub power_preference: wgpu::PowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            force_basic_program: std::env::var("LUMEN_FORCE_BASIC_PROGRAM").is_ok(),
            power_preference: std::env::var("LUMEN_POWER_PREFERENCE")
                .ok()
                .and_then(|s| parse_power_preference(&s))
                .unwrap_or(wgpu::PowerPreference::HighPerformance),
        }
    }
}

impl RendererConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

fn parse_power_preference(value: &str) -> Option<wgpu::PowerPreference> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Some(wgpu::PowerPreference::LowPower),
        "high" => Some(wgpu::PowerPreference::HighPerformance),
        "none" => Some(wgpu::PowerPreference::None),
        other => {
            tracing::warn!("ignoring unknown LUMEN_POWER_PREFERENCE value {other:?}");
            None
        }
    }
}
