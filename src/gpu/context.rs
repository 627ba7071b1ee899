// ============================================================================
// GPU CONTEXT - a headless device able to hold one canvas-sized texture
// ============================================================================
//
// The transform never presents to a surface, so no window or swapchain is
// involved.  The device is opened once per run with limits derived from the
// canvas, which means a canvas the adapter cannot hold is rejected here,
// before any pipeline work.

use crate::canvas::CanvasSize;
use crate::error::EditorError;
use crate::log_warn;

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
}

impl GpuContext {
    /// Open a device for a `size` canvas.  A hardware adapter is tried
    /// first, then the software fallback adapter.
    pub fn for_canvas(preferred_gpu: &str, size: CanvasSize) -> Result<Self, EditorError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let power = power_preference(preferred_gpu);

        let hardware = pollster::block_on(open_device(&instance, power, false, size));
        let reason = match hardware {
            Ok(ctx) => return Ok(ctx),
            Err(reason) => reason,
        };
        log_warn!("{}, trying software fallback", reason);

        pollster::block_on(open_device(&instance, power, true, size))
            .map_err(|fallback| EditorError::GpuUnavailable(format!("{reason}; {fallback}")))
    }
}

/// "low power" / "integrated" pick the low-power adapter; anything else,
/// including an empty string, asks for the fastest one.
fn power_preference(preferred_gpu: &str) -> wgpu::PowerPreference {
    match preferred_gpu.trim().to_ascii_lowercase().as_str() {
        "low power" | "low-power" | "integrated" => wgpu::PowerPreference::LowPower,
        _ => wgpu::PowerPreference::HighPerformance,
    }
}

/// Edge length the device must support for both canvas textures.
fn required_texture_dim(size: CanvasSize) -> u32 {
    size.width.max(size.height).max(1)
}

async fn open_device(
    instance: &wgpu::Instance,
    power: wgpu::PowerPreference,
    software: bool,
    size: CanvasSize,
) -> Result<GpuContext, String> {
    let kind = if software { "software" } else { "hardware" };
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: power,
            compatible_surface: None,
            force_fallback_adapter: software,
        })
        .await
        .ok_or_else(|| format!("no {kind} adapter"))?;

    let name = adapter.get_info().name;
    let needed = required_texture_dim(size);
    let available = adapter.limits().max_texture_dimension_2d;
    if needed > available {
        return Err(format!(
            "{name} ({kind}) holds {available}px textures but the {}x{} canvas needs {needed}px",
            size.width, size.height
        ));
    }

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pixelize transform"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: needed,
                    ..wgpu::Limits::downlevel_defaults()
                },
            },
            None,
        )
        .await
        .map_err(|e| format!("{name} ({kind}) refused a device: {e}"))?;

    Ok(GpuContext { device, queue, adapter_name: name })
}
