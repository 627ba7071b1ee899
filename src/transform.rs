// ============================================================================
// PIXEL TRANSFORMS - the program run over the canvas on every feedback pass
// ============================================================================
//
// The editor treats the transform as an opaque `Image -> Image` function.
// Two backends exist:
//
//   * `GpuTransform` (gpu/pipeline.rs) - runs a WGSL program as a full-surface
//     quad on a private wgpu device.  This is the normal path.
//   * `CpuPixelize` - the built-in pixelize program evaluated on the CPU with
//     rayon.  Used when GPU acceleration is off or no adapter exists.

use std::path::PathBuf;

use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::CanvasSize;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::gpu::{GpuContext, GpuTransform};
use crate::{log_info, log_warn};

/// Name of the program compiled into the binary.
pub const BUILTIN_PIXELIZE: &str = "pixelize";

/// Maps the whole source image onto a destination of the same size.
///
/// `dst` arrives cleared to the erase colour unless the transform reports
/// `fills_target`.  Implementations must not resize it; the caller treats a
/// size change as a failed pass.
pub trait PixelTransform {
    fn name(&self) -> &str;
    fn apply(&mut self, src: &RgbaImage, dst: &mut RgbaImage) -> Result<(), EditorError>;

    /// True when `apply` writes every pixel of `dst` itself, erase colour
    /// included, so the caller can skip clearing it first.
    fn fills_target(&self) -> bool {
        false
    }
}

// ============================================================================
// PROGRAM SOURCES
// ============================================================================

/// Where the transform program comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgramSource {
    /// A program shipped inside the binary, looked up by name.
    Builtin(String),
    /// A WGSL file on disk.
    File(PathBuf),
}

impl ProgramSource {
    /// `*.wgsl` values are files; anything else names a built-in program.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.to_ascii_lowercase().ends_with(".wgsl") {
            ProgramSource::File(PathBuf::from(value))
        } else {
            ProgramSource::Builtin(value.to_string())
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            ProgramSource::Builtin(name) => name.clone(),
            ProgramSource::File(path) => path.display().to_string(),
        }
    }

    /// Read the WGSL text for this program.
    pub fn wgsl(&self) -> Result<String, EditorError> {
        match self {
            ProgramSource::Builtin(name) if name == BUILTIN_PIXELIZE => {
                Ok(crate::gpu::shaders::PIXELIZE_SHADER.to_string())
            }
            ProgramSource::Builtin(name) => Err(EditorError::ProgramLoad {
                name: name.clone(),
                reason: format!("unknown built-in program (available: {BUILTIN_PIXELIZE})"),
            }),
            ProgramSource::File(path) => {
                std::fs::read_to_string(path).map_err(|e| EditorError::program_file(path, e))
            }
        }
    }
}

impl Default for ProgramSource {
    fn default() -> Self {
        ProgramSource::Builtin(BUILTIN_PIXELIZE.to_string())
    }
}

/// Build the transform described by `config`.  Any failure here is fatal:
/// the editor never starts with a broken program.
pub fn load_transform(config: &EditorConfig) -> Result<Box<dyn PixelTransform>, EditorError> {
    let source = &config.program;
    let wgsl = source.wgsl()?;
    let is_builtin = matches!(source, ProgramSource::Builtin(_));

    if !config.gpu_acceleration {
        if is_builtin {
            log_info!("GPU acceleration disabled, running '{}' on the CPU", source.display_name());
            return Ok(Box::new(CpuPixelize::new(config.pixel_size)));
        }
        return Err(EditorError::Config(format!(
            "program '{}' is a WGSL file and needs gpu_acceleration=true",
            source.display_name()
        )));
    }

    let size = CanvasSize::new(config.width, config.height);
    let ctx = match GpuContext::for_canvas(&config.preferred_gpu, size) {
        Ok(ctx) => ctx,
        Err(e) if is_builtin => {
            log_warn!("{}; falling back to CPU '{}'", e, source.display_name());
            return Ok(Box::new(CpuPixelize::new(config.pixel_size)));
        }
        Err(EditorError::GpuUnavailable(reason)) => {
            return Err(EditorError::GpuUnavailable(format!(
                "'{}' can only run on a GPU ({reason})",
                source.display_name()
            )));
        }
        Err(e) => return Err(e),
    };
    log_info!("GPU adapter: {}", ctx.adapter_name);

    let transform = GpuTransform::new(
        ctx,
        &source.display_name(),
        &wgsl,
        config.width,
        config.height,
        config.pixel_size,
        config.erase_color,
    )?;
    Ok(Box::new(transform))
}

// ============================================================================
// CPU PIXELIZE
// ============================================================================

/// Block-average pixelization: every pixel becomes the mean of the
/// `block × block` cell it falls in.  Cells on the right and bottom edges are
/// averaged over the pixels that exist.
pub struct CpuPixelize {
    block: u32,
}

impl CpuPixelize {
    pub fn new(block: u32) -> Self {
        Self { block: block.max(1) }
    }
}

impl PixelTransform for CpuPixelize {
    fn name(&self) -> &str {
        BUILTIN_PIXELIZE
    }

    fn apply(&mut self, src: &RgbaImage, dst: &mut RgbaImage) -> Result<(), EditorError> {
        let (w, h) = src.dimensions();
        if dst.dimensions() != (w, h) {
            return Err(EditorError::TransformPass(format!(
                "source is {}x{} but target is {}x{}",
                w,
                h,
                dst.width(),
                dst.height()
            )));
        }
        if w == 0 || h == 0 {
            return Ok(());
        }

        let block = self.block;
        let row_bytes = w as usize * 4;
        let band_bytes = row_bytes * block as usize;

        // One band = one row of cells; bands never share output pixels.
        dst.par_chunks_mut(band_bytes)
            .enumerate()
            .for_each(|(band, out)| {
                let y0 = band as u32 * block;
                let rows = (out.len() / row_bytes) as u32;
                let mut x0 = 0;
                while x0 < w {
                    let cw = block.min(w - x0);
                    let mut sum = [0u32; 4];
                    for y in y0..y0 + rows {
                        for x in x0..x0 + cw {
                            let p = src.get_pixel(x, y).0;
                            for c in 0..4 {
                                sum[c] += p[c] as u32;
                            }
                        }
                    }
                    let count = cw * rows;
                    let avg = sum.map(|s| (s / count) as u8);
                    for r in 0..rows as usize {
                        let start = r * row_bytes + x0 as usize * 4;
                        for px in out[start..start + cw as usize * 4].chunks_exact_mut(4) {
                            px.copy_from_slice(&avg);
                        }
                    }
                    x0 += block;
                }
            });
        Ok(())
    }
}
