// ============================================================================
// GPU MODULE - headless wgpu device running the feedback transform
// ============================================================================
//
// Architecture:
//   context.rs  - wgpu Device, Queue, adapter init
//   shaders.rs  - built-in WGSL programs (inline strings)
//   pipeline.rs - GpuTransform: full-surface quad render + readback
// ============================================================================

pub mod context;
pub mod pipeline;
pub mod shaders;

pub use context::GpuContext;
pub use pipeline::GpuTransform;

/// WGPU requires `bytes_per_row` in texture/buffer copies to be a multiple of 256.
pub const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;

/// Row pitch for an RGBA8 copy of `width` pixels, rounded up to the copy alignment.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT
}
