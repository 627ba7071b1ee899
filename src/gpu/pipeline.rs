// ============================================================================
// GPU TRANSFORM - full-surface quad render of the active buffer + readback
// ============================================================================
//
// One pass:
//   1. upload the active buffer into `src_texture`
//   2. draw a 2-triangle quad covering `dst_texture` with the program bound
//   3. copy `dst_texture` into a staging buffer and map it
//   4. strip the 256-byte row padding into the work buffer
//
// All GPU objects are created once for the fixed canvas size and reused for
// every pass.
// ============================================================================

use bytemuck::{Pod, Zeroable};
use image::{Rgba, RgbaImage};
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::error::EditorError;
use crate::transform::PixelTransform;

// ============================================================================
// VERTEX / UNIFORM TYPES
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Clip-space position of the destination corner.
    pub position: [f32; 2],
    /// Source texture coordinate, top-left origin.
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Two triangles over the four corners: (TL, TR, BL) and (BL, TR, BR).
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Corners in top-left, top-right, bottom-left, bottom-right order.  The
/// destination spans the whole target and samples the whole source.
pub fn full_surface_quad() -> [QuadVertex; 4] {
    [
        QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
        QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
        QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
        QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    ]
}

/// Must match `TransformUniforms` in shaders.rs.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TransformUniforms {
    image_size: [u32; 2],
    block_size: u32,
    step: u32,
}

/// Render-target clear value for `color`, so fragments a program discards
/// read back as the erase colour.
fn clear_color(color: Rgba<u8>) -> wgpu::Color {
    let [r, g, b, a] = color.0.map(|c| c as f64 / 255.0);
    wgpu::Color { r, g, b, a }
}

// ============================================================================
// GPU TRANSFORM
// ============================================================================

pub struct GpuTransform {
    ctx: GpuContext,
    name: String,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    src_texture: wgpu::Texture,
    dst_texture: wgpu::Texture,
    dst_view: wgpu::TextureView,
    staging: wgpu::Buffer,
    padded_row: u32,
    width: u32,
    height: u32,
    uniforms: TransformUniforms,
    clear: wgpu::Color,
}

impl GpuTransform {
    /// Compile `wgsl` and allocate every resource for a `width × height`
    /// canvas.  Validation errors in the program are returned rather than
    /// raised through wgpu's uncaptured-error handler.  `ctx` must have been
    /// opened for this canvas size.
    pub fn new(
        ctx: GpuContext,
        name: &str,
        wgsl: &str,
        width: u32,
        height: u32,
        block_size: u32,
        erase_color: Rgba<u8>,
    ) -> Result<Self, EditorError> {
        let device = &ctx.device;

        // ---- program + pipeline (inside a validation scope) ----
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("transform_shader"),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("transform_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("transform_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("transform_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[QuadVertex::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None, // the program output replaces the target
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(EditorError::ShaderCompile {
                name: name.to_string(),
                message: err.to_string(),
            });
        }

        // ---- textures ----
        let extent = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let src_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("transform_src"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let dst_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("transform_dst"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let src_view = src_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let dst_view = dst_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // ---- buffers ----
        let uniforms = TransformUniforms {
            image_size: [width, height],
            block_size: block_size.max(1),
            step: 0,
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform_uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform_quad_vertices"),
            contents: bytemuck::cast_slice(&full_surface_quad()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform_quad_indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let padded_row = super::aligned_bytes_per_row(width);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("transform_readback"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("transform_bg"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(Self {
            ctx,
            name: name.to_string(),
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            src_texture,
            dst_texture,
            dst_view,
            staging,
            padded_row,
            width,
            height,
            uniforms,
            clear: clear_color(erase_color),
        })
    }

    fn upload(&self, src: &RgbaImage) {
        self.ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.src_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            src.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    fn encode_pass(&self) -> wgpu::CommandEncoder {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("transform_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("transform_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.dst_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        encoder
    }

    /// Block until the staging buffer is mapped, then copy it row by row into `dst`.
    fn read_back(&self, dst: &mut RgbaImage) -> Result<(), EditorError> {
        let slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.ctx.device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(EditorError::TransformPass(format!("readback map error: {e:?}"))),
            Err(e) => return Err(EditorError::TransformPass(format!("readback channel error: {e}"))),
        }

        {
            let mapped = slice.get_mapped_range();
            let row = self.width as usize * 4;
            let pitch = self.padded_row as usize;
            for (y, out) in dst.chunks_exact_mut(row).enumerate() {
                let start = y * pitch;
                out.copy_from_slice(&mapped[start..start + row]);
            }
        }
        self.staging.unmap();
        Ok(())
    }
}

impl PixelTransform for GpuTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn fills_target(&self) -> bool {
        true
    }

    fn apply(&mut self, src: &RgbaImage, dst: &mut RgbaImage) -> Result<(), EditorError> {
        let expected = (self.width, self.height);
        if src.dimensions() != expected || dst.dimensions() != expected {
            return Err(EditorError::TransformPass(format!(
                "pipeline built for {}x{} but got {}x{} -> {}x{}",
                self.width,
                self.height,
                src.width(),
                src.height(),
                dst.width(),
                dst.height()
            )));
        }

        self.upload(src);
        let commands = self.encode_pass().finish();
        self.ctx.queue.submit(std::iter::once(commands));
        self.read_back(dst)?;
        self.uniforms.step = self.uniforms.step.wrapping_add(1);
        Ok(())
    }
}
