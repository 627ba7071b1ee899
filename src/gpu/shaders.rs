// ============================================================================
// GPU SHADERS - built-in WGSL transform programs
// ============================================================================
//
// Every transform program, built-in or loaded from disk, must expose the same
// interface so one pipeline layout fits all of them:
//
//   @group(0) @binding(0) var src_tex: texture_2d<f32>;   // active buffer
//   @group(0) @binding(1) var<uniform> u: TransformUniforms;
//
//   vertex input:  @location(0) position: vec2<f32>  (clip space)
//                  @location(1) uv: vec2<f32>        (0..1, top-left origin)
//   entry points:  vs_main, fs_main
//
// TransformUniforms is { image_size: vec2<u32>, block_size: u32, step: u32 }.
// A program may ignore any of its fields but must declare the struct with
// that layout (16 bytes).

/// Block-average pixelization.  Each fragment averages the `block_size²`
/// cell containing it, read with `textureLoad` so no sampler filtering
/// leaks in between cells.
pub const PIXELIZE_SHADER: &str = r#"
struct TransformUniforms {
    image_size: vec2<u32>,
    block_size: u32,
    step: u32,
};

@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var<uniform> u: TransformUniforms;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Fragment position is in target pixels (centres at .5).
    let px = vec2<u32>(in.position.xy);
    let block = max(u.block_size, 1u);
    let origin = (px / vec2<u32>(block, block)) * vec2<u32>(block, block);
    let end = min(origin + vec2<u32>(block, block), u.image_size);

    var sum = vec4<f32>(0.0, 0.0, 0.0, 0.0);
    var count = 0.0;
    for (var y = origin.y; y < end.y; y = y + 1u) {
        for (var x = origin.x; x < end.x; x = x + 1u) {
            sum = sum + textureLoad(src_tex, vec2<i32>(i32(x), i32(y)), 0);
            count = count + 1.0;
        }
    }
    return sum / max(count, 1.0);
}
"#;
