//! Shared vertex stage for fullscreen programs.
//!
//! A single oversized triangle covers the viewport; `uv` runs from `(0, 0)`
//! at the top-left to `(1, 1)` at the bottom-right, matching the texel
//! addressing of render targets.

/// Vertex stage (`vs_main`) and the `VertexOutput` struct fragment stages consume.
pub const FULLSCREEN_VERTEX_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vid: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(-1.0, 3.0),
        vec2<f32>(3.0, -1.0)
    );
    let pos = positions[vid];
    var out: VertexOutput;
    out.clip = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    return out;
}
"#;
