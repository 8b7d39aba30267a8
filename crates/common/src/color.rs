//! Texture filtering and RGBA8 conversion helpers.

use serde::{Deserialize, Serialize};

/// Texture filter applied when a sampled texture is scaled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Convert one RGBA8 texel to normalised floats.
#[inline]
pub fn unpack_rgba8(texel: [u8; 4]) -> [f32; 4] {
    texel.map(|c| c as f32 / 255.0)
}

/// Convert normalised floats to an RGBA8 texel (clamped, rounded to nearest).
#[inline]
pub fn pack_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Euclidean length of a 4-channel color vector (GLSL `length(vec4)`).
#[inline]
pub fn magnitude(color: [f32; 4]) -> f32 {
    color.iter().map(|c| c * c).sum::<f32>().sqrt()
}

/// Component-wise `a * (1 - t) + b * t` (GLSL `mix`).
#[inline]
pub fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] * (1.0 - t) + b[0] * t,
        a[1] * (1.0 - t) + b[1] * t,
        a[2] * (1.0 - t) + b[2] * t,
        a[3] * (1.0 - t) + b[3] * t,
    ]
}
