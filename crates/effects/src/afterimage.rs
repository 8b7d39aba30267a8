//! Afterimage blend program: per-pixel decay between the accumulated frame
//! and the incoming frame.
//!
//! For each pixel, with `old` sampled from the accumulated buffer and `new`
//! from the incoming frame:
//!
//! ```text
//! falling    = |old| > |new| ? 1 : 0
//! dampening  = damp * falling
//! if abs(|old| - |new|) < cutoff { dampening = 1 - dampening }
//! out        = new * (1 - dampening) + old * dampening
//! ```
//!
//! Ties (`|old| == |new|`) count as "not falling". When the magnitudes are
//! within `cutoff` of each other the decision is inverted, which freezes the
//! old value and suppresses flicker in static regions. `cutoff = 0` disables
//! the freeze entirely.

use aft_common::color::{magnitude, mix};
use aft_common::{
    AfterimageConfig, Fragment, ParamDef, ParamType, ParamValue, ProgramSource, UniformDecl,
};

use crate::error::EffectError;
use crate::fullscreen::FULLSCREEN_VERTEX_WGSL;
use crate::params::{get_float, validate_params};
use crate::traits::Effect;

/// Registry name of the blend program.
pub const AFTERIMAGE: &str = "afterimage";

/// Uniform names, in binding order.
pub const CUTOFF: &str = "cutoff";
pub const DAMP: &str = "damp";
pub const T_OLD: &str = "tOld";
pub const T_NEW: &str = "tNew";

const FRAGMENT_WGSL: &str = r#"
struct Params {
    cutoff: f32,
    damp: f32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var samp: sampler;
@group(0) @binding(2) var tOld: texture_2d<f32>;
@group(0) @binding(3) var tNew: texture_2d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel_old = textureSample(tOld, samp, in.uv);
    let texel_new = textureSample(tNew, samp, in.uv);

    let old_len = length(texel_old);
    let new_len = length(texel_new);

    // step(old, new) is 1 when new >= old, so ties are not "falling".
    let falling = 1.0 - step(old_len, new_len);
    var dampening = params.damp * falling;

    if (abs(old_len - new_len) < params.cutoff) {
        dampening = 1.0 - dampening;
    }

    return mix(texel_new, texel_old, dampening);
}
"#;

/// Blend one pixel pair. CPU form of the fragment stage.
pub fn afterimage_mix(old: [f32; 4], new: [f32; 4], damp: f32, cutoff: f32) -> [f32; 4] {
    let old_len = magnitude(old);
    let new_len = magnitude(new);

    let falling = if old_len > new_len { 1.0 } else { 0.0 };
    let mut dampening = damp * falling;

    if (old_len - new_len).abs() < cutoff {
        dampening = 1.0 - dampening;
    }

    mix(new, old, dampening)
}

fn afterimage_fragment(frag: &dyn Fragment) -> [f32; 4] {
    afterimage_mix(
        frag.sample(T_OLD),
        frag.sample(T_NEW),
        frag.float(DAMP),
        frag.float(CUTOFF),
    )
}

fn param_defs() -> Vec<ParamDef> {
    vec![
        ParamDef {
            name: DAMP.to_string(),
            display_name: "Damping".to_string(),
            param_type: ParamType::Float { min: 0.0, max: 1.0 },
            default: ParamValue::Float(AfterimageConfig::DEFAULT_DAMP),
        },
        // Upper bound is the largest possible RGBA magnitude difference.
        ParamDef {
            name: CUTOFF.to_string(),
            display_name: "Cutoff".to_string(),
            param_type: ParamType::Float { min: 0.0, max: 2.0 },
            default: ParamValue::Float(AfterimageConfig::DEFAULT_CUTOFF),
        },
    ]
}

/// The afterimage (temporal trail) blend program.
pub struct AfterimageShader {
    params: Vec<ParamDef>,
}

impl AfterimageShader {
    pub fn new() -> Self {
        Self {
            params: param_defs(),
        }
    }

    /// Build a config from named overrides, falling back to the defaults.
    ///
    /// Every supplied value is validated against the parameter definitions.
    pub fn config_from_params(
        &self,
        params: &[(String, ParamValue)],
    ) -> Result<AfterimageConfig, EffectError> {
        validate_params(&self.params, params)?;
        Ok(AfterimageConfig::new(
            get_float(DAMP, params, &self.params),
            get_float(CUTOFF, params, &self.params),
        ))
    }
}

impl Default for AfterimageShader {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for AfterimageShader {
    fn name(&self) -> &str {
        AFTERIMAGE
    }

    fn display_name(&self) -> &str {
        "Afterimage"
    }

    fn param_defs(&self) -> &[ParamDef] {
        &self.params
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource {
            name: AFTERIMAGE.to_string(),
            vertex_wgsl: FULLSCREEN_VERTEX_WGSL,
            fragment_wgsl: FRAGMENT_WGSL,
            uniforms: vec![
                UniformDecl::f32(CUTOFF),
                UniformDecl::f32(DAMP),
                UniformDecl::texture(T_OLD),
                UniformDecl::texture(T_NEW),
            ],
            reference: Some(afterimage_fragment),
        }
    }
}
