//! Pass-through copy program.

use aft_common::{Fragment, ParamDef, ParamType, ParamValue, ProgramSource, UniformDecl};

use crate::fullscreen::FULLSCREEN_VERTEX_WGSL;
use crate::traits::Effect;

/// Registry name of the copy program.
pub const COPY: &str = "copy";

pub const OPACITY: &str = "opacity";
pub const T_DIFFUSE: &str = "tDiffuse";

const FRAGMENT_WGSL: &str = r#"
struct Params {
    opacity: f32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var samp: sampler;
@group(0) @binding(2) var tDiffuse: texture_2d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return params.opacity * textureSample(tDiffuse, samp, in.uv);
}
"#;

fn copy_fragment(frag: &dyn Fragment) -> [f32; 4] {
    let opacity = frag.float(OPACITY);
    frag.sample(T_DIFFUSE).map(|c| c * opacity)
}

fn param_defs() -> Vec<ParamDef> {
    vec![ParamDef {
        name: OPACITY.to_string(),
        display_name: "Opacity".to_string(),
        param_type: ParamType::Float { min: 0.0, max: 1.0 },
        default: ParamValue::Float(1.0),
    }]
}

/// Samples one texture and writes it scaled by `opacity`.
pub struct CopyShader {
    params: Vec<ParamDef>,
}

impl CopyShader {
    pub fn new() -> Self {
        Self {
            params: param_defs(),
        }
    }
}

impl Default for CopyShader {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for CopyShader {
    fn name(&self) -> &str {
        COPY
    }

    fn display_name(&self) -> &str {
        "Copy"
    }

    fn param_defs(&self) -> &[ParamDef] {
        &self.params
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource {
            name: COPY.to_string(),
            vertex_wgsl: FULLSCREEN_VERTEX_WGSL,
            fragment_wgsl: FRAGMENT_WGSL,
            uniforms: vec![UniformDecl::f32(OPACITY), UniformDecl::texture(T_DIFFUSE)],
            reference: Some(copy_fragment),
        }
    }
}
