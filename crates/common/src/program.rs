//! GPU program identification, source descriptions, and uniform passing.

use std::fmt;

use crate::gpu_traits::TextureHandle;

/// Opaque handle to a program prepared by a backend via
/// [`RenderBackend::compile_program`](crate::RenderBackend::compile_program).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Per-fragment view of the bound uniforms, handed to CPU reference fragments.
pub trait Fragment {
    /// Normalised coordinate of the fragment center (`(x + 0.5) / w`, `(y + 0.5) / h`).
    fn uv(&self) -> [f32; 2];

    /// Sample the texture bound to uniform `name` at [`uv`](Fragment::uv).
    ///
    /// Unbound texture uniforms sample as transparent black.
    fn sample(&self, name: &str) -> [f32; 4];

    /// Value of float uniform `name` (0.0 when unbound).
    fn float(&self, name: &str) -> f32;
}

/// CPU reference implementation of a fragment stage.
pub type FragmentFn = fn(&dyn Fragment) -> [f32; 4];

/// Kind of a declared uniform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UniformKind {
    F32,
    Texture,
}

/// A uniform slot declared by a program, in binding order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub const fn f32(name: &'static str) -> Self {
        Self {
            name,
            kind: UniformKind::F32,
        }
    }

    pub const fn texture(name: &'static str) -> Self {
        Self {
            name,
            kind: UniformKind::Texture,
        }
    }
}

/// Everything a backend needs to prepare a fullscreen program.
///
/// WGSL convention: `vs_main`/`fs_main` entry points; `@group(0) @binding(0)`
/// is a uniform struct holding every `F32` uniform in declaration order,
/// `@binding(1)` is the shared sampler, and texture uniforms follow from
/// `@binding(2)` in declaration order.
#[derive(Clone, Debug)]
pub struct ProgramSource {
    pub name: String,
    pub vertex_wgsl: &'static str,
    pub fragment_wgsl: &'static str,
    pub uniforms: Vec<UniformDecl>,
    /// CPU fragment used by software rendering and for validating GPU output.
    pub reference: Option<FragmentFn>,
}

impl ProgramSource {
    /// Float uniforms in declaration order.
    pub fn float_uniforms(&self) -> impl Iterator<Item = &UniformDecl> {
        self.uniforms.iter().filter(|u| u.kind == UniformKind::F32)
    }

    /// Texture uniforms in declaration order.
    pub fn texture_uniforms(&self) -> impl Iterator<Item = &UniformDecl> {
        self.uniforms
            .iter()
            .filter(|u| u.kind == UniformKind::Texture)
    }
}

/// A single uniform value bound for a draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Texture(TextureHandle),
}

/// Uniform values passed to a fullscreen draw.
#[derive(Clone, Debug, Default)]
pub struct Uniforms {
    entries: Vec<(&'static str, UniformValue)>,
}

impl Uniforms {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push_f32(mut self, name: &'static str, val: f32) -> Self {
        self.entries.push((name, UniformValue::F32(val)));
        self
    }

    pub fn push_texture(mut self, name: &'static str, texture: TextureHandle) -> Self {
        self.entries.push((name, UniformValue::Texture(texture)));
        self
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::F32(v) => Some(v),
            UniformValue::Texture(_) => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name)? {
            UniformValue::Texture(t) => Some(t),
            UniformValue::F32(_) => None,
        }
    }

    pub fn entries(&self) -> &[(&'static str, UniformValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
