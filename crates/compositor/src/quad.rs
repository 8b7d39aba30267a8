//! Fullscreen quad renderer.

use aft_common::{GpuError, ProgramId, ProgramSource, RenderBackend, Uniforms};
use aft_effects::{EffectError, EffectRegistry};
use tracing::debug;

use crate::PassError;

/// A program compiled for viewport-covering draws.
///
/// The quad holds no per-frame state: uniforms are supplied to each
/// [`draw`](FullscreenQuad::draw) and the destination is whatever target the
/// backend has bound.
pub struct FullscreenQuad {
    program: ProgramId,
    name: String,
}

impl FullscreenQuad {
    /// Compile `source` on the backend.
    pub fn new(backend: &mut dyn RenderBackend, source: &ProgramSource) -> Result<Self, GpuError> {
        let program = backend.compile_program(source)?;
        debug!(program = %source.name, id = %program, "Prepared fullscreen quad");
        Ok(Self {
            program,
            name: source.name.clone(),
        })
    }

    /// Look `name` up in the registry and compile it.
    ///
    /// An unregistered program is reported as
    /// [`PassError::MissingShaderResource`].
    pub fn from_registry(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
        name: &str,
    ) -> Result<Self, PassError> {
        let effect = registry.require(name).map_err(|err| match err {
            EffectError::NotFound { name } => PassError::MissingShaderResource { name },
            other => PassError::Effect(other),
        })?;
        Ok(Self::new(backend, &effect.program_source())?)
    }

    /// Issue one draw covering the bound destination.
    pub fn draw(&self, backend: &mut dyn RenderBackend, uniforms: &Uniforms) -> Result<(), GpuError> {
        backend.draw_fullscreen(self.program, uniforms)
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
