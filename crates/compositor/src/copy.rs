//! Pass-through copy pass.

use aft_common::{RenderBackend, RenderTarget, Uniforms};
use aft_effects::copy::{COPY, OPACITY, T_DIFFUSE};
use aft_effects::EffectRegistry;
use tracing::debug;

use crate::pass::{Pass, PassFlags};
use crate::quad::FullscreenQuad;
use crate::PassError;

/// Copies the read target to the write target (or the screen), scaled by
/// `opacity`.
pub struct CopyPass {
    quad: FullscreenQuad,
    opacity: f32,
    clear: bool,
    enabled: bool,
}

impl CopyPass {
    /// Compile the `copy` program from the registry.
    pub fn new(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
    ) -> Result<Self, PassError> {
        let quad = FullscreenQuad::from_registry(backend, registry, COPY)?;

        Ok(Self {
            quad,
            opacity: 1.0,
            clear: false,
            enabled: true,
        })
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

impl Pass for CopyPass {
    fn name(&self) -> &str {
        COPY
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn clear(&self) -> bool {
        self.clear
    }

    fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        write: &RenderTarget,
        read: &RenderTarget,
        flags: PassFlags,
    ) -> Result<(), PassError> {
        let uniforms = Uniforms::new()
            .push_f32(OPACITY, self.opacity)
            .push_texture(T_DIFFUSE, read.texture());

        if flags.render_to_screen {
            backend.set_render_target(None);
        } else {
            backend.set_render_target(Some(write));
            if flags.clear {
                backend.clear()?;
            }
        }
        self.quad.draw(backend, &uniforms)?;

        debug!(
            source = %read.texture(),
            to_screen = flags.render_to_screen,
            "Copy pass drawn"
        );
        Ok(())
    }

    fn set_size(
        &mut self,
        _backend: &mut dyn RenderBackend,
        _width: u32,
        _height: u32,
    ) -> Result<(), PassError> {
        Ok(())
    }
}
