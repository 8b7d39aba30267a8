//! Render backend abstraction.
//!
//! The afterimage stage, the copy pass, and the composer program against
//! [`RenderBackend`], never against a concrete backend. The backend is passed
//! explicitly into every operation so stages stay testable with the software
//! rasterizer.

use std::fmt;

use crate::config::TargetDesc;
use crate::error::GpuError;
use crate::program::{ProgramId, ProgramSource, Uniforms};
use crate::types::Resolution;

/// Core render abstraction implemented by the software and wgpu backends.
///
/// Commands are executed (or recorded and submitted) in issue order: a
/// destination bound with [`set_render_target`](RenderBackend::set_render_target)
/// applies to every following `clear`/`draw_fullscreen` until rebound.
pub trait RenderBackend {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    // -- Render targets --

    /// Allocate an offscreen color target. Contents start as transparent black.
    fn create_target(&mut self, desc: &TargetDesc) -> Result<RenderTarget, GpuError>;

    /// Reallocate `target` at a new resolution, keeping its handle.
    ///
    /// Prior contents are not preserved.
    fn resize_target(
        &mut self,
        target: &mut RenderTarget,
        resolution: Resolution,
    ) -> Result<(), GpuError>;

    /// Whether `texture` names a live target allocated by this backend.
    fn has_target(&self, texture: TextureHandle) -> bool;

    /// Upload tightly packed RGBA8 pixels into `target`.
    fn write_target(&mut self, target: &RenderTarget, pixels: &[u8]) -> Result<(), GpuError>;

    /// Read back tightly packed RGBA8 pixels from `target`.
    fn read_target(&mut self, target: &RenderTarget) -> Result<Vec<u8>, GpuError>;

    // -- Screen surface --

    /// Resize the screen surface (the destination bound by `set_render_target(None)`).
    fn set_screen_size(&mut self, resolution: Resolution) -> Result<(), GpuError>;

    /// Current screen surface resolution.
    fn screen_size(&self) -> Resolution;

    /// Read back tightly packed RGBA8 pixels from the screen surface.
    fn read_screen(&mut self) -> Result<Vec<u8>, GpuError>;

    // -- Programs and drawing --

    /// Prepare a fullscreen program for drawing.
    fn compile_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError>;

    /// Bind the draw destination. `None` binds the screen surface.
    fn set_render_target(&mut self, target: Option<&RenderTarget>);

    /// Clear the bound destination to transparent black.
    fn clear(&mut self) -> Result<(), GpuError>;

    /// Draw a single viewport-covering primitive into the bound destination.
    fn draw_fullscreen(&mut self, program: ProgramId, uniforms: &Uniforms)
        -> Result<(), GpuError>;
}

/// Opaque handle to a render target's color texture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Offscreen 2D color buffer owned by a stage or the composer.
///
/// Deliberately not `Clone`: a target has exactly one owner, and role
/// changes move the value rather than duplicating the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderTarget {
    handle: TextureHandle,
    desc: TargetDesc,
}

impl RenderTarget {
    /// Wrap a backend allocation. Only backends should call this.
    pub fn from_raw(handle: TextureHandle, desc: TargetDesc) -> Self {
        Self { handle, desc }
    }

    /// Texture handle for binding this target as a sampled uniform.
    pub fn texture(&self) -> TextureHandle {
        self.handle
    }

    pub fn desc(&self) -> &TargetDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.desc.width, self.desc.height)
    }

    /// Record a new size after the backend reallocated storage.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.desc.width = resolution.width;
        self.desc.height = resolution.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_target_reports_dimensions() {
        let mut target = RenderTarget::from_raw(TextureHandle(3), TargetDesc::new(64, 48));
        assert_eq!(target.texture(), TextureHandle(3));
        assert_eq!(target.resolution(), Resolution::new(64, 48));

        target.set_resolution(Resolution::new(8, 4));
        assert_eq!((target.width(), target.height()), (8, 4));
        assert_eq!(target.texture(), TextureHandle(3));
    }
}
