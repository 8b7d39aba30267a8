//! Pass chain runner.
//!
//! The [`Composer`] owns a read/write target pair. Each frame it copies the
//! source image into the read target, then runs every enabled pass in
//! order, swapping read and write after each pass that asks for it. When
//! rendering to screen, only the last enabled pass draws to the screen.

use aft_common::{FrameNumber, RenderBackend, RenderTarget, Resolution, TargetDesc, Uniforms};
use aft_effects::copy::{COPY, OPACITY, T_DIFFUSE};
use aft_effects::EffectRegistry;
use tracing::debug;

use crate::pass::{Pass, PassFlags};
use crate::pipeline::{check_size, RenderTargetPair};
use crate::quad::FullscreenQuad;
use crate::PassError;

/// Runs a chain of passes over a source frame.
pub struct Composer {
    targets: RenderTargetPair,
    passes: Vec<Box<dyn Pass>>,
    /// Copies the source frame into the read target.
    input: FullscreenQuad,
    render_to_screen: bool,
    frame: FrameNumber,
}

impl Composer {
    /// Allocate the read/write pair at `resolution`.
    pub fn new(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
        resolution: Resolution,
    ) -> Result<Self, PassError> {
        let input = FullscreenQuad::from_registry(backend, registry, COPY)?;
        let targets = RenderTargetPair::new(
            backend,
            &TargetDesc::new(resolution.width, resolution.height),
        )?;

        Ok(Self {
            targets,
            passes: Vec::new(),
            input,
            render_to_screen: true,
            frame: FrameNumber::ZERO,
        })
    }

    /// Append a pass to the end of the chain.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        debug!(pass = pass.name(), index = self.passes.len(), "Added pass");
        self.passes.push(pass);
    }

    pub fn passes(&self) -> &[Box<dyn Pass>] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Whether the last enabled pass draws to the screen.
    pub fn set_render_to_screen(&mut self, render_to_screen: bool) {
        self.render_to_screen = render_to_screen;
    }

    pub fn render_to_screen(&self) -> bool {
        self.render_to_screen
    }

    /// Target holding the chain's output after [`render`](Self::render).
    pub fn read_buffer(&self) -> &RenderTarget {
        self.targets.current()
    }

    /// Target the next pass writes into.
    pub fn write_buffer(&self) -> &RenderTarget {
        self.targets.back()
    }

    pub fn resolution(&self) -> Resolution {
        self.targets.resolution()
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> FrameNumber {
        self.frame
    }

    /// Run the chain for one frame with `source` as its input image.
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        source: &RenderTarget,
    ) -> Result<(), PassError> {
        backend.set_render_target(Some(self.targets.current()));
        self.input.draw(
            backend,
            &Uniforms::new()
                .push_f32(OPACITY, 1.0)
                .push_texture(T_DIFFUSE, source.texture()),
        )?;

        let last_enabled = self.passes.iter().rposition(|p| p.enabled());

        for (index, pass) in self.passes.iter_mut().enumerate() {
            if !pass.enabled() {
                continue;
            }

            let flags = PassFlags {
                clear: pass.clear(),
                render_to_screen: self.render_to_screen && Some(index) == last_enabled,
            };

            debug!(
                frame = %self.frame,
                pass = pass.name(),
                index,
                to_screen = flags.render_to_screen,
                "Running pass"
            );

            pass.render(backend, self.targets.back(), self.targets.current(), flags)?;

            if pass.needs_swap() {
                self.targets.swap();
            }
        }

        self.frame = self.frame + 1;
        Ok(())
    }

    /// Resize every pass, then the read/write pair.
    ///
    /// The pair is only resized once all passes accepted the new size, so a
    /// failing pass leaves [`resolution`](Self::resolution) unchanged.
    pub fn set_size(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<(), PassError> {
        check_size(width, height)?;
        for pass in &mut self.passes {
            pass.set_size(backend, width, height)?;
        }
        self.targets.resize(backend, width, height)?;
        debug!(width, height, passes = self.passes.len(), "Resized pass chain");
        Ok(())
    }
}
