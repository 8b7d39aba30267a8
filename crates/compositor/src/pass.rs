//! The pipeline stage contract shared by every pass.

use aft_common::{RenderBackend, RenderTarget};

use crate::PassError;

/// Per-call flags supplied by the pipeline runner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PassFlags {
    /// Clear the write target before drawing into it.
    pub clear: bool,
    /// Draw the final copy to the screen instead of the write target.
    pub render_to_screen: bool,
}

impl PassFlags {
    pub fn to_screen() -> Self {
        Self {
            clear: false,
            render_to_screen: true,
        }
    }
}

/// A stage in a post-processing chain.
///
/// `render` reads `read` (the previous stage's output) and writes either
/// into `write` or, when [`PassFlags::render_to_screen`] is set, into the
/// screen. Stages are interchangeable as long as they honor this contract.
pub trait Pass {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Disabled passes are skipped by the runner.
    fn enabled(&self) -> bool {
        true
    }

    /// Whether the runner swaps its read/write targets after this pass.
    fn needs_swap(&self) -> bool {
        true
    }

    /// Whether the write target is cleared before drawing into it.
    fn clear(&self) -> bool {
        false
    }

    /// Run the pass for one frame.
    fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        write: &RenderTarget,
        read: &RenderTarget,
        flags: PassFlags,
    ) -> Result<(), PassError>;

    /// Resize any targets the pass owns.
    fn set_size(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<(), PassError>;
}
