//! Backend error types (thiserror-based).

use thiserror::Error;

use crate::gpu_traits::TextureHandle;
use crate::program::ProgramId;

/// Render backend errors.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("GPU device initialization failed: {0}")]
    DeviceInit(String),

    #[error("Render target allocation failed: {width}x{height}")]
    AllocFailed { width: u32, height: u32 },

    #[error("Unknown render target: {0}")]
    UnknownTarget(TextureHandle),

    #[error("Unknown program: {0}")]
    UnknownProgram(ProgramId),

    #[error("Program '{name}' failed to compile: {reason}")]
    ProgramCompile { name: String, reason: String },

    #[error("Pixel data size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("No screen surface available")]
    NoScreenTarget,

    #[error("GPU-to-host transfer failed: {0}")]
    TransferFailed(String),
}
