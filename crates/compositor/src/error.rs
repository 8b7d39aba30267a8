//! Pass error types.

use aft_common::GpuError;
use aft_effects::EffectError;
use thiserror::Error;

/// Errors that can occur while building or running a pass.
#[derive(Debug, Error)]
pub enum PassError {
    /// A render backend operation failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),

    /// A shader program the pass needs is not registered.
    #[error("Missing shader resource: {name}")]
    MissingShaderResource { name: String },

    /// A resize was requested with a zero dimension.
    #[error("Invalid resize to {width}x{height}")]
    InvalidResize { width: u32, height: u32 },

    /// An effect parameter was rejected.
    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),
}
