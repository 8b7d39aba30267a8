//! `aft-common` — Shared types, traits, and errors for the afterimage stage.
//!
//! This crate is the foundation that the effect, backend, and compositor
//! crates depend on. It defines the core abstractions:
//!
//! - **Types**: `Resolution`, `FrameNumber` (newtypes for safety)
//! - **Backend trait**: `RenderBackend`, `RenderTarget`, `TextureHandle`
//! - **Programs**: `ProgramSource`, `ProgramId`, `Uniforms`, `Fragment`
//! - **Parameters**: `ParamDef`, `ParamType`, `ParamValue`
//! - **Config**: `AfterimageConfig`, `BackendPreference`, `TargetDesc`
//! - **Errors**: `GpuError` (thiserror-based)

pub mod color;
pub mod config;
pub mod effect;
pub mod error;
pub mod gpu_traits;
pub mod program;
pub mod types;

// Re-export commonly used items at crate root
pub use color::FilterMode;
pub use config::{AfterimageConfig, BackendPreference, TargetDesc};
pub use effect::{ParamDef, ParamType, ParamValue};
pub use error::GpuError;
pub use gpu_traits::{RenderBackend, RenderTarget, TextureHandle};
pub use program::{
    Fragment, FragmentFn, ProgramId, ProgramSource, UniformDecl, UniformKind, UniformValue,
    Uniforms,
};
pub use types::{FrameNumber, Resolution};
