//! `aft-gpu-hal` — Render backends.
//!
//! Provides a CPU rasterizer and (behind the `wgpu` feature) a wgpu backend,
//! both implementing the `RenderBackend` trait defined in `aft-common`.

pub mod select;
pub mod software;

#[cfg(feature = "wgpu")]
pub mod webgpu;

pub use select::{create_backend, describe_preference};
pub use software::{Command, SoftwareBackend};

#[cfg(feature = "wgpu")]
pub use webgpu::WgpuBackend;
