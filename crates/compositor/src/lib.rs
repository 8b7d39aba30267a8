//! `aft-compositor` — Afterimage post-processing stage and pass runner.
//!
//! This crate turns the programs from `aft-effects` into pipeline stages
//! driven through the backend-agnostic [`RenderBackend`] trait:
//!
//! 1. **Targets** — [`RenderTargetPair`], a ping-pong pair swapped by index
//! 2. **Quads** — [`FullscreenQuad`], one viewport-covering draw per call
//! 3. **Passes** — [`AfterimagePass`] and [`CopyPass`] behind the [`Pass`] trait
//! 4. **Runner** — [`Composer`], which chains passes over a source frame
//!
//! The rendering context is always passed in explicitly, so every stage can
//! run against the software rasterizer in tests.
//!
//! [`RenderBackend`]: aft_common::RenderBackend

pub mod afterimage;
pub mod composer;
pub mod copy;
pub mod pass;
pub mod pipeline;
pub mod quad;

mod error;

// Re-export primary API
pub use afterimage::{AfterimagePass, AfterimageUniforms};
pub use composer::Composer;
pub use copy::CopyPass;
pub use error::PassError;
pub use pass::{Pass, PassFlags};
pub use pipeline::RenderTargetPair;
pub use quad::FullscreenQuad;
