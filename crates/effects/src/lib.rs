//! `aft-effects` — fullscreen shader programs and their registry.
//!
//! This crate provides:
//! - The [`Effect`] trait every program implements
//! - An [`EffectRegistry`] for by-name lookup
//! - Parameter validation and conversion helpers
//! - Two built-in programs:
//!   - **Afterimage**: per-pixel decay blend of the accumulated frame against
//!     the incoming frame ([`afterimage_mix`] is its CPU form)
//!   - **Copy**: pass-through sample with opacity
//!
//! Each program ships WGSL stages for GPU backends and a CPU reference
//! fragment that the software backend executes.

pub mod afterimage;
pub mod copy;
pub mod error;
pub mod fullscreen;
pub mod params;
pub mod registry;
pub mod traits;

// Re-export primary types at crate root.
pub use afterimage::{afterimage_mix, AfterimageShader, AFTERIMAGE};
pub use copy::{CopyShader, COPY};
pub use error::EffectError;
pub use params::{get_param_or_default, validate_params};
pub use registry::EffectRegistry;
pub use traits::Effect;
