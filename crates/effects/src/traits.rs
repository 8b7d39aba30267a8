//! Effect trait definition.
//!
//! Every fullscreen program in the library implements [`Effect`], which
//! describes its parameters and hands out the [`ProgramSource`] a backend
//! compiles. Drawing is done by the compositor through
//! [`aft_common::RenderBackend`].

use aft_common::{ParamDef, ProgramSource};

/// Trait for all fullscreen shader effects.
pub trait Effect: Send + Sync {
    /// Unique effect name (registry key and program name).
    fn name(&self) -> &str;

    /// Display name for UI.
    fn display_name(&self) -> &str;

    /// Parameter definitions (for UI generation and validation).
    fn param_defs(&self) -> &[ParamDef];

    /// Shader stages, uniform layout, and CPU reference fragment.
    fn program_source(&self) -> ProgramSource;
}
