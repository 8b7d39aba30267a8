//! Configuration structs for the afterimage stage and its render targets.

use serde::{Deserialize, Serialize};

use crate::color::FilterMode;

/// Render backend selection preference.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendPreference {
    /// wgpu if compiled in and an adapter is found, else software.
    #[default]
    Auto,
    /// Always use the CPU rasterizer.
    Software,
    /// Require a wgpu device.
    Wgpu,
}

/// Tunable parameters of the afterimage blend.
///
/// `damp` controls trail persistence (closer to 1 gives longer trails) and
/// `cutoff` is the color-magnitude band treated as "unchanged".
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfterimageConfig {
    pub damp: f32,
    pub cutoff: f32,
}

impl AfterimageConfig {
    pub const DEFAULT_DAMP: f32 = 0.96;
    pub const DEFAULT_CUTOFF: f32 = 0.1;

    /// Long trails with a wide flicker-suppression band.
    pub const LONG_TRAILS: Self = Self {
        damp: 0.993,
        cutoff: 0.449,
    };

    pub fn new(damp: f32, cutoff: f32) -> Self {
        Self { damp, cutoff }
    }

    pub fn with_damp(mut self, damp: f32) -> Self {
        self.damp = damp;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff;
        self
    }
}

impl Default for AfterimageConfig {
    fn default() -> Self {
        Self {
            damp: Self::DEFAULT_DAMP,
            cutoff: Self::DEFAULT_CUTOFF,
        }
    }
}

/// Allocation parameters for an offscreen RGBA8 render target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    /// Filter used when the target is sampled at a smaller size.
    pub min_filter: FilterMode,
    /// Filter used when the target is sampled at a larger size.
    pub mag_filter: FilterMode,
}

impl TargetDesc {
    /// RGBA8 target, linear minification, nearest magnification.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Nearest,
        }
    }

    pub fn with_filters(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AfterimageConfig::default();
        assert_eq!(cfg.damp, 0.96);
        assert_eq!(cfg.cutoff, 0.1);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: AfterimageConfig = serde_json::from_str(r#"{"damp": 0.993}"#).unwrap();
        assert!((cfg.damp - 0.993).abs() < 1e-6);
        assert_eq!(cfg.cutoff, AfterimageConfig::DEFAULT_CUTOFF);

        let empty: AfterimageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AfterimageConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let cfg = AfterimageConfig::default().with_damp(0.5).with_cutoff(0.0);
        assert_eq!(cfg, AfterimageConfig::new(0.5, 0.0));
    }

    #[test]
    fn target_desc_filters() {
        let desc = TargetDesc::new(64, 32);
        assert_eq!(desc.min_filter, FilterMode::Linear);
        assert_eq!(desc.mag_filter, FilterMode::Nearest);
    }

    #[test]
    fn backend_preference_serializes_by_name() {
        assert_eq!(BackendPreference::default(), BackendPreference::Auto);
        let pref: BackendPreference = serde_json::from_str(r#""Software""#).unwrap();
        assert_eq!(pref, BackendPreference::Software);
    }
}
