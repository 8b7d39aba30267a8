//! Afterimage pass: temporal feedback trails.
//!
//! Each frame the incoming image is blended against the accumulated result
//! of the previous frame (see [`aft_effects::afterimage_mix`]), the blend is
//! copied to the destination, and the two internal targets swap roles so the
//! fresh blend becomes next frame's "old" input.
//!
//! The pass owns two render targets with linear minification and nearest
//! magnification. Before the first frame the accumulated target is filled
//! with opaque white.

use aft_common::{
    AfterimageConfig, FrameNumber, ParamValue, RenderBackend, RenderTarget, Resolution,
    TargetDesc, TextureHandle, Uniforms,
};
use aft_effects::afterimage::{AFTERIMAGE, CUTOFF, DAMP, T_NEW, T_OLD};
use aft_effects::copy::{COPY, OPACITY, T_DIFFUSE};
use aft_effects::{AfterimageShader, EffectRegistry};
use tracing::{debug, error, info, warn};

use crate::pass::{Pass, PassFlags};
use crate::pipeline::RenderTargetPair;
use crate::quad::FullscreenQuad;
use crate::PassError;

/// Fill value of the accumulated target before the first frame.
pub const SEED_VALUE: u8 = 0xFF;

/// Blend program inputs for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AfterimageUniforms {
    pub cutoff: f32,
    pub damp: f32,
    /// Accumulated result of the previous frame.
    pub texture_old: TextureHandle,
    /// Incoming frame.
    pub texture_new: TextureHandle,
}

impl AfterimageUniforms {
    pub fn to_uniforms(&self) -> Uniforms {
        Uniforms::new()
            .push_f32(CUTOFF, self.cutoff)
            .push_f32(DAMP, self.damp)
            .push_texture(T_OLD, self.texture_old)
            .push_texture(T_NEW, self.texture_new)
    }
}

/// The afterimage pipeline stage.
pub struct AfterimagePass {
    config: AfterimageConfig,
    targets: RenderTargetPair,
    /// `None` when the blend program was unavailable at construction.
    blend: Option<FullscreenQuad>,
    copy: FullscreenQuad,
    clear: bool,
    enabled: bool,
    frame: FrameNumber,
}

impl AfterimagePass {
    /// Build the pass at `resolution`.
    ///
    /// Fails with [`PassError::MissingShaderResource`] if the registry lacks
    /// the `afterimage` or `copy` program.
    pub fn new(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
        resolution: Resolution,
        config: AfterimageConfig,
    ) -> Result<Self, PassError> {
        let blend = FullscreenQuad::from_registry(backend, registry, AFTERIMAGE)?;
        Self::build(backend, registry, resolution, config, Some(blend))
    }

    /// Like [`new`](Self::new), but a missing `afterimage` program is logged
    /// and yields a degraded pass that skips the blend draw. Its output is
    /// undefined but the pipeline keeps running.
    pub fn new_or_degraded(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
        resolution: Resolution,
        config: AfterimageConfig,
    ) -> Result<Self, PassError> {
        match Self::new(backend, registry, resolution, config) {
            Err(PassError::MissingShaderResource { name }) if name == AFTERIMAGE => {
                error!(
                    shader = AFTERIMAGE,
                    "Afterimage blend program unavailable, continuing without it"
                );
                Self::build(backend, registry, resolution, config, None)
            }
            result => result,
        }
    }

    fn build(
        backend: &mut dyn RenderBackend,
        registry: &EffectRegistry,
        resolution: Resolution,
        config: AfterimageConfig,
        blend: Option<FullscreenQuad>,
    ) -> Result<Self, PassError> {
        let copy = FullscreenQuad::from_registry(backend, registry, COPY)?;

        let desc = TargetDesc::new(resolution.width, resolution.height);
        let targets = RenderTargetPair::new(backend, &desc)?;
        targets.fill_current(backend, SEED_VALUE)?;

        info!(
            %resolution,
            damp = config.damp,
            cutoff = config.cutoff,
            degraded = blend.is_none(),
            "Afterimage pass created"
        );

        Ok(Self {
            config,
            targets,
            blend,
            copy,
            clear: false,
            enabled: true,
            frame: FrameNumber::ZERO,
        })
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn config(&self) -> AfterimageConfig {
        self.config
    }

    pub fn set_config(&mut self, config: AfterimageConfig) {
        self.config = config;
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.config.damp = damp;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.config.cutoff = cutoff;
    }

    /// Rebuild the blend parameters from named values.
    ///
    /// Names absent from `params` take their defaults. On a rejected value
    /// the current config is kept.
    pub fn set_params(&mut self, params: &[(String, ParamValue)]) -> Result<(), PassError> {
        self.config = AfterimageShader::new().config_from_params(params)?;
        Ok(())
    }

    /// True if the blend program was unavailable at construction.
    pub fn is_degraded(&self) -> bool {
        self.blend.is_none()
    }

    /// Target holding the previous frame's result.
    pub fn accumulated(&self) -> &RenderTarget {
        self.targets.current()
    }

    /// Target that receives the next blend.
    pub fn scratch(&self) -> &RenderTarget {
        self.targets.back()
    }

    /// Texture handles of the two internal targets, in allocation order.
    pub fn target_handles(&self) -> [TextureHandle; 2] {
        self.targets.handles()
    }

    pub fn resolution(&self) -> Resolution {
        self.targets.resolution()
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> FrameNumber {
        self.frame
    }

    /// Blend inputs for a frame whose incoming image is `texture_new`.
    pub fn uniforms(&self, texture_new: TextureHandle) -> AfterimageUniforms {
        AfterimageUniforms {
            cutoff: self.config.cutoff,
            damp: self.config.damp,
            texture_old: self.targets.current().texture(),
            texture_new,
        }
    }
}

impl Pass for AfterimagePass {
    fn name(&self) -> &str {
        AFTERIMAGE
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn clear(&self) -> bool {
        self.clear
    }

    fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        write: &RenderTarget,
        read: &RenderTarget,
        flags: PassFlags,
    ) -> Result<(), PassError> {
        let uniforms = self.uniforms(read.texture());

        backend.set_render_target(Some(self.targets.back()));
        match &self.blend {
            Some(blend) => blend.draw(backend, &uniforms.to_uniforms())?,
            None => warn!(frame = %self.frame, "Skipping afterimage blend, program unavailable"),
        }

        let copy_uniforms = Uniforms::new()
            .push_f32(OPACITY, 1.0)
            .push_texture(T_DIFFUSE, self.targets.back().texture());

        if flags.render_to_screen {
            backend.set_render_target(None);
        } else {
            backend.set_render_target(Some(write));
            if flags.clear {
                backend.clear()?;
            }
        }
        self.copy.draw(backend, &copy_uniforms)?;

        self.targets.swap();

        debug!(
            frame = %self.frame,
            old = %uniforms.texture_old,
            new = %uniforms.texture_new,
            accumulated = %self.targets.current().texture(),
            to_screen = flags.render_to_screen,
            "Afterimage frame rendered"
        );
        self.frame = self.frame + 1;
        Ok(())
    }

    fn set_size(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<(), PassError> {
        self.targets.resize(backend, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aft_gpu_hal::SoftwareBackend;

    fn pass(backend: &mut SoftwareBackend) -> AfterimagePass {
        AfterimagePass::new(
            backend,
            &EffectRegistry::with_builtins(),
            Resolution::new(2, 2),
            AfterimageConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn uniforms_reference_accumulated_target() {
        let mut backend = SoftwareBackend::default();
        let pass = pass(&mut backend);
        let uniforms = pass.uniforms(TextureHandle(99));

        assert_eq!(uniforms.texture_old, pass.accumulated().texture());
        assert_eq!(uniforms.texture_new, TextureHandle(99));
        assert_eq!(uniforms.damp, AfterimageConfig::DEFAULT_DAMP);
        assert_eq!(uniforms.cutoff, AfterimageConfig::DEFAULT_CUTOFF);
    }

    #[test]
    fn uniforms_carry_all_bindings() {
        let uniforms = AfterimageUniforms {
            cutoff: 0.449,
            damp: 0.993,
            texture_old: TextureHandle(1),
            texture_new: TextureHandle(2),
        }
        .to_uniforms();

        assert_eq!(uniforms.len(), 4);
        assert_eq!(uniforms.float(CUTOFF), Some(0.449));
        assert_eq!(uniforms.float(DAMP), Some(0.993));
        assert_eq!(uniforms.texture(T_OLD), Some(TextureHandle(1)));
        assert_eq!(uniforms.texture(T_NEW), Some(TextureHandle(2)));
    }

    #[test]
    fn config_setters_apply_to_next_frame() {
        let mut backend = SoftwareBackend::default();
        let mut pass = pass(&mut backend);
        pass.set_damp(0.5);
        pass.set_cutoff(0.0);
        assert_eq!(pass.config(), AfterimageConfig::new(0.5, 0.0));
        assert_eq!(pass.uniforms(TextureHandle(1)).damp, 0.5);

        pass.set_config(AfterimageConfig::LONG_TRAILS);
        assert_eq!(pass.uniforms(TextureHandle(1)).cutoff, 0.449);
    }

    #[test]
    fn set_params_applies_named_values() {
        let mut backend = SoftwareBackend::default();
        let mut pass = pass(&mut backend);
        pass.set_params(&[(DAMP.to_string(), ParamValue::Float(0.993))])
            .unwrap();
        assert_eq!(
            pass.config(),
            AfterimageConfig::new(0.993, AfterimageConfig::DEFAULT_CUTOFF)
        );
    }

    #[test]
    fn set_params_rejects_out_of_range_and_keeps_config() {
        let mut backend = SoftwareBackend::default();
        let mut pass = pass(&mut backend);
        pass.set_config(AfterimageConfig::LONG_TRAILS);

        let err = pass
            .set_params(&[(CUTOFF.to_string(), ParamValue::Float(3.0))])
            .unwrap_err();
        assert!(matches!(err, PassError::Effect(_)));
        assert_eq!(pass.config(), AfterimageConfig::LONG_TRAILS);
    }

    #[test]
    fn pass_metadata() {
        let mut backend = SoftwareBackend::default();
        let mut pass = pass(&mut backend).with_clear(true);
        assert_eq!(pass.name(), "afterimage");
        assert!(pass.clear());
        assert!(pass.needs_swap());
        assert!(pass.enabled());
        assert!(!pass.is_degraded());
        pass.set_enabled(false);
        assert!(!pass.enabled());
    }
}
