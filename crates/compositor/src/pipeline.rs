//! Ping-pong render target pair.
//!
//! The [`RenderTargetPair`] owns two equally sized render targets that
//! alternate roles. The current target holds the last completed result; the
//! back target receives the next one. Swapping flips an index and never
//! copies pixels or reallocates.

use aft_common::{GpuError, RenderBackend, RenderTarget, Resolution, TargetDesc, TextureHandle};
use tracing::debug;

use crate::PassError;

/// Two render targets used alternately as read source and write destination.
pub struct RenderTargetPair {
    /// The two targets used alternately.
    targets: [RenderTarget; 2],
    /// Index of the current (read) target (0 or 1).
    current: usize,
}

impl RenderTargetPair {
    /// Allocate both targets from `desc`.
    ///
    /// A zero dimension is rejected with [`PassError::InvalidResize`].
    pub fn new(backend: &mut dyn RenderBackend, desc: &TargetDesc) -> Result<Self, PassError> {
        check_size(desc.width, desc.height)?;

        debug!(
            width = desc.width,
            height = desc.height,
            min_filter = ?desc.min_filter,
            mag_filter = ?desc.mag_filter,
            "Allocating ping-pong render targets"
        );

        let a = backend.create_target(desc)?;
        let b = backend.create_target(desc)?;

        Ok(Self {
            targets: [a, b],
            current: 0,
        })
    }

    /// The target holding the last completed result.
    pub fn current(&self) -> &RenderTarget {
        &self.targets[self.current]
    }

    /// The target that receives the next result.
    pub fn back(&self) -> &RenderTarget {
        &self.targets[1 - self.current]
    }

    /// Exchange the roles of the two targets.
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }

    /// Reallocate both targets at a new size. Roles are kept; contents are
    /// unspecified afterwards.
    ///
    /// Both targets are checked against the backend before either is
    /// reallocated, so a rejected resize leaves the pair untouched.
    pub fn resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<(), PassError> {
        check_size(width, height)?;
        for handle in self.handles() {
            if !backend.has_target(handle) {
                return Err(GpuError::UnknownTarget(handle).into());
            }
        }

        let resolution = Resolution::new(width, height);
        debug!(%resolution, "Resizing ping-pong render targets");

        for target in &mut self.targets {
            backend.resize_target(target, resolution)?;
        }
        Ok(())
    }

    /// Fill the current target with a constant byte in every channel.
    pub fn fill_current(&self, backend: &mut dyn RenderBackend, value: u8) -> Result<(), PassError> {
        let target = self.current();
        let pixels = vec![value; target.resolution().rgba_byte_size()];
        backend.write_target(target, &pixels)?;
        Ok(())
    }

    /// Texture handles of both targets, in allocation order.
    pub fn handles(&self) -> [TextureHandle; 2] {
        [self.targets[0].texture(), self.targets[1].texture()]
    }

    /// Shared size of both targets.
    pub fn resolution(&self) -> Resolution {
        self.targets[0].resolution()
    }

    pub fn width(&self) -> u32 {
        self.targets[0].width()
    }

    pub fn height(&self) -> u32 {
        self.targets[0].height()
    }
}

pub(crate) fn check_size(width: u32, height: u32) -> Result<(), PassError> {
    if width == 0 || height == 0 {
        return Err(PassError::InvalidResize { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aft_gpu_hal::SoftwareBackend;

    fn pair(backend: &mut SoftwareBackend, width: u32, height: u32) -> RenderTargetPair {
        RenderTargetPair::new(backend, &TargetDesc::new(width, height)).unwrap()
    }

    #[test]
    fn swap_alternates_roles() {
        let mut backend = SoftwareBackend::default();
        let mut targets = pair(&mut backend, 4, 4);
        let [a, b] = targets.handles();

        assert_eq!(targets.current().texture(), a);
        assert_eq!(targets.back().texture(), b);

        targets.swap();
        assert_eq!(targets.current().texture(), b);
        assert_eq!(targets.back().texture(), a);

        targets.swap();
        assert_eq!(targets.current().texture(), a);
    }

    #[test]
    fn swap_does_not_allocate() {
        let mut backend = SoftwareBackend::default();
        let mut targets = pair(&mut backend, 4, 4);
        for _ in 0..5 {
            targets.swap();
        }
        assert_eq!(backend.target_count(), 2);
    }

    #[test]
    fn resize_keeps_roles_and_updates_both() {
        let mut backend = SoftwareBackend::default();
        let mut targets = pair(&mut backend, 4, 4);
        targets.swap();
        let current = targets.current().texture();

        targets.resize(&mut backend, 16, 9).unwrap();

        assert_eq!(targets.current().texture(), current);
        assert_eq!(targets.current().resolution(), Resolution::new(16, 9));
        assert_eq!(targets.back().resolution(), Resolution::new(16, 9));
        assert_eq!(targets.resolution(), Resolution::new(16, 9));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut backend = SoftwareBackend::default();
        let mut targets = pair(&mut backend, 4, 4);

        let err = targets.resize(&mut backend, 0, 10).unwrap_err();
        assert!(matches!(
            err,
            PassError::InvalidResize {
                width: 0,
                height: 10
            }
        ));
        assert_eq!(targets.width(), 4);
        assert_eq!(targets.height(), 4);

        assert!(RenderTargetPair::new(&mut backend, &TargetDesc::new(3, 0)).is_err());
    }

    #[test]
    fn resize_with_foreign_target_changes_nothing() {
        let mut owner = SoftwareBackend::default();
        let mut targets = pair(&mut owner, 4, 4);
        let [first, second] = targets.handles();

        // Only the first handle exists on the other backend.
        let mut other = SoftwareBackend::default();
        let lone = other.create_target(&TargetDesc::new(4, 4)).unwrap();
        assert_eq!(lone.texture(), first);
        assert!(!other.has_target(second));

        let err = targets.resize(&mut other, 8, 8).unwrap_err();
        assert!(matches!(
            err,
            PassError::Gpu(GpuError::UnknownTarget(handle)) if handle == second
        ));
        assert_eq!(targets.resolution(), Resolution::new(4, 4));
        assert_eq!(targets.back().resolution(), Resolution::new(4, 4));
        assert_eq!(other.read_target(&lone).unwrap().len(), 4 * 4 * 4);
    }

    #[test]
    fn fill_current_writes_only_current() {
        let mut backend = SoftwareBackend::default();
        let targets = pair(&mut backend, 2, 2);
        targets.fill_current(&mut backend, 0xFF).unwrap();

        assert_eq!(
            backend.texel(targets.current().texture(), 1, 1),
            Some([255, 255, 255, 255])
        );
        assert_eq!(
            backend.texel(targets.back().texture(), 1, 1),
            Some([0, 0, 0, 0])
        );
    }
}
