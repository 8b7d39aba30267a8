//! Runtime render backend selection.

use aft_common::config::BackendPreference;
use aft_common::{GpuError, RenderBackend, Resolution};
use tracing::{debug, info, warn};

use crate::software::SoftwareBackend;

/// Human-readable description of a backend preference.
pub fn describe_preference(pref: BackendPreference) -> &'static str {
    match pref {
        BackendPreference::Auto => "Auto (wgpu preferred, software fallback)",
        BackendPreference::Software => "Software rasterizer",
        BackendPreference::Wgpu => "Force wgpu",
    }
}

/// Create a backend with a screen surface of `screen` according to `pref`.
///
/// `Auto` falls back to the software rasterizer when wgpu is not compiled in
/// or no adapter is found. `Wgpu` fails in both cases.
pub fn create_backend(
    pref: BackendPreference,
    screen: Resolution,
) -> Result<Box<dyn RenderBackend>, GpuError> {
    let backend: Box<dyn RenderBackend> = match pref {
        BackendPreference::Software => Box::new(SoftwareBackend::new(screen)),
        BackendPreference::Wgpu => wgpu_backend(screen)?,
        BackendPreference::Auto => match wgpu_backend(screen) {
            Ok(backend) => backend,
            Err(err) => {
                // Without the feature compiled in, the fallback is expected.
                if cfg!(feature = "wgpu") {
                    warn!(error = %err, "wgpu unavailable, using software rasterizer");
                } else {
                    debug!(error = %err, "wgpu unavailable, using software rasterizer");
                }
                Box::new(SoftwareBackend::new(screen))
            }
        },
    };

    info!(
        preference = describe_preference(pref),
        backend = backend.name(),
        %screen,
        "Render backend ready"
    );
    Ok(backend)
}

#[cfg(feature = "wgpu")]
fn wgpu_backend(screen: Resolution) -> Result<Box<dyn RenderBackend>, GpuError> {
    Ok(Box::new(crate::webgpu::WgpuBackend::headless(screen)?))
}

#[cfg(not(feature = "wgpu"))]
fn wgpu_backend(_screen: Resolution) -> Result<Box<dyn RenderBackend>, GpuError> {
    Err(GpuError::DeviceInit(
        "built without the `wgpu` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::writer::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, logs.contents())
    }

    #[test]
    fn software_preference_always_succeeds() {
        let backend = create_backend(BackendPreference::Software, Resolution::new(8, 4)).unwrap();
        assert_eq!(backend.name(), "software");
        assert_eq!(backend.screen_size(), Resolution::new(8, 4));
    }

    #[test]
    fn auto_yields_a_backend() {
        let backend = create_backend(BackendPreference::Auto, Resolution::new(2, 2)).unwrap();
        assert!(["software", "wgpu"].contains(&backend.name()));
    }

    #[test]
    fn ready_log_names_preference() {
        let (backend, logs) = with_captured_logs(|| {
            create_backend(BackendPreference::Software, Resolution::new(2, 2))
        });
        assert!(backend.is_ok());
        assert!(logs.contains("Render backend ready"));
        assert!(logs.contains(describe_preference(BackendPreference::Software)));
    }

    #[cfg(not(feature = "wgpu"))]
    #[test]
    fn auto_fallback_logs_reason_at_debug() {
        let (backend, logs) = with_captured_logs(|| {
            create_backend(BackendPreference::Auto, Resolution::new(4, 2))
        });
        let backend = backend.unwrap();
        assert_eq!(backend.name(), "software");
        assert_eq!(backend.screen_size(), Resolution::new(4, 2));

        let fallback = logs
            .lines()
            .find(|line| line.contains("using software rasterizer"))
            .expect("fallback was not logged");
        assert!(fallback.contains("DEBUG"));
        assert!(fallback.contains("built without the `wgpu` feature"));
    }

    #[cfg(not(feature = "wgpu"))]
    #[test]
    fn forced_wgpu_without_feature_fails() {
        let err = create_backend(BackendPreference::Wgpu, Resolution::new(2, 2))
            .err()
            .unwrap();
        assert!(matches!(err, GpuError::DeviceInit(_)));
    }

    #[test]
    fn descriptions_are_distinct() {
        assert_ne!(
            describe_preference(BackendPreference::Auto),
            describe_preference(BackendPreference::Software)
        );
    }
}
