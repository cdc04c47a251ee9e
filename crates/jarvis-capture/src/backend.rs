use async_trait::async_trait;
use image::DynamicImage;

/// A single captured monitor frame plus its JPEG-encoded bytes.
pub struct RawCapture {
    pub monitor_index: i32,
    pub image: DynamicImage,
    pub jpeg_bytes: Vec<u8>,
}

/// Narrow capability interface over the concrete screenshot backend (§9:
/// "dynamic dispatch / duck-typed collaborators"). The concrete backend
/// (X11/Wayland/macOS/Windows screen grabbing) is explicitly out of scope
/// (§1) — callers supply an implementation.
#[async_trait]
pub trait ScreenCaptureBackend: Send + Sync {
    /// Capture every currently active monitor.
    async fn capture_active(&self) -> anyhow::Result<Vec<RawCapture>>;
}

/// Narrow capability interface over idle-time detection.
pub trait IdleDetectorBackend: Send + Sync {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_idle(&self) -> bool;
}

/// Narrow capability interface over the active-window/app exclusion filter.
pub trait ExclusionFilterBackend: Send + Sync {
    /// Returns `Some(pattern)` naming the exclusion rule that matched the
    /// currently active window, or `None` if capture should proceed.
    fn should_exclude(&self, active_window: Option<&str>) -> Option<String>;
}

/// Deterministic test/offline double for [`ScreenCaptureBackend`] — never
/// idle, never excludes, captures one fixed-size solid-color frame per
/// monitor. Also serves as the "null" fallback per §9 when no real backend
/// is configured.
pub struct NullScreenCapture {
    pub monitor_count: i32,
}

#[async_trait]
impl ScreenCaptureBackend for NullScreenCapture {
    async fn capture_active(&self) -> anyhow::Result<Vec<RawCapture>> {
        use image::{Rgba, RgbaImage};
        let mut out = Vec::with_capacity(self.monitor_count as usize);
        for m in 0..self.monitor_count {
            let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |_, _| {
                Rgba([0, 0, 0, 255])
            }));
            out.push(RawCapture {
                monitor_index: m,
                image: img,
                jpeg_bytes: Vec::new(),
            });
        }
        Ok(out)
    }
}

/// Always-active idle detector — used in tests and as a safe default.
#[derive(Default)]
pub struct NeverIdle;

impl IdleDetectorBackend for NeverIdle {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn is_idle(&self) -> bool {
        false
    }
}

/// Exclusion filter that never excludes — used in tests and as a safe default.
#[derive(Default)]
pub struct NoExclusions;

impl ExclusionFilterBackend for NoExclusions {
    fn should_exclude(&self, _active_window: Option<&str>) -> Option<String> {
        None
    }
}
