use std::collections::HashMap;
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::hash::{dhash, hamming_distance};

/// Why a capture was taken or skipped for a given monitor (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureReason {
    FirstCapture,
    ContentChanged,
    IntervalElapsed,
    NoChange,
}

impl CaptureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureReason::FirstCapture => "first_capture",
            CaptureReason::ContentChanged => "content_changed",
            CaptureReason::IntervalElapsed => "interval_elapsed",
            CaptureReason::NoChange => "no_change",
        }
    }
}

struct MonitorRecord {
    last_hash: u64,
    last_capture: Instant,
}

/// Per-monitor perceptual-hash + interval change decision (§4.1).
///
/// Maintains the last captured image's hash and capture time per monitor
/// index. `min_interval` and `hash_threshold` are caller-supplied so tests
/// can exercise both branches deterministically (§9's note on
/// `hash_threshold` being a first-class tunable).
pub struct ChangeDetector {
    min_interval: Duration,
    hash_threshold: u32,
    records: HashMap<i32, MonitorRecord>,
}

impl ChangeDetector {
    pub fn new(min_interval: Duration, hash_threshold: u32) -> Self {
        Self {
            min_interval,
            hash_threshold,
            records: HashMap::new(),
        }
    }

    /// Decide whether `image` for `monitor_index` should be captured.
    pub fn should_capture(&self, monitor_index: i32, image: &DynamicImage) -> (bool, CaptureReason) {
        let new_hash = dhash(image);
        match self.records.get(&monitor_index) {
            None => (true, CaptureReason::FirstCapture),
            Some(record) => {
                let distance = hamming_distance(new_hash, record.last_hash);
                if distance >= self.hash_threshold {
                    (true, CaptureReason::ContentChanged)
                } else if record.last_capture.elapsed() >= self.min_interval {
                    (true, CaptureReason::IntervalElapsed)
                } else {
                    (false, CaptureReason::NoChange)
                }
            }
        }
    }

    /// Record that `image` was captured for `monitor_index` just now.
    pub fn record_capture(&mut self, monitor_index: i32, image: &DynamicImage) {
        self.records.insert(
            monitor_index,
            MonitorRecord {
                last_hash: dhash(image),
                last_capture: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(px: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |_, _| Rgba([px, px, px, 255])))
    }

    fn checkerboard() -> DynamicImage {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = if (x / 4 + y / 4) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            };
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn first_capture_then_no_change() {
        let mut d = ChangeDetector::new(Duration::from_secs(60), 10);
        let img_a = solid(10);

        let (should, reason) = d.should_capture(0, &img_a);
        assert!(should);
        assert_eq!(reason, CaptureReason::FirstCapture);

        d.record_capture(0, &img_a);

        let (should, reason) = d.should_capture(0, &img_a);
        assert!(!should);
        assert_eq!(reason, CaptureReason::NoChange);
    }

    #[test]
    fn interval_elapsed_after_min_interval() {
        let mut d = ChangeDetector::new(Duration::from_millis(1), 10);
        let img_a = solid(10);
        d.record_capture(0, &img_a);
        std::thread::sleep(Duration::from_millis(5));

        let (should, reason) = d.should_capture(0, &img_a);
        assert!(should);
        assert_eq!(reason, CaptureReason::IntervalElapsed);
    }

    #[test]
    fn content_changed_above_threshold() {
        let mut d = ChangeDetector::new(Duration::from_secs(60), 5);
        let img_a = solid(10);
        d.record_capture(0, &img_a);

        let img_b = checkerboard();
        let (should, reason) = d.should_capture(0, &img_b);
        assert!(should);
        assert_eq!(reason, CaptureReason::ContentChanged);
    }
}
