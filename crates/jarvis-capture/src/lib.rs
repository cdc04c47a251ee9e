pub mod backend;
pub mod detector;
pub mod hash;
pub mod loop_;

pub use backend::{ExclusionFilterBackend, IdleDetectorBackend, RawCapture, ScreenCaptureBackend};
pub use detector::{CaptureReason, ChangeDetector};
pub use loop_::{CaptureLoop, CaptureObserver, CaptureResult, CaptureState};
