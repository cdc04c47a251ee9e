//! Agent-side process: runs the capture loop (C1) and drains the upload
//! queue (C2) against a `jarvis-server` instance. The concrete screen
//! capture backend is a caller-supplied collaborator (out of scope); this
//! binary wires up [`jarvis_capture::backend::NullScreenCapture`] until a
//! platform-specific backend is plugged in.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use jarvis_capture::{CaptureLoop, CaptureObserver, CaptureResult};
use jarvis_capture::backend::{NeverIdle, NoExclusions, NullScreenCapture};
use jarvis_queue::{UploadQueue, UploadWorker};

/// Writes each capture to the staging directory and enqueues it for upload.
struct QueueingObserver {
    queue: Arc<UploadQueue>,
    staging_dir: String,
}

impl CaptureObserver for QueueingObserver {
    fn on_capture(&self, result: &CaptureResult) {
        let (width, height) = image::load_from_memory(&result.jpeg_bytes)
            .map(|img| (img.width() as i32, img.height() as i32))
            .unwrap_or((0, 0));

        let filepath = format!("{}/{}.jpg", self.staging_dir, Uuid::new_v4());
        if let Err(e) = std::fs::write(&filepath, &result.jpeg_bytes) {
            warn!("failed to write capture to staging dir: {e}");
            return;
        }

        let metadata = serde_json::json!({
            "monitor_index": result.monitor_index,
            "width": width,
            "height": height,
        });

        if let Err(e) = self.queue.enqueue(&filepath, &metadata) {
            warn!("failed to enqueue capture: {e}");
            let _ = std::fs::remove_file(&filepath);
        }
    }

    fn on_skip(&self, reason: &str) {
        info!(reason, "capture skipped");
    }

    fn on_state_change(&self, state: jarvis_capture::CaptureState) {
        info!(?state, "capture loop state changed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jarvis_agent_bin=info".into()),
        )
        .init();

    let config_path = std::env::var("JARVIS_CONFIG").ok();
    let config = jarvis_core::config::JarvisConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({}), using defaults", e);
        jarvis_core::config::JarvisConfig::default()
    });

    let staging_dir = {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.jarvis/staging")
    };
    std::fs::create_dir_all(&staging_dir)?;
    if let Some(parent) = Path::new(&config.queue.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let queue = Arc::new(UploadQueue::open(&config.queue.db_path, &config.queue)?);
    let upload_worker = UploadWorker::new(queue.clone(), &config.queue);

    let mut capture_loop = CaptureLoop::new(
        Box::new(NullScreenCapture { monitor_count: 1 }),
        Box::new(NeverIdle),
        Box::new(NoExclusions),
        Duration::from_secs(config.capture.min_interval_s),
        config.capture.hash_threshold,
        Duration::from_secs(config.capture.watchdog_timeout_s),
        config.capture.max_consecutive_errors,
    );
    capture_loop.add_observer(Arc::new(QueueingObserver { queue, staging_dir }));
    let capture_loop = Arc::new(capture_loop);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let capture_task = tokio::spawn({
        let capture_loop = capture_loop.clone();
        let shutdown_rx = shutdown_rx.clone();
        async move { capture_loop.run(shutdown_rx).await }
    });
    let upload_task = tokio::spawn(async move { upload_worker.run(shutdown_rx).await });

    info!("jarvis agent running");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    shutdown_tx.send(true)?;

    let _ = tokio::join!(capture_task, upload_task);
    Ok(())
}
