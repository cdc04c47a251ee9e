use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{error, info, warn};

use jarvis_core::config::QueueConfig;

use crate::store::UploadQueue;

/// Background drain loop that uploads queued captures to the server one
/// at a time, honouring cancellation between items (§4.2, §5). Follows
/// `skynet-scheduler::engine::SchedulerEngine::run`'s select-loop shape.
pub struct UploadWorker {
    queue: Arc<UploadQueue>,
    client: Client,
    server_url: String,
    interval: Duration,
    attempt_timeout: Duration,
}

impl UploadWorker {
    pub fn new(queue: Arc<UploadQueue>, config: &QueueConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upload_attempt_timeout_s))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            queue,
            client,
            server_url: config.server_url.clone(),
            interval: Duration::from_secs(config.upload_worker_interval_s),
            attempt_timeout: Duration::from_secs(config.upload_attempt_timeout_s),
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("upload worker started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.drain_once(&mut shutdown).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("upload worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Drain all currently-pending items, checking for shutdown between
    /// each upload so a large backlog cannot delay a shutdown request.
    async fn drain_once(&self, shutdown: &mut watch::Receiver<bool>) {
        let items = match self.queue.pending(50) {
            Ok(items) => items,
            Err(e) => {
                error!("failed to read pending uploads: {e}");
                return;
            }
        };

        for item in items {
            if *shutdown.borrow() {
                return;
            }

            if let Err(e) = self.queue.mark_uploading(&item.id) {
                warn!(id = %item.id, "failed to mark uploading: {e}");
                continue;
            }

            match self.upload(&item.filepath, &item.metadata).await {
                Ok(()) => {
                    if let Err(e) = self.queue.mark_completed(&item.id) {
                        warn!(id = %item.id, "failed to mark completed: {e}");
                    }
                }
                Err(e) => {
                    warn!(id = %item.id, "upload failed: {e}");
                    if let Err(e) = self.queue.mark_failed(&item.id, &e.to_string()) {
                        warn!(id = %item.id, "failed to mark failed: {e}");
                    }
                }
            }
        }
    }

    async fn upload(&self, filepath: &str, metadata: &serde_json::Value) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(filepath).await?;
        let url = format!("{}/captures", self.server_url);

        let response = tokio::time::timeout(
            self.attempt_timeout,
            self.client
                .post(&url)
                .query(&[("metadata", metadata.to_string())])
                .body(bytes)
                .send(),
        )
        .await??;

        if !response.status().is_success() {
            anyhow::bail!("server returned {}", response.status());
        }
        Ok(())
    }
}
