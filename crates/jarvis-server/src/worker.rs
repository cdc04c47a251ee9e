//! Runs the scheduler's tick loop and executes whatever job it fires.
//! `SchedulerEngine::run` only flips DB rows and forwards due jobs down a
//! channel (C12); turning a [`JobKind`] into actual work is this
//! workspace's job, same division of labour the teacher had between its
//! engine and whatever consumed fired chat-triggered jobs.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use jarvis_core::types::CaptureStatus;
use jarvis_enrich::patterns::{detect_heuristic, replace_active_cohort};
use jarvis_memory::ingest_text;
use jarvis_scheduler::{Job, JobKind, SchedulerEngine};

use crate::app::AppState;

const BACKLOG_BATCH_SIZE: i64 = 25;

pub fn spawn(state: Arc<AppState>) {
    let (fired_tx, mut fired_rx) = mpsc::channel::<Job>(64);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let conn = match Connection::open(&state.config.database.path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to open scheduler engine connection: {e}, background jobs disabled");
            return;
        }
    };
    let engine = match SchedulerEngine::new(conn, Some(fired_tx)) {
        Ok(e) => e,
        Err(e) => {
            error!("failed to start scheduler engine: {e}, background jobs disabled");
            return;
        }
    };

    tokio::spawn(engine.run(shutdown_rx));

    tokio::spawn(async move {
        while let Some(job) = fired_rx.recv().await {
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = run_job(&state, &job).await {
                    error!(job_id = %job.id, job_name = %job.name, "job failed: {e}");
                }
            });
        }
    });
}

async fn run_job(state: &Arc<AppState>, job: &Job) -> anyhow::Result<()> {
    let kind = job.job_kind()?;
    info!(job_id = %job.id, ?kind, "running fired job");
    match kind {
        JobKind::ProcessCapture { capture_id } => process_capture(state, &capture_id).await,
        JobKind::ProcessBacklog => process_backlog(state).await,
        JobKind::CalendarSync | JobKind::EmailSync => {
            warn!("{kind:?} has no configured collaborator, skipping (degraded per C9 design)");
            Ok(())
        }
        JobKind::PatternDetection => run_pattern_detection(state).await,
        JobKind::ReclassifyEntities => reclassify_entities(state).await,
    }
}

async fn process_capture(state: &Arc<AppState>, capture_id: &str) -> anyhow::Result<()> {
    let id: uuid::Uuid = capture_id.parse()?;
    let Some(capture) = state.memory.get_capture(id)? else {
        warn!(capture_id, "capture vanished before processing");
        return Ok(());
    };

    state.memory.set_capture_status(id, CaptureStatus::Processing, None)?;

    let text = state.ocr.extract(&capture.filepath).await?;
    state.memory.set_capture_status(id, CaptureStatus::Processing, Some(&text))?;

    // Empty OCR text is a legal result (a blank/text-free screenshot); it
    // simply produces no chunks, not a failure (§3/§4.3 step 5).
    let count = if text.is_empty() {
        0
    } else {
        ingest_text(
            &state.memory,
            state.vector_store.as_ref(),
            &state.embedder,
            "screen",
            capture_id,
            None,
            &text,
            capture.timestamp,
            state.config.memory.min_chunk_chars,
            state.config.memory.max_chunk_chars,
        )
        .await?
    };

    info!(capture_id, chunks = count, "capture ingested");
    state.memory.set_capture_status(id, CaptureStatus::Completed, None)?;
    Ok(())
}

async fn process_backlog(state: &Arc<AppState>) -> anyhow::Result<()> {
    let pending = state.memory.captures_by_status(CaptureStatus::Pending, BACKLOG_BATCH_SIZE)?;
    for capture in pending {
        let kind = JobKind::ProcessCapture { capture_id: capture.id.to_string() };
        state.scheduler.add_typed_job(
            &format!("backlog capture {}", capture.id),
            jarvis_scheduler::Schedule::Once { at: chrono::Utc::now() },
            &kind,
        )?;
    }
    Ok(())
}

async fn run_pattern_detection(state: &Arc<AppState>) -> anyhow::Result<()> {
    let patterns = detect_heuristic(state.vector_store.as_ref()).await?;
    replace_active_cohort(&state.patterns_conn, &patterns)?;
    info!(count = patterns.len(), "pattern detection cohort replaced");
    Ok(())
}

async fn reclassify_entities(state: &Arc<AppState>) -> anyhow::Result<()> {
    let points = state.vector_store.scroll_payloads(jarvis_memory::vectorstore::MEMORY_CHUNKS_COLLECTION).await?;
    let mut names: std::collections::HashSet<String> = std::collections::HashSet::new();
    for point in &points {
        for key in ["people", "projects"] {
            if let Some(values) = point.payload.get(key).and_then(|v| v.as_array()) {
                for v in values {
                    if let Some(name) = v.as_str() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
    }
    let names: Vec<String> = names.into_iter().collect();
    let classified = state.llm_cache.classify_cached(&state.memory, &names).await?;
    info!(count = classified.len(), "entity reclassification batch complete");
    Ok(())
}
