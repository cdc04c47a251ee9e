//! POST /captures — screenshot ingestion (§4.3), GET /captures/{id}.
//!
//! Matches `jarvis_queue::UploadWorker::upload`'s wire contract exactly:
//! raw image bytes as the body, capture metadata as a JSON string in the
//! `metadata` query parameter (`{"monitor_index", "width", "height"}`).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jarvis_core::types::{Capture, CaptureStatus};
use jarvis_scheduler::{JobKind, Schedule};

use crate::app::AppState;
use crate::error::{ApiError, Result};

#[derive(Deserialize)]
pub struct CaptureMetadata {
    #[serde(default)]
    pub monitor_index: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub metadata: String,
}

#[derive(Serialize)]
pub struct CaptureResponse {
    pub id: Uuid,
    pub status: CaptureStatus,
}

/// POST /captures?metadata=<json> — body is the raw screenshot bytes.
/// Bytes land on disk under `database.capture_root` before the metadata
/// row is written; if the row insert fails the file is removed so a
/// retried upload doesn't collide with an orphaned file.
pub async fn upload_capture(State(state): State<Arc<AppState>>, Query(query): Query<UploadQuery>, body: Bytes) -> Result<Json<CaptureResponse>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty image payload".into()));
    }
    let metadata: CaptureMetadata =
        serde_json::from_str(&query.metadata).map_err(|e| ApiError::BadRequest(format!("invalid metadata: {e}")))?;

    let id = Uuid::new_v4();
    std::fs::create_dir_all(&state.config.database.capture_root).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let filepath = format!("{}/{}.jpg", state.config.database.capture_root, id);
    std::fs::write(&filepath, &body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let capture = Capture {
        id,
        timestamp: Utc::now(),
        monitor_index: metadata.monitor_index,
        width: metadata.width,
        height: metadata.height,
        byte_size: body.len() as i64,
        filepath: filepath.clone(),
        ocr_text: None,
        status: CaptureStatus::Pending,
    };

    if let Err(e) = state.memory.insert_capture(&capture) {
        let _ = std::fs::remove_file(&filepath);
        return Err(e.into());
    }

    state.scheduler.add_typed_job(
        &format!("process capture {id}"),
        Schedule::Once { at: Utc::now() },
        &JobKind::ProcessCapture { capture_id: id.to_string() },
    )?;

    Ok(Json(CaptureResponse { id, status: CaptureStatus::Pending }))
}

/// GET /captures/{id}
pub async fn get_capture(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Json<Capture>> {
    state
        .memory
        .get_capture(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound { kind: "capture", id: id.to_string() })
}
