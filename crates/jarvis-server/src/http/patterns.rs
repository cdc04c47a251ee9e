use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use jarvis_core::types::DetectedPattern;
use jarvis_enrich::db::active_patterns;

use crate::app::AppState;
use crate::error::Result;

/// GET /patterns — the active cohort (§4.9). Detection itself runs on the
/// scheduler's `PatternDetection` job; this is the read-only view.
pub async fn patterns(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DetectedPattern>>> {
    let conn = state.patterns_conn.lock().unwrap();
    let patterns = active_patterns(&conn)?;
    Ok(Json(patterns))
}
