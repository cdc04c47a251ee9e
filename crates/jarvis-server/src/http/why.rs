//! GET /why/{suggestion_type}/{id} — explains why a suggestion surfaced.
//! Pattern/capture/conversation are backed by local storage; meeting and
//! calendar suggestions come from an external adapter this workspace has
//! no persistence for, so those two types return 503 until a calendar/email
//! collaborator is wired in.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use jarvis_core::types::WhyPayload;
use jarvis_core::JarvisError;
use jarvis_enrich::db::active_patterns;
use jarvis_why::{build_why, parse_suggestion_type, WhyTarget};

use crate::app::AppState;
use crate::error::{ApiError, Result};

pub async fn why(State(state): State<Arc<AppState>>, Path((suggestion_type, id)): Path<(String, String)>) -> Result<Json<WhyPayload>> {
    let kind = parse_suggestion_type(&suggestion_type)?;

    let payload = match kind {
        "pattern" => {
            let pattern_id: Uuid = id.parse().map_err(|_| ApiError::BadRequest(format!("invalid pattern id: {id}")))?;
            let conn = state.patterns_conn.lock().unwrap();
            let patterns = active_patterns(&conn)?;
            let pattern = patterns
                .into_iter()
                .find(|p| p.id == pattern_id)
                .ok_or_else(|| ApiError::NotFound { kind: "pattern", id: id.clone() })?;
            build_why(WhyTarget::Pattern(&pattern), Utc::now())
        }
        "capture" => {
            let capture_id: Uuid = id.parse().map_err(|_| ApiError::BadRequest(format!("invalid capture id: {id}")))?;
            let capture = state
                .memory
                .get_capture(capture_id)?
                .ok_or_else(|| ApiError::NotFound { kind: "capture", id: id.clone() })?;
            build_why(WhyTarget::Capture(&capture), Utc::now())
        }
        "conversation" => {
            let conversation_id: Uuid = id.parse().map_err(|_| ApiError::BadRequest(format!("invalid conversation id: {id}")))?;
            let conversation = state
                .memory
                .get_conversation(conversation_id)?
                .ok_or_else(|| ApiError::NotFound { kind: "conversation", id: id.clone() })?;
            build_why(WhyTarget::Conversation(&conversation), Utc::now())
        }
        "meeting" | "calendar" => {
            return Err(ApiError::Core(JarvisError::Degraded {
                component: "calendar".to_string(),
                reason: "no calendar/email collaborator configured".to_string(),
            }));
        }
        other => return Err(ApiError::BadRequest(format!("unknown suggestion type: {other}"))),
    };

    Ok(Json(payload))
}
