use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Local;

use jarvis_briefing::{compose_context_handoff, compose_meeting_brief, compose_morning_briefing, ContextHandoff, MeetingBrief, MorningBriefing};
use jarvis_core::types::CalendarEvent;

use crate::app::AppState;
use crate::error::Result;

/// GET /briefing/morning (C9).
pub async fn morning(State(state): State<Arc<AppState>>) -> Result<Json<MorningBriefing>> {
    let conn = state.patterns_conn.lock().unwrap();
    let briefing = compose_morning_briefing(
        state.calendar.as_ref(),
        state.email.as_ref(),
        state.vector_store.as_ref(),
        &conn,
        vec![],
        Local::now(),
    )
    .await?;
    Ok(Json(briefing))
}

/// POST /briefing/meeting — body is the calendar event to brief against.
pub async fn meeting(State(state): State<Arc<AppState>>, Json(event): Json<CalendarEvent>) -> Result<Json<MeetingBrief>> {
    let conn = state.patterns_conn.lock().unwrap();
    let brief = compose_meeting_brief(&event, &state.searcher, &conn, chrono::Utc::now()).await?;
    Ok(Json(brief))
}

/// GET /briefing/handoff/{project} (C9).
pub async fn handoff(State(state): State<Arc<AppState>>, Path(project): Path<String>) -> Result<Json<ContextHandoff>> {
    let handoff = compose_context_handoff(&project, &state.searcher, &state.llm).await?;
    Ok(Json(handoff))
}
