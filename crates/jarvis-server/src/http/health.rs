use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /health — liveness probe, reports scheduler and LLM backend status.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let jobs = state.scheduler.list_jobs().unwrap_or_default();
    let llm_backend = match &state.llm {
        crate::llm_backend::LlmChoice::Heuristic(_) => "heuristic",
        crate::llm_backend::LlmChoice::OpenAi(_) => "openai",
    };

    Json(json!({
        "status": "ok",
        "llm_backend": llm_backend,
        "jobs_pending": jobs.iter().filter(|j| j.status == jarvis_scheduler::JobStatus::Pending).count(),
    }))
}
