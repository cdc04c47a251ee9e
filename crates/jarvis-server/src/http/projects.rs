use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use jarvis_core::llm::LlmBackend;
use jarvis_enrich::project_pulse::{project_pulse, ProjectPulse};

use crate::app::AppState;
use crate::error::Result;

#[derive(Deserialize)]
pub struct ProjectsQuery {
    #[serde(default = "default_min_mentions")]
    pub min_mentions: u32,
    #[serde(default)]
    pub include_github: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_min_mentions() -> u32 {
    2
}

fn default_limit() -> usize {
    50
}

/// GET /projects — activity pulse per detected project (C8).
pub async fn projects(State(state): State<Arc<AppState>>, Query(query): Query<ProjectsQuery>) -> Result<Json<ProjectPulse>> {
    let llm: &dyn LlmBackend = &state.llm;
    let pulse = project_pulse(
        state.vector_store.as_ref(),
        Some(llm),
        query.min_mentions,
        query.include_github,
        query.limit,
    )
    .await?;
    Ok(Json(pulse))
}
