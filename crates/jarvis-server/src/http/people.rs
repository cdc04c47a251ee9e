use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use jarvis_core::llm::LlmBackend;
use jarvis_enrich::people_graph::{people_graph, PeopleGraph};

use crate::app::AppState;
use crate::error::Result;

#[derive(Deserialize)]
pub struct PeopleQuery {
    #[serde(default = "default_min_frequency")]
    pub min_frequency: u32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_min_frequency() -> u32 {
    3
}

fn default_limit() -> usize {
    50
}

/// GET /people — recency-bucketed contact graph (C7).
pub async fn people(State(state): State<Arc<AppState>>, Query(query): Query<PeopleQuery>) -> Result<Json<PeopleGraph>> {
    let llm: &dyn LlmBackend = &state.llm;
    let graph = people_graph(state.vector_store.as_ref(), Some(llm), query.min_frequency, query.limit).await?;
    Ok(Json(graph))
}
