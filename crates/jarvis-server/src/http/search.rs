use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use jarvis_memory::search::{MemorySearch, SearchRequest, SearchResult};

use crate::app::AppState;
use crate::error::Result;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sources: Vec<String>,
}

fn default_limit() -> u64 {
    10
}

/// GET /search?q=...&limit=...&start_date=...&end_date=...&sources=...
pub async fn search(State(state): State<Arc<AppState>>, Query(query): Query<SearchQuery>) -> Result<Json<Vec<SearchResult>>> {
    let request = SearchRequest {
        query: query.q,
        limit: query.limit,
        start_date: query.start_date,
        end_date: query.end_date,
        sources: query.sources,
    };
    let results = state.searcher.search(&request).await?;
    Ok(Json(results))
}
