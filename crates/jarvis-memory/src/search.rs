//! Hybrid search combining dense and sparse vectors with RRF fusion
//! (§4.8), grounded line-for-line in
//! `original_source/server/src/jarvis_server/search/hybrid.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use qdrant_client::qdrant::{
    Condition, Filter, Fusion, PrefetchQueryBuilder, Query, QueryPointsBuilder,
};
use qdrant_client::Qdrant;

use jarvis_core::types::DenseVector;

use crate::embed::Embedder;
use crate::error::{MemoryError, Result};
use crate::vectorstore::MEMORY_CHUNKS_COLLECTION;

/// Reciprocal rank fusion constant, matching the original's documented
/// convention even though the fusion arithmetic runs server-side in
/// Qdrant.
pub const RRF_K: u32 = 60;

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub limit: u64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub text_preview: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub metadata: serde_json::Value,
}

/// Execute hybrid search with dense + sparse prefetch and RRF fusion.
/// `prefetch_limit` widens the candidate pool fed into fusion, capped at
/// 50 regardless of how large the caller's requested limit is.
pub async fn hybrid_search(client: &Qdrant, embedder: &Embedder, request: &SearchRequest) -> Result<Vec<SearchResult>> {
    let (dense, sparse) = embedder.embed_one(&request.query)?;

    let mut must = Vec::new();
    if request.start_date.is_some() || request.end_date.is_some() {
        must.push(Condition::datetime_range(
            "timestamp",
            qdrant_client::qdrant::DatetimeRange {
                gte: request.start_date.map(datetime_to_timestamp),
                lte: request.end_date.map(datetime_to_timestamp),
                ..Default::default()
            },
        ));
    }
    if !request.sources.is_empty() {
        must.push(Condition::matches("source", request.sources.clone()));
    }
    let filter = if must.is_empty() { None } else { Some(Filter::must(must)) };

    let prefetch_limit = (request.limit * 5).min(50);

    let dense_prefetch = PrefetchQueryBuilder::default()
        .query(Query::new_nearest(dense_to_vector_input(&dense)))
        .using("dense")
        .limit(prefetch_limit)
        .filter(filter.clone().unwrap_or_default());

    let sparse_prefetch = PrefetchQueryBuilder::default()
        .query(Query::new_nearest(qdrant_client::qdrant::VectorInput::new_sparse(
            sparse.indices.clone(),
            sparse.values.clone(),
        )))
        .using("sparse")
        .limit(prefetch_limit)
        .filter(filter.clone().unwrap_or_default());

    let query = QueryPointsBuilder::new(MEMORY_CHUNKS_COLLECTION)
        .add_prefetch(dense_prefetch)
        .add_prefetch(sparse_prefetch)
        .query(Query::new_fusion(Fusion::Rrf))
        .limit(request.limit)
        .with_payload(true);

    let response = client
        .query(query)
        .await
        .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;

    let results = response
        .result
        .into_iter()
        .map(|point| {
            let payload: serde_json::Map<String, serde_json::Value> = point
                .payload
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect();

            let timestamp = payload
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            SearchResult {
                id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                score: point.score,
                text_preview: payload
                    .get("text_preview")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                timestamp,
                source: payload.get("source").and_then(|v| v.as_str()).unwrap_or("screen").to_string(),
                metadata: serde_json::Value::Object(payload),
            }
        })
        .collect();

    Ok(results)
}

fn dense_to_vector_input(dense: &DenseVector) -> qdrant_client::qdrant::VectorInput {
    qdrant_client::qdrant::VectorInput::new_dense(dense.clone())
}

fn datetime_to_timestamp(d: DateTime<Utc>) -> qdrant_client::qdrant::Timestamp {
    qdrant_client::qdrant::Timestamp {
        seconds: d.timestamp(),
        nanos: d.timestamp_subsec_nanos() as i32,
    }
}

fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> serde_json::Value {
    serde_json::to_value(&value).unwrap_or(serde_json::Value::Null)
}

fn point_id_to_string(id: &qdrant_client::qdrant::PointId) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}

/// Narrow capability interface over [`hybrid_search`], so `jarvis-briefing`'s
/// composers can depend on `&dyn MemorySearch` instead of a concrete
/// `Qdrant`/`Embedder` pair, matching the seam pattern already used for
/// [`crate::vectorstore::VectorStore`] and `jarvis_core::LlmBackend`.
#[async_trait]
pub trait MemorySearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}

pub struct HybridSearcher {
    client: Qdrant,
    embedder: std::sync::Arc<crate::embed::Embedder>,
}

impl HybridSearcher {
    pub fn new(client: Qdrant, embedder: std::sync::Arc<crate::embed::Embedder>) -> Self {
        Self { client, embedder }
    }
}

#[async_trait]
impl MemorySearch for HybridSearcher {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        hybrid_search(&self.client, &self.embedder, request).await
    }
}
