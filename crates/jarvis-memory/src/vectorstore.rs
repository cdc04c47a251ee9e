//! Narrow vector-store capability interface (§9 design note: dynamic
//! dispatch at external-system boundaries) with a Qdrant-backed
//! implementation (§4.7).

use async_trait::async_trait;
use qdrant_client::qdrant::{
    vectors_config::Config, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance,
    FieldType, PointStruct, ScrollPointsBuilder, SparseVectorParams, SparseVectorsConfigBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, VectorsConfig,
};
use qdrant_client::Qdrant;
use uuid::Uuid;

use jarvis_core::types::{DenseVector, SparseVector};

use crate::error::{MemoryError, Result};

pub const CAPTURES_COLLECTION: &str = "captures";
pub const MEMORY_CHUNKS_COLLECTION: &str = "memory_chunks";

const DENSE_DIM: u64 = 384;
const SCROLL_PAGE_SIZE: u32 = 1000;

/// A single chunk/capture ready for vector storage, carrying both named
/// vectors and its JSON payload (§3 VectorPoint).
pub struct VectorRecord {
    pub id: Uuid,
    pub dense: DenseVector,
    pub sparse: SparseVector,
    pub payload: serde_json::Value,
}

/// A payload-only view of a stored point, returned by `scroll_payloads`.
/// `people_graph`/`project_pulse`/`patterns` scan collections for their
/// JSON payload alone and never need the vectors back.
#[derive(Clone)]
pub struct ScrolledPoint {
    pub id: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ensure_collection(&self, name: &str) -> Result<()>;
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Page through every point in `collection`, page size 1000, stopping
    /// once the server reports no further offset. Mirrors the original's
    /// `client.scroll(..., limit=1000)` loop used by the people/project/
    /// pattern scanners.
    async fn scroll_payloads(&self, collection: &str) -> Result<Vec<ScrolledPoint>>;
}

pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    pub fn connect(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    /// Idempotent: checks existence before creating, matching
    /// `QdrantWrapper.setup_captures_collection`'s guard in `vector/qdrant.py`.
    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        if exists {
            return Ok(());
        }

        let dense_params = VectorParamsBuilder::new(DENSE_DIM, Distance::Cosine);
        let vectors_config = VectorsConfig {
            config: Some(Config::ParamsMap(qdrant_client::qdrant::VectorParamsMap {
                map: [("dense".to_string(), dense_params.build())].into_iter().collect(),
            })),
        };
        let mut sparse_config = SparseVectorsConfigBuilder::default();
        sparse_config.add_named_vector_params("sparse", SparseVectorParams::default());

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .sparse_vectors_config(sparse_config),
            )
            .await
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;

        // §4.7 schema-on-create: index the fields `search`'s `sources` filter
        // and the enrichment scanners' date/sentiment reads actually query on,
        // mirroring `memory/indexer.py`'s `create_payload_index` calls.
        for (field, field_type) in [
            ("source", FieldType::Keyword),
            ("sentiment", FieldType::Keyword),
            ("conversation_date", FieldType::Datetime),
        ] {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(name, field, field_type))
                .await
                .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|r| {
                let mut vectors = qdrant_client::qdrant::NamedVectors::default();
                vectors = vectors.add_vector("dense", r.dense);
                vectors = vectors.add_vector(
                    "sparse",
                    qdrant_client::qdrant::Vector::from(qdrant_client::qdrant::SparseVector {
                        indices: r.sparse.indices,
                        values: r.sparse.values,
                    }),
                );
                PointStruct::new(r.id.to_string(), vectors, payload_to_qdrant(r.payload))
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn scroll_payloads(&self, collection: &str) -> Result<Vec<ScrolledPoint>> {
        let mut out = Vec::new();
        let mut offset = None;
        loop {
            let mut builder = ScrollPointsBuilder::new(collection)
                .limit(SCROLL_PAGE_SIZE)
                .with_payload(true)
                .with_vectors(false);
            if let Some(off) = offset.take() {
                builder = builder.offset(off);
            }
            let resp = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;

            for point in resp.result {
                let id = point
                    .id
                    .as_ref()
                    .map(point_id_to_string)
                    .unwrap_or_default();
                let payload = qdrant_payload_to_json(point.payload);
                out.push(ScrolledPoint { id, payload });
            }

            match resp.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(out)
    }
}

fn qdrant_payload_to_json(
    payload: std::collections::HashMap<String, qdrant_client::qdrant::Value>,
) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = payload
        .into_iter()
        .map(|(k, v)| (k, serde_json::to_value(&v).unwrap_or(serde_json::Value::Null)))
        .collect();
    serde_json::Value::Object(map)
}

fn payload_to_qdrant(value: serde_json::Value) -> qdrant_client::Payload {
    qdrant_client::Payload::try_from(value).unwrap_or_default()
}

fn point_id_to_string(id: &qdrant_client::qdrant::PointId) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}
