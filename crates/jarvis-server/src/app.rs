use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use qdrant_client::Qdrant;
use rusqlite::Connection;

use jarvis_briefing::{CalendarSource, EmailSource, NullCalendarSource, NullEmailSource};
use jarvis_core::config::JarvisConfig;
use jarvis_core::ocr::{NullOcr, OcrBackend};
use jarvis_core::types::ClassificationSource;
use jarvis_llm::CachingBackend;
use jarvis_memory::embed::Embedder;
use jarvis_memory::search::{HybridSearcher, MemorySearch};
use jarvis_memory::store::MemoryStore;
use jarvis_memory::vectorstore::{QdrantStore, VectorStore};
use jarvis_scheduler::SchedulerHandle;

use crate::llm_backend::LlmChoice;

/// Central shared state, passed as `Arc<AppState>` to every handler.
/// Grounded on `skynet-gateway::app::AppState`'s aggregation shape, with
/// chat/session/terminal/websocket fields replaced by this workspace's
/// memory/enrichment/briefing/why/scheduler stack.
pub struct AppState {
    pub config: JarvisConfig,
    pub memory: MemoryStore,
    pub vector_store: Arc<dyn VectorStore>,
    pub embedder: Arc<Embedder>,
    pub searcher: HybridSearcher,
    /// `detected_patterns` table connection, separate from `memory`'s so
    /// pattern-detection jobs don't contend with capture/conversation
    /// writes (the same separation `SchedulerHandle` keeps from the
    /// engine's own connection).
    pub patterns_conn: Mutex<Connection>,
    pub llm: LlmChoice,
    pub llm_cache: CachingBackend<LlmChoice>,
    pub calendar: Arc<dyn CalendarSource>,
    pub email: Arc<dyn EmailSource>,
    pub ocr: Arc<dyn OcrBackend>,
    pub scheduler: SchedulerHandle,
}

impl AppState {
    pub fn new(config: JarvisConfig) -> anyhow::Result<Self> {
        let memory = MemoryStore::open(&config.database.path)?;

        let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantStore::connect(&config.memory.qdrant_url)?);

        let embedder = Arc::new(Embedder::new(&config.memory.dense_model_id, &config.memory.sparse_model_id)?);

        let query_client = Qdrant::from_url(&config.memory.qdrant_url).build()?;
        let searcher = HybridSearcher::new(query_client, embedder.clone());

        let patterns_conn = Connection::open(&config.database.path)?;
        jarvis_enrich::db::init_db(&patterns_conn)?;

        let llm = LlmChoice::from_config(&config.llm);
        let cache_source = match &llm {
            LlmChoice::OpenAi(_) => ClassificationSource::Llm,
            LlmChoice::Heuristic(_) => ClassificationSource::Heuristic,
        };
        let llm_cache = CachingBackend::new(llm.clone(), cache_source);

        let scheduler = SchedulerHandle::new(Connection::open(&config.database.path)?)?;

        Ok(Self {
            config,
            memory,
            vector_store,
            embedder,
            searcher,
            patterns_conn: Mutex::new(patterns_conn),
            llm,
            llm_cache,
            calendar: Arc::new(NullCalendarSource),
            email: Arc::new(NullEmailSource),
            ocr: Arc::new(NullOcr),
            scheduler,
        })
    }
}

/// Narrow view of `AppState` as `&dyn MemorySearch`, so `jarvis-briefing`'s
/// composers can depend on the trait object instead of a concrete searcher.
impl AsRef<dyn MemorySearch> for AppState {
    fn as_ref(&self) -> &(dyn MemorySearch + 'static) {
        &self.searcher
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/captures", post(crate::http::captures::upload_capture))
        .route("/captures/{id}", get(crate::http::captures::get_capture))
        .route("/conversations", post(crate::http::conversations::import_conversations))
        .route("/search", get(crate::http::search::search))
        .route("/people", get(crate::http::people::people))
        .route("/projects", get(crate::http::projects::projects))
        .route("/patterns", get(crate::http::patterns::patterns))
        .route("/why/{suggestion_type}/{id}", get(crate::http::why::why))
        .route("/briefing/morning", get(crate::http::briefing::morning))
        .route("/briefing/meeting", post(crate::http::briefing::meeting))
        .route("/briefing/handoff/{project}", get(crate::http::briefing::handoff))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
