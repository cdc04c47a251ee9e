use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (jarvis.toml + JARVIS_* env overrides), enumerating
/// every tunable named in §9 plus the ambient-stack additions in
/// SPEC_FULL.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JarvisConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for JarvisConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            queue: QueueConfig::default(),
            memory: MemoryConfig::default(),
            enrich: EnrichConfig::default(),
            llm: LlmConfig::default(),
            scheduler: SchedulerConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl JarvisConfig {
    /// Load config from a TOML file with JARVIS_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.jarvis/jarvis.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: JarvisConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("JARVIS_").split("_"))
            .extract()
            .map_err(|e| crate::error::JarvisError::InvalidInput(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.jarvis/jarvis.toml", home)
}

/// C1 capture loop + change detector tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_interval_s")]
    pub capture_interval_s: u64,
    #[serde(default = "default_idle_threshold_s")]
    pub idle_threshold_s: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_hash_threshold")]
    pub hash_threshold: u32,
    #[serde(default = "default_min_interval_s")]
    pub min_interval_s: u64,
    #[serde(default = "default_watchdog_timeout_s")]
    pub watchdog_timeout_s: u64,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    #[serde(default = "default_exclusions_path")]
    pub exclusions_path: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_interval_s: default_capture_interval_s(),
            idle_threshold_s: default_idle_threshold_s(),
            jpeg_quality: default_jpeg_quality(),
            hash_threshold: default_hash_threshold(),
            min_interval_s: default_min_interval_s(),
            watchdog_timeout_s: default_watchdog_timeout_s(),
            max_consecutive_errors: default_max_consecutive_errors(),
            exclusions_path: default_exclusions_path(),
        }
    }
}

fn default_capture_interval_s() -> u64 {
    60
}
fn default_idle_threshold_s() -> u64 {
    300
}
fn default_jpeg_quality() -> u8 {
    85
}
fn default_hash_threshold() -> u32 {
    10
}
fn default_min_interval_s() -> u64 {
    60
}
fn default_watchdog_timeout_s() -> u64 {
    300
}
fn default_max_consecutive_errors() -> u32 {
    10
}
fn default_exclusions_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.jarvis/exclusions.toml", home)
}

/// C2 persistent upload queue tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_retry_backoff_s")]
    pub retry_backoff_s: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_upload_worker_interval_s")]
    pub upload_worker_interval_s: u64,
    #[serde(default = "default_upload_attempt_timeout_s")]
    pub upload_attempt_timeout_s: u64,
    #[serde(default = "default_queue_db_path")]
    pub db_path: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            retry_backoff_s: default_retry_backoff_s(),
            max_retries: default_max_retries(),
            max_attempts: default_max_attempts(),
            upload_worker_interval_s: default_upload_worker_interval_s(),
            upload_attempt_timeout_s: default_upload_attempt_timeout_s(),
            db_path: default_queue_db_path(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_retry_backoff_s() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_attempts() -> u32 {
    5
}
fn default_upload_worker_interval_s() -> u64 {
    5
}
fn default_upload_attempt_timeout_s() -> u64 {
    30
}
fn default_queue_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.jarvis/queue.db", home)
}

/// C4/C5/C6/C7 chunking, tagging, embedding, vector store tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    #[serde(default = "default_dense_model_id")]
    pub dense_model_id: String,
    #[serde(default = "default_sparse_model_id")]
    pub sparse_model_id: String,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    #[serde(default = "default_scroll_page_size")]
    pub scroll_page_size: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
            dense_model_id: default_dense_model_id(),
            sparse_model_id: default_sparse_model_id(),
            qdrant_url: default_qdrant_url(),
            rrf_k: default_rrf_k(),
            scroll_page_size: default_scroll_page_size(),
        }
    }
}

fn default_min_chunk_chars() -> usize {
    500
}
fn default_max_chunk_chars() -> usize {
    1500
}
fn default_dense_model_id() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}
fn default_sparse_model_id() -> String {
    "prithivida/Splade_PP_en_v1".to_string()
}
fn default_qdrant_url() -> String {
    "http://127.0.0.1:6334".to_string()
}
fn default_rrf_k() -> u32 {
    60
}
fn default_scroll_page_size() -> u32 {
    1000
}

/// C8 enrichment tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    #[serde(default = "default_min_frequency_person")]
    pub min_frequency_person: i32,
    #[serde(default = "default_min_mentions_project")]
    pub min_mentions_project: i32,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_gap_cap_s")]
    pub gap_cap_s: i64,
    #[serde(default = "default_undo_window_h")]
    pub undo_window_h: i64,
    #[serde(default = "default_github_probe_timeout_s")]
    pub github_probe_timeout_s: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            min_frequency_person: default_min_frequency_person(),
            min_mentions_project: default_min_mentions_project(),
            lookback_days: default_lookback_days(),
            gap_cap_s: default_gap_cap_s(),
            undo_window_h: default_undo_window_h(),
            github_probe_timeout_s: default_github_probe_timeout_s(),
        }
    }
}

fn default_min_frequency_person() -> i32 {
    3
}
fn default_min_mentions_project() -> i32 {
    2
}
fn default_lookback_days() -> i64 {
    30
}
fn default_gap_cap_s() -> i64 {
    900
}
fn default_undo_window_h() -> i64 {
    24
}
fn default_github_probe_timeout_s() -> u64 {
    5
}

/// C11 LLM adapter tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_llm_confidence_floor")]
    pub llm_confidence_floor: f64,
    #[serde(default = "default_llm_call_timeout_s")]
    pub llm_call_timeout_s: u64,
    #[serde(default = "default_entity_classification_batch_size")]
    pub entity_classification_batch_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: default_openai_base_url(),
            llm_confidence_floor: default_llm_confidence_floor(),
            llm_call_timeout_s: default_llm_call_timeout_s(),
            entity_classification_batch_size: default_entity_classification_batch_size(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_llm_confidence_floor() -> f64 {
    0.4
}
fn default_llm_call_timeout_s() -> u64 {
    30
}
fn default_entity_classification_batch_size() -> usize {
    50
}

/// C12 background scheduler tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_max_jobs_io")]
    pub max_jobs_io: usize,
    #[serde(default = "default_scheduler_max_jobs_ocr")]
    pub max_jobs_ocr: usize,
    #[serde(default = "default_process_backlog_interval_h")]
    pub process_backlog_interval_h: i64,
    #[serde(default = "default_pattern_detection_interval_h")]
    pub pattern_detection_interval_h: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_jobs_io: default_scheduler_max_jobs_io(),
            max_jobs_ocr: default_scheduler_max_jobs_ocr(),
            process_backlog_interval_h: default_process_backlog_interval_h(),
            pattern_detection_interval_h: default_pattern_detection_interval_h(),
        }
    }
}

fn default_scheduler_max_jobs_io() -> usize {
    8
}
fn default_scheduler_max_jobs_ocr() -> usize {
    2
}
fn default_process_backlog_interval_h() -> i64 {
    6
}
fn default_pattern_detection_interval_h() -> i64 {
    24
}

/// Server-side relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_capture_root")]
    pub capture_root: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            capture_root: default_capture_root(),
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.jarvis/jarvis.db", home)
}
fn default_capture_root() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.jarvis/captures", home)
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_health_check_timeout_s")]
    pub health_check_timeout_s: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            health_check_timeout_s: default_health_check_timeout_s(),
        }
    }
}

fn default_port() -> u16 {
    8080
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_health_check_timeout_s() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_without_a_config_file() {
        let cfg = JarvisConfig::default();
        assert_eq!(cfg.queue.max_attempts, 5);
        assert_eq!(cfg.memory.rrf_k, 60);
        assert_eq!(cfg.capture.watchdog_timeout_s, 300);
    }
}
