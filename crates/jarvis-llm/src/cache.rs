//! Classification cache wrapper (C11). Grounded on
//! `entity_classifier.py::get_entity_classifications`: check the cache
//! first, classify only the misses, persist results, batch misses at 50
//! entities per underlying call to stay within prompt size limits.
//! Caching reuses `jarvis_memory::store::MemoryStore`'s existing
//! `entity_classifications` table rather than a schema of its own.

use async_trait::async_trait;
use chrono::Utc;

use jarvis_core::llm::LlmBackend;
use jarvis_core::types::{ClassificationSource, EntityClassification, EntityType};
use jarvis_memory::store::MemoryStore;

const BATCH_SIZE: usize = 50;

pub struct CachingBackend<B: LlmBackend> {
    inner: B,
    source: ClassificationSource,
}

impl<B: LlmBackend> CachingBackend<B> {
    pub fn new(inner: B, source: ClassificationSource) -> Self {
        Self { inner, source }
    }

    /// Classify `names` through `store`'s cache, calling the wrapped
    /// backend only for cache misses, in batches of [`BATCH_SIZE`].
    pub async fn classify_cached(&self, store: &MemoryStore, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(names.len());
        let mut misses = Vec::new();

        for name in names {
            match store.get_entity_classification(name)? {
                Some(cached) => out.push((name.clone(), cached.entity_type)),
                None => misses.push(name.clone()),
            }
        }

        for batch in misses.chunks(BATCH_SIZE) {
            let classified = self.inner.classify_entities(batch).await?;
            for (name, entity_type) in classified {
                store.put_entity_classification(&EntityClassification {
                    entity_name: name.clone(),
                    entity_type,
                    source: self.source,
                    classified_at: Utc::now(),
                })?;
                out.push((name, entity_type));
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl<B: LlmBackend> LlmBackend for CachingBackend<B> {
    async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
        self.inner.classify_entities(names).await
    }

    async fn summarize(&self, text: &str, instructions: &str) -> anyhow::Result<String> {
        self.inner.summarize(text, instructions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmBackend for CountingBackend {
        async fn classify_entities(&self, names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(names.iter().map(|n| (n.clone(), EntityType::Person)).collect())
        }

        async fn summarize(&self, _text: &str, _instructions: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_the_backend_call() {
        let store = MemoryStore::open_in_memory().unwrap();
        store
            .put_entity_classification(&EntityClassification {
                entity_name: "Priya".to_string(),
                entity_type: EntityType::Person,
                source: ClassificationSource::Heuristic,
                classified_at: Utc::now(),
            })
            .unwrap();

        let backend = CachingBackend::new(CountingBackend { calls: AtomicUsize::new(0) }, ClassificationSource::Llm);
        let result = backend.classify_cached(&store, &["Priya".to_string()]).await.unwrap();

        assert_eq!(result, vec![("Priya".to_string(), EntityType::Person)]);
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_miss_calls_backend_and_persists() {
        let store = MemoryStore::open_in_memory().unwrap();
        let backend = CachingBackend::new(CountingBackend { calls: AtomicUsize::new(0) }, ClassificationSource::Llm);

        let result = backend.classify_cached(&store, &["Carsten Timm".to_string()]).await.unwrap();
        assert_eq!(result, vec![("Carsten Timm".to_string(), EntityType::Person)]);
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 1);

        let cached = store.get_entity_classification("Carsten Timm").unwrap().unwrap();
        assert_eq!(cached.entity_type, EntityType::Person);
        assert_eq!(cached.source, ClassificationSource::Llm);
    }

    #[tokio::test]
    async fn batches_misses_at_fifty() {
        let store = MemoryStore::open_in_memory().unwrap();
        let backend = CachingBackend::new(CountingBackend { calls: AtomicUsize::new(0) }, ClassificationSource::Llm);
        let names: Vec<String> = (0..120).map(|i| format!("Entity {i}")).collect();

        backend.classify_cached(&store, &names).await.unwrap();
        assert_eq!(backend.inner.calls.load(Ordering::SeqCst), 3);
    }
}
