//! Dense + sparse embedding via `fastembed`, behind a process-singleton
//! wrapper (§4.6). Grounded on the `@lru_cache(maxsize=1)` idiom in
//! `processing/embeddings.py`: the underlying models are loaded once and
//! reused for the lifetime of the process.

use fastembed::{InitOptions, SparseTextEmbedding, SparseInitOptions, TextEmbedding};
use jarvis_core::types::{DenseVector, SparseVector};

use crate::error::{MemoryError, Result};

pub struct Embedder {
    dense: TextEmbedding,
    sparse: SparseTextEmbedding,
}

impl Embedder {
    pub fn new(dense_model_id: &str, sparse_model_id: &str) -> Result<Self> {
        let dense_model = dense_model_id
            .parse()
            .map_err(|_| MemoryError::VectorStore(anyhow::anyhow!("unknown dense model id: {dense_model_id}")))?;
        let sparse_model = sparse_model_id
            .parse()
            .map_err(|_| MemoryError::VectorStore(anyhow::anyhow!("unknown sparse model id: {sparse_model_id}")))?;

        let dense = TextEmbedding::try_new(InitOptions::new(dense_model))
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        let sparse = SparseTextEmbedding::try_new(SparseInitOptions::new(sparse_model))
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;

        Ok(Self { dense, sparse })
    }

    /// Embed `texts`, preserving input order in the returned vector.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<(DenseVector, SparseVector)>> {
        let dense_vecs = self
            .dense
            .embed(texts.to_vec(), None)
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;
        let sparse_vecs = self
            .sparse
            .embed(texts.to_vec(), None)
            .map_err(|e| MemoryError::VectorStore(anyhow::anyhow!(e)))?;

        Ok(dense_vecs
            .into_iter()
            .zip(sparse_vecs)
            .map(|(dense, sparse)| {
                let sparse_vec = SparseVector {
                    indices: sparse.indices.iter().map(|i| *i as u32).collect(),
                    values: sparse.values.clone(),
                };
                (dense, sparse_vec)
            })
            .collect())
    }

    pub fn embed_one(&self, text: &str) -> Result<(DenseVector, SparseVector)> {
        let mut result = self.embed_batch(&[text.to_string()])?;
        Ok(result.remove(0))
    }
}
