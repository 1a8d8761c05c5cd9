use crate::error::{LlmError, StoreError};
use crate::models::{Distance, RetrievedChunk, RulebookChunk};
use async_trait::async_trait;

/// Named, independent partitions of vectors with nearest-neighbor search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// (Re)provisions `name` for vectors of `dimension`, destroying any
    /// prior contents under that name.
    async fn create_or_replace_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), StoreError>;

    /// Writes chunk/embedding pairs; every point gets a fresh unique id.
    async fn upsert_chunks(
        &self,
        collection: &str,
        chunks: &[RulebookChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError>;

    /// Returns up to `top_k` payloads ordered by non-increasing similarity.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError>;

    /// Removes all data under `name`. Deleting a collection that is already
    /// gone is not an error.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;
}

/// One-shot text generation against a hosted language model. No retry, no
/// streaming, no local fallback.
#[async_trait]
pub trait AnswerModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
