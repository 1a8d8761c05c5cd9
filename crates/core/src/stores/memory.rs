use crate::error::StoreError;
use crate::models::{Distance, RetrievedChunk, RulebookChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct StoredPoint {
    vector: Vec<f32>,
    chunk: RulebookChunk,
}

struct Collection {
    dimension: usize,
    points: Vec<StoredPoint>,
}

/// Brute-force in-memory index with the same contract as the Qdrant
/// adapter. Suitable for tests and small collections only.
#[derive(Default)]
pub struct MemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_collection(&self, name: &str) -> bool {
        self.collections.read().await.contains_key(name)
    }

    pub async fn point_count(&self, name: &str) -> usize {
        self.collections
            .read()
            .await
            .get(name)
            .map(|collection| collection.points.len())
            .unwrap_or(0)
    }
}

/// Cosine similarity in [-1, 1]; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn create_or_replace_collection(
        &self,
        name: &str,
        dimension: usize,
        _distance: Distance,
    ) -> Result<(), StoreError> {
        self.collections.write().await.insert(
            name.to_string(),
            Collection {
                dimension,
                points: Vec::new(),
            },
        );
        Ok(())
    }

    async fn upsert_chunks(
        &self,
        collection: &str,
        chunks: &[RulebookChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionMissing(collection.to_string()))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            if embedding.len() != target.dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: target.dimension,
                    actual: embedding.len(),
                });
            }
            target.points.push(StoredPoint {
                vector: embedding.clone(),
                chunk: chunk.clone(),
            });
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionMissing(collection.to_string()))?;

        if query_vector.len() != target.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: target.dimension,
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<RetrievedChunk> = target
            .points
            .iter()
            .map(|point| RetrievedChunk {
                text: point.chunk.text.clone(),
                source: point.chunk.source.clone(),
                page: point.chunk.page,
                game: point.chunk.game.clone(),
                score: cosine_similarity(query_vector, &point.vector),
            })
            .collect();

        // Stable sort keeps insertion order on ties, so tie-breaks are
        // deterministic within this index.
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.collections.write().await.remove(name);
        Ok(())
    }
}
