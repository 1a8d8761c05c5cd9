use crate::error::StoreError;
use crate::models::{Distance, RetrievedChunk, RulebookChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Qdrant adapter over its REST API. One collection per uploaded rulebook;
/// collections are created with recreate semantics, so a second create
/// under the same name starts from empty.
pub struct QdrantStore {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl QdrantStore {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let endpoint = endpoint.into();

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.endpoint, path));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request
    }
}

async fn check(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let details = response.text().await.unwrap_or_default();
    Err(StoreError::BackendResponse {
        operation,
        status,
        details,
    })
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn create_or_replace_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), StoreError> {
        // Recreate semantics: drop whatever exists under the name first.
        let delete = self
            .request(Method::DELETE, &format!("/collections/{name}"))
            .send()
            .await?;
        if !delete.status().is_success() && delete.status() != StatusCode::NOT_FOUND {
            check("drop collection", delete).await?;
        }

        let response = self
            .request(Method::PUT, &format!("/collections/{name}"))
            .json(&json!({
                "vectors": { "size": dimension, "distance": distance.as_str() },
            }))
            .send()
            .await?;
        check("create collection", response).await?;
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

        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": embedding,
                    "payload": {
                        "text": chunk.text,
                        "source": chunk.source,
                        "page": chunk.page,
                        "game": chunk.game,
                    },
                })
            })
            .collect::<Vec<_>>();

        if points.is_empty() {
            return Ok(());
        }

        let response = self
            .request(
                Method::PUT,
                &format!("/collections/{collection}/points?wait=true"),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?;
        check("upsert points", response).await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let response = self
            .request(
                Method::POST,
                &format!("/collections/{collection}/points/search"),
            )
            .json(&json!({
                "vector": query_vector,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;
        let response = check("search points", response).await?;

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::new();
        for hit in hits {
            results.push(RetrievedChunk {
                text: hit
                    .pointer("/payload/text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                source: hit
                    .pointer("/payload/source")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                page: hit
                    .pointer("/payload/page")
                    .and_then(Value::as_u64)
                    .unwrap_or_default() as u32,
                game: hit
                    .pointer("/payload/game")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                score: hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32,
            });
        }

        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("/collections/{name}"))
            .send()
            .await?;

        // Idempotent: a collection that is already gone is fine.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check("delete collection", response).await?;
        Ok(())
    }
}
