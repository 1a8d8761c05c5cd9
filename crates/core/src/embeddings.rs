use crate::error::EmbedError;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Output width of the all-MiniLM-L6-v2 model.
pub const EMBEDDING_DIMENSIONS: usize = 384;

/// Maps chunk texts and queries into one shared vector space.
///
/// Both entry points must use the same underlying model so cosine
/// comparisons between a query vector and stored vectors are meaningful.
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

pub(crate) fn ensure_nonempty(texts: &[String]) -> Result<(), EmbedError> {
    if texts.iter().any(|text| text.trim().is_empty()) {
        return Err(EmbedError::EmptyInput);
    }
    Ok(())
}

/// Sentence embedder backed by the all-MiniLM-L6-v2 ONNX model (384
/// dimensions). Inputs longer than the model's 256-token window are
/// truncated by its own tokenizer; the policy applies identically to
/// documents and queries.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEmbedder {
    /// Loads the model, downloading it on first use.
    pub fn new() -> Result<Self, EmbedError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(true),
        )
        .map_err(|error| EmbedError::ModelInit(error.to_string()))?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }

    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.model
            .lock()
            .map_err(|_| EmbedError::Embedding("embedding model mutex poisoned".to_string()))?
            .embed(texts, None)
            .map_err(|error| EmbedError::Embedding(error.to_string()))
    }
}

impl Embedder for MiniLmEmbedder {
    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }

    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        ensure_nonempty(texts)?;
        self.embed_batch(texts.to_vec())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let texts = vec![text.to_string()];
        ensure_nonempty(&texts)?;
        self.embed_batch(texts)?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Embedding("model returned no embeddings".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::ensure_nonempty;

    #[test]
    fn blank_inputs_are_rejected() {
        assert!(ensure_nonempty(&["  ".to_string()]).is_err());
        assert!(ensure_nonempty(&["fine".to_string(), String::new()]).is_err());
        assert!(ensure_nonempty(&["roll two dice".to_string()]).is_ok());
    }
}
