use crate::chunking::build_chunks;
use crate::embeddings::Embedder;
use crate::error::PipelineError;
use crate::extractor::extract_page_texts;
use crate::models::{ChunkingOptions, Distance, RetrievedChunk};
use crate::prompt::format_rag_prompt;
use crate::session::{QaTurn, Session, SessionStore};
use crate::traits::{AnswerModel, VectorIndex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub session_id: String,
    pub collection_name: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Orchestrates the upload/ask/end lifecycle over the embedder, vector
/// index, language model, and session registry.
pub struct RulebookService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn AnswerModel>,
    sessions: SessionStore,
    upload_dir: PathBuf,
    chunking: ChunkingOptions,
    top_k: usize,
}

impl RulebookService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn AnswerModel>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            index,
            model,
            sessions: SessionStore::new(),
            upload_dir: upload_dir.into(),
            chunking: ChunkingOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_options(mut self, chunking: ChunkingOptions, top_k: usize) -> Self {
        self.chunking = chunking;
        self.top_k = top_k.max(1);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Ingest an uploaded rulebook: save the file, extract and chunk its
    /// pages, embed and index the chunks in a fresh collection, and open a
    /// session.
    ///
    /// The extension check runs before anything touches disk. If indexing
    /// fails after the collection was provisioned, both the collection and
    /// the saved file are rolled back so a failed upload leaves nothing
    /// behind.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        game_name: &str,
    ) -> Result<UploadOutcome, PipelineError> {
        let filename = sanitize_filename(filename)?;
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(PipelineError::InvalidFileType(filename));
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let file_path = self.upload_dir.join(&filename);
        tokio::fs::write(&file_path, bytes).await?;

        match self.ingest(&file_path, &filename, game_name).await {
            Ok(outcome) => Ok(outcome),
            Err((error, provisioned_collection)) => {
                if let Some(name) = provisioned_collection {
                    if let Err(cleanup) = self.index.delete_collection(&name).await {
                        warn!(collection = %name, error = %cleanup, "rollback of vector collection failed");
                    }
                }
                if let Err(cleanup) = tokio::fs::remove_file(&file_path).await {
                    warn!(path = %file_path.display(), error = %cleanup, "rollback of uploaded file failed");
                }
                Err(error)
            }
        }
    }

    async fn ingest(
        &self,
        file_path: &Path,
        filename: &str,
        game_name: &str,
    ) -> Result<UploadOutcome, (PipelineError, Option<String>)> {
        let pages = extract_page_texts(file_path).map_err(|error| (error.into(), None))?;
        let chunks = build_chunks(&pages, filename, game_name, &self.chunking)
            .map_err(|error| (error.into(), None))?;

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_documents(&texts)
            .map_err(|error| (error.into(), None))?;

        let collection_name = new_collection_name();
        self.index
            .create_or_replace_collection(&collection_name, self.embedder.dimensions(), Distance::Cosine)
            .await
            .map_err(|error| (error.into(), Some(collection_name.clone())))?;
        self.index
            .upsert_chunks(&collection_name, &chunks, &embeddings)
            .await
            .map_err(|error| (error.into(), Some(collection_name.clone())))?;

        let session = Session::new(file_path, collection_name.clone(), game_name);
        let session_id = self.sessions.insert(session).await;

        info!(
            session_id = %session_id,
            collection = %collection_name,
            chunks = chunks.len(),
            "rulebook indexed"
        );

        Ok(UploadOutcome {
            session_id,
            collection_name,
            chunk_count: chunks.len(),
        })
    }

    /// Answer a question against a live session, carrying the session's
    /// conversation memory into the prompt and appending the new exchange.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<AskOutcome, PipelineError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| PipelineError::SessionNotFound(session_id.to_string()))?;

        // Serializes concurrent asks for the same session so interleaved
        // calls cannot corrupt the conversation memory.
        let mut session = session.lock().await;

        let query_vector = self.embedder.embed_query(question)?;
        let retrieved = self
            .index
            .search(&session.collection_name, &query_vector, self.top_k)
            .await?;

        let prompt = format_rag_prompt(&retrieved, &session.memory, question);
        let answer = self.model.generate(&prompt).await?;

        session.memory.push(QaTurn {
            question: question.to_string(),
            answer: answer.clone(),
        });

        Ok(AskOutcome {
            answer,
            sources: retrieved,
        })
    }

    /// End a session: drop its collection, remove the uploaded file, and
    /// forget the registry entry. Terminal; later asks see "not found".
    pub async fn end(&self, session_id: &str) -> Result<(), PipelineError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| PipelineError::SessionNotFound(session_id.to_string()))?;

        let session = session.lock().await;
        self.index.delete_collection(&session.collection_name).await?;

        match tokio::fs::remove_file(&session.file_path).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }

        info!(session_id, collection = %session.collection_name, "session ended");
        drop(session);

        self.sessions.remove(session_id).await;
        Ok(())
    }
}

fn sanitize_filename(filename: &str) -> Result<String, PipelineError> {
    // Keep only the final path component so an upload cannot escape the
    // uploads directory.
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::InvalidFileType(filename.to_string()))
}

fn new_collection_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("rulebook_{}", &suffix[..8])
}
