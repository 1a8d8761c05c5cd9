use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf had no readable page text: {0}")]
    EmptyPdf(String),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model failed to initialize: {0}")]
    ModelInit(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("cannot embed empty text")]
    EmptyInput,
}

/// Failures talking to the vector store. Every variant is the caller-visible
/// "storage unavailable" condition; nothing is swallowed internally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store returned {status} during {operation}: {details}")]
    BackendResponse {
        operation: &'static str,
        status: u16,
        details: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("collection not found: {0}")]
    CollectionMissing(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("store request failed: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("language model returned {status}: {details}")]
    BackendResponse { status: u16, details: String },

    #[error("language model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(String),
}

/// Umbrella error for the upload/ask/end pipeline. The request layer maps
/// these onto HTTP statuses: `InvalidFileType` is a validation error,
/// `SessionNotFound` a not-found error, everything else a server error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("only .pdf files are accepted, got {0}")]
    InvalidFileType(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
