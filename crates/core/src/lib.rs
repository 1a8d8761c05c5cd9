pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod session;
pub mod stores;
pub mod traits;

pub use chunking::{build_chunks, clean_page_text, split_page, PageSlice};
pub use config::BackendConfig;
pub use embeddings::{Embedder, MiniLmEmbedder, EMBEDDING_DIMENSIONS};
pub use error::{
    ConfigError, EmbedError, IngestError, LlmError, PipelineError, StoreError,
};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use llm::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use models::{ChunkingOptions, Distance, RetrievedChunk, RulebookChunk};
pub use pipeline::{AskOutcome, RulebookService, UploadOutcome, DEFAULT_TOP_K};
pub use prompt::{format_rag_prompt, MAX_CONTEXT_CHARS};
pub use session::{QaTurn, Session, SessionStore, SharedSession};
pub use stores::{MemoryVectorIndex, QdrantStore};
pub use traits::{AnswerModel, VectorIndex};
