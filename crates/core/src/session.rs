use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// One question/answer exchange in a session's conversation memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaTurn {
    pub question: String,
    pub answer: String,
}

/// Stateful handle binding one uploaded rulebook, its vector collection,
/// and the conversation so far.
#[derive(Debug)]
pub struct Session {
    pub file_path: PathBuf,
    pub collection_name: String,
    pub game_name: String,
    pub memory: Vec<QaTurn>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        file_path: impl Into<PathBuf>,
        collection_name: impl Into<String>,
        game_name: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            collection_name: collection_name.into(),
            game_name: game_name.into(),
            memory: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory session registry.
///
/// Process-local and non-persistent: sessions survive only until they are
/// explicitly ended or the process restarts. Each session sits behind its
/// own mutex so two in-flight asks for the same id cannot interleave their
/// conversation memory.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and returns its freshly minted opaque id.
    pub async fn insert(&self, session: Session) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn remove(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.write().await.remove(session_id)
    }

    pub async fn ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
