//! Per-session conversation memory held in process.

use async_trait::async_trait;
use combiner_domain::{
    ConversationMemory, ConversationRepository, ConversationTurn, DomainError, SessionId,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Sessions keyed by id, each an append-only [`ConversationMemory`].
///
/// Appends take the write lock, so concurrent requests never interleave a
/// session's turns. Loads take the read lock and return a snapshot.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    sessions: RwLock<HashMap<SessionId, ConversationMemory>>,
    max_turns: Option<usize>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the last `max_turns` turns of each session.
    pub fn with_window(max_turns: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    fn new_memory(&self) -> ConversationMemory {
        match self.max_turns {
            Some(max) => ConversationMemory::with_window(max),
            None => ConversationMemory::new(),
        }
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn load(&self, session: &SessionId) -> Result<Vec<ConversationTurn>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session)
            .map(|memory| memory.turns().to_vec())
            .unwrap_or_default())
    }

    async fn append(&self, session: &SessionId, turn: ConversationTurn) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let memory = sessions
            .entry(session.clone())
            .or_insert_with(|| self.new_memory());
        memory.append(turn);
        debug!(session = %session, turns = memory.len(), "Appended conversation turn");
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        self.sessions.write().await.remove(session);
        Ok(())
    }
}
