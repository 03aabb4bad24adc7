//! Conversation repository trait

use super::entities::{ConversationTurn, SessionId};
use crate::core::error::DomainError;
use async_trait::async_trait;

/// Storage for per-session conversation memory
///
/// Implementations live in the infrastructure layer. Appends to one
/// repository must be serialized; `load` returns a consistent snapshot and
/// may run concurrently with other loads.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Snapshot of the session's turns in chronological order
    async fn load(&self, session: &SessionId) -> Result<Vec<ConversationTurn>, DomainError>;

    /// Append one completed turn
    async fn append(&self, session: &SessionId, turn: ConversationTurn)
    -> Result<(), DomainError>;

    /// Forget a session entirely
    async fn clear(&self, session: &SessionId) -> Result<(), DomainError>;
}
