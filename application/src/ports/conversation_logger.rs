//! Port for the conversation transcript.
//!
//! Separate from `tracing`: tracing carries diagnostics, this port records
//! each finished turn as a machine-readable event (JSONL in practice).

use combiner_domain::{CombinedAnswer, Model, SessionId};
use serde_json::{Value, json};

/// A structured transcript event.
pub struct ConversationEvent {
    /// Event type identifier (e.g. "turn_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// A turn was persisted to conversation memory.
    pub fn turn_completed(
        session: &SessionId,
        targets: &[Model],
        query: &str,
        answer: &CombinedAnswer,
    ) -> Self {
        Self::new(
            "turn_completed",
            json!({
                "session": session.as_str(),
                "mode": answer.mode.as_str(),
                "models": targets.iter().map(Model::as_str).collect::<Vec<_>>(),
                "source_model": answer.source_model.as_ref().map(Model::as_str),
                "query": query,
                "answer": answer.text,
            }),
        )
    }
}

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible; a broken transcript never fails a
/// request.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when no transcript is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
