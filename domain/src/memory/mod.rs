//! Conversation memory domain.
//!
//! - [`entities::ConversationTurn`]: one (user input, final output) pair
//! - [`entities::ConversationMemory`]: ordered, append-only turns of a session
//! - [`repository::ConversationRepository`]: trait for per-session storage

pub mod entities;
pub mod repository;
