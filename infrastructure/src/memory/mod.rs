//! Conversation memory adapters
//!
//! Provides [`InMemoryConversationRepository`], the process-local store behind
//! the [`ConversationRepository`](combiner_domain::ConversationRepository) port.

mod in_memory;

pub use in_memory::InMemoryConversationRepository;
