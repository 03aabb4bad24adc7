//! Domain layer for llm-combiner
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Fan-out and combination
//!
//! A single user query is sent to several models. Their answers are
//! normalized and combined by a [`CombinePolicy`]:
//!
//! - **Pick-best**: keep the longest valid answer (no extra model call)
//! - **Synthesize**: feed every answer to a synthesizer model and stream its reply
//! - **Layered**: several rounds of participants refining each other before synthesis
//!
//! ## Conversation memory
//!
//! Completed turns are kept per session ([`ConversationMemory`]) and replayed
//! as message history for the next query.

pub mod combine;
pub mod core;
pub mod memory;
pub mod orchestration;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use combine::{
    normalize::normalize,
    policy::{DEFAULT_MAX_ANSWER_CHARS, NO_VALID_RESPONSES, pick_best, valid_results},
    result::{CombinedAnswer, FAILURE_MARKER, ModelResult},
};
pub use core::{error::DomainError, model::Model, question::Question};
pub use memory::{
    entities::{ConversationMemory, ConversationTurn, SessionId},
    repository::ConversationRepository,
};
pub use orchestration::{
    mode::{CombineMode, CombinePolicy},
    phase::Phase,
};
pub use prompt::{PromptTemplate, SynthesisPrompts};
pub use session::{
    entities::{Message, Role},
    stream::StreamEvent,
};
