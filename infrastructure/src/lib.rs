//! Infrastructure layer for llm-combiner
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the OpenAI-compatible HTTP gateway, configuration
//! loading, the in-memory conversation store and the JSONL transcript.

pub mod config;
pub mod logging;
pub mod memory;
pub mod openai;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, ConfigValidationError, FileConfig, ModelCatalog, Severity,
};
pub use logging::JsonlConversationLogger;
pub use memory::InMemoryConversationRepository;
pub use openai::{error::HttpClientError, gateway::OpenAiGateway};
