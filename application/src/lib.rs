//! Application layer for llm-combiner
//!
//! This crate contains the chat pipeline use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::CombineParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{
        GatewayError, GenerationOptions, LlmGateway, LlmSession, SessionRequest, StreamHandle,
    },
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::model_client::ModelClient;
pub use use_cases::run_combine::{
    CombineEvent, CombineInput, CombineOutput, RunCombineError, RunCombineUseCase,
};
