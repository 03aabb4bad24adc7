//! OpenAI-compatible chat completions adapter
//!
//! Implements the [`LlmGateway`](combiner_application::LlmGateway) port over
//! HTTP with reqwest, including SSE streaming.

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod session;
pub mod sse;
