//! LLM message and streaming types.
//!
//! - [`entities::Message`]: a single chat message sent to a model
//! - [`stream::StreamEvent`]: one event of a streamed model reply

pub mod entities;
pub mod stream;
