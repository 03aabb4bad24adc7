//! Streaming events for model replies.
//!
//! [`StreamEvent`] represents individual events in a streaming LLM response,
//! enabling incremental emission of model output as it's generated.

/// An event in a streaming LLM response.
///
/// Bridges infrastructure-level streaming (e.g. SSE chunks) to the
/// application layer. A well-formed stream is zero or more `Delta` events
/// followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}
