//! Pipeline phases.
//!
//! One invocation walks
//! `Start → Fanout → Normalize → Aggregate → (StreamSynthesis | EmitSingle) → Persist → Done`.
//! Single mode skips the fan-out stages and streams its one model directly.

use super::mode::CombineMode;
use serde::{Deserialize, Serialize};

/// Phase of a pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Start,
    /// Issue one call per target model
    Fanout,
    /// Trim each raw result
    Normalize,
    /// Choose or prepare the combined answer
    Aggregate,
    /// Stream the synthesizer (or the single model) to the caller
    StreamSynthesis,
    /// Emit a ready answer in one piece
    EmitSingle,
    /// Append the finished turn to conversation memory
    Persist,
    Done,
    /// The invocation was aborted before Persist
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Start => "start",
            Phase::Fanout => "fanout",
            Phase::Normalize => "normalize",
            Phase::Aggregate => "aggregate",
            Phase::StreamSynthesis => "stream_synthesis",
            Phase::EmitSingle => "emit_single",
            Phase::Persist => "persist",
            Phase::Done => "done",
            Phase::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Start => "Start",
            Phase::Fanout => "Fan-out",
            Phase::Normalize => "Normalize",
            Phase::Aggregate => "Aggregate",
            Phase::StreamSynthesis => "Streaming",
            Phase::EmitSingle => "Emit",
            Phase::Persist => "Persist",
            Phase::Done => "Done",
            Phase::Failed => "Failed",
        }
    }

    /// Phases a successful invocation passes through in `mode`.
    pub fn sequence(mode: CombineMode) -> Vec<Phase> {
        match mode {
            CombineMode::Single => vec![
                Phase::Start,
                Phase::StreamSynthesis,
                Phase::Persist,
                Phase::Done,
            ],
            CombineMode::PickBest => vec![
                Phase::Start,
                Phase::Fanout,
                Phase::Normalize,
                Phase::Aggregate,
                Phase::EmitSingle,
                Phase::Persist,
                Phase::Done,
            ],
            CombineMode::Synthesize | CombineMode::Layered => vec![
                Phase::Start,
                Phase::Fanout,
                Phase::Normalize,
                Phase::Aggregate,
                Phase::StreamSynthesis,
                Phase::Persist,
                Phase::Done,
            ],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
