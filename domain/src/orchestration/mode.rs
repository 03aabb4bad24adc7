//! Combine policy and mode definitions.
//!
//! Defines [`CombinePolicy`], the user-facing choice of how several answers
//! become one, and [`CombineMode`], the mode actually run for a request once
//! the number of target models is known:
//! - fewer than two targets always run as `Single`
//! - otherwise the policy decides (`PickBest`, `Synthesize` or `Layered`)

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How answers from several models are combined; the user-facing axis.
///
/// - **Synthesize** (default): every answer is fed to a synthesizer model
///   whose streamed reply is the final answer.
/// - **PickBest**: the longest valid answer wins; no further model call.
///   Suited to cost-sensitive deployments.
/// - **Layered**: participants answer over several rounds, each round seeing
///   the previous round's answers, then the synthesizer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinePolicy {
    PickBest,
    #[default]
    Synthesize,
    Layered,
}

impl CombinePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinePolicy::PickBest => "pick-best",
            CombinePolicy::Synthesize => "synthesize",
            CombinePolicy::Layered => "layered",
        }
    }

    /// Get a human-readable description of this policy
    pub fn description(&self) -> &'static str {
        match self {
            CombinePolicy::PickBest => "Pick-best: keep the longest valid answer",
            CombinePolicy::Synthesize => "Synthesize: merge all answers with a synthesizer model",
            CombinePolicy::Layered => {
                "Layered: several refinement rounds, then a synthesizer model"
            }
        }
    }

    /// Derive the mode to run for `target_count` models.
    pub fn mode_for(&self, target_count: usize) -> CombineMode {
        if target_count < 2 {
            return CombineMode::Single;
        }
        match self {
            CombinePolicy::PickBest => CombineMode::PickBest,
            CombinePolicy::Synthesize => CombineMode::Synthesize,
            CombinePolicy::Layered => CombineMode::Layered,
        }
    }
}

impl fmt::Display for CombinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CombinePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pick-best" | "pick_best" | "best" | "longest" => Ok(CombinePolicy::PickBest),
            "synthesize" | "synthesis" | "synth" => Ok(CombinePolicy::Synthesize),
            "layered" | "layers" | "moa" => Ok(CombinePolicy::Layered),
            _ => Err(DomainError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Mode actually executed for one request, derived from [`CombinePolicy`].
///
/// This is not user-facing; it is determined by the policy and the number
/// of target models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMode {
    /// One model answers; no aggregation runs
    Single,
    /// Longest valid answer wins
    PickBest,
    /// Synthesizer merges all answers
    Synthesize,
    /// Refinement rounds followed by synthesis
    Layered,
}

impl CombineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombineMode::Single => "single",
            CombineMode::PickBest => "pick-best",
            CombineMode::Synthesize => "synthesize",
            CombineMode::Layered => "layered",
        }
    }

    /// Whether more than one model contributes to the answer
    pub fn is_combined(&self) -> bool {
        !matches!(self, CombineMode::Single)
    }

    /// Prefix line emitted before streamed content.
    pub fn banner(&self, single_model: &str) -> String {
        match self {
            CombineMode::Single => format!("--- Running a single model: {} ---\n\n", single_model),
            _ => "--- Combined and Refined Response ---\n\n".to_string(),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
