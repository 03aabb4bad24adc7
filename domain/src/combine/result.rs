//! Per-model results and the combined answer.

use super::normalize::normalize;
use crate::core::model::Model;
use crate::orchestration::mode::CombineMode;
use serde::{Deserialize, Serialize};

/// Prefix of every failure reason carried by a [`ModelResult`].
pub const FAILURE_MARKER: &str = "[model-error]";

/// Result of one model call in the fan-out (Value Object)
///
/// Created once per call and never mutated. Failures are values, not
/// errors: one model failing never aborts its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult {
    /// The model that was called
    pub model: Model,
    /// The raw response text (empty on failure)
    pub raw_text: String,
    /// Whether the call failed
    pub failed: bool,
    /// Failure reason, always starting with [`FAILURE_MARKER`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl ModelResult {
    /// Creates a successful result.
    pub fn success(model: Model, raw_text: impl Into<String>) -> Self {
        Self {
            model,
            raw_text: raw_text.into(),
            failed: false,
            error_reason: None,
        }
    }

    /// Creates a failed result; the reason is prefixed with [`FAILURE_MARKER`].
    pub fn failure(model: Model, reason: impl std::fmt::Display) -> Self {
        let reason = reason.to_string();
        let reason = if reason.starts_with(FAILURE_MARKER) {
            reason
        } else {
            format!("{} {}", FAILURE_MARKER, reason)
        };
        Self {
            model,
            raw_text: String::new(),
            failed: true,
            error_reason: Some(reason),
        }
    }

    /// Build a result from a call outcome.
    pub fn from_outcome<E: std::fmt::Display>(model: Model, outcome: Result<String, E>) -> Self {
        match outcome {
            Ok(text) => Self::success(model, text),
            Err(e) => Self::failure(model, e),
        }
    }

    /// Whether a reason string carries the failure marker.
    pub fn is_failure_reason(reason: &str) -> bool {
        reason.starts_with(FAILURE_MARKER)
    }

    /// Returns `true` if this call failed.
    pub fn is_failed(&self) -> bool {
        self.failed
            || self
                .error_reason
                .as_deref()
                .is_some_and(Self::is_failure_reason)
    }

    /// The normalized response text.
    pub fn normalized_text(&self) -> String {
        normalize(&self.raw_text)
    }

    /// A result is valid when it did not fail and its normalized text is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.is_failed() && !self.normalized_text().is_empty()
    }
}

/// The single answer produced by one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedAnswer {
    /// Full answer text
    pub text: String,
    /// The model whose answer was selected (pick-best mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_model: Option<Model>,
    /// The mode that produced this answer
    pub mode: CombineMode,
}

impl CombinedAnswer {
    pub fn new(text: impl Into<String>, mode: CombineMode) -> Self {
        Self {
            text: text.into(),
            source_model: None,
            mode,
        }
    }

    pub fn with_source(mut self, model: Model) -> Self {
        self.source_model = Some(model);
        self
    }
}
