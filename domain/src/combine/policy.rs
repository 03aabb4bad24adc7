//! Aggregation policy: the pick-best heuristic.
//!
//! The synthesize and layered policies need a further model call and are
//! driven by the application layer; this module holds the pure parts.

use super::result::{CombinedAnswer, ModelResult};
use crate::core::string::truncate_chars;
use crate::orchestration::mode::CombineMode;

/// Combined answer when no model produced a usable response.
pub const NO_VALID_RESPONSES: &str = "No valid responses available.";

/// Maximum length (in characters) of a pick-best answer.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 500;

/// Results that did not fail and have non-empty normalized text, in input order.
pub fn valid_results(results: &[ModelResult]) -> Vec<&ModelResult> {
    results.iter().filter(|r| r.is_valid()).collect()
}

/// Select the longest normalized answer.
///
/// Ties go to the earliest result in `results`, which callers keep in the
/// order the models were requested. The answer is cut to `max_chars`
/// characters. With no valid result the answer is [`NO_VALID_RESPONSES`].
pub fn pick_best(results: &[ModelResult], max_chars: usize) -> CombinedAnswer {
    let mut best: Option<(&ModelResult, String, usize)> = None;

    for result in valid_results(results) {
        let text = result.normalized_text();
        let len = text.chars().count();
        let longer = match &best {
            Some((_, _, best_len)) => len > *best_len,
            None => true,
        };
        if longer {
            best = Some((result, text, len));
        }
    }

    match best {
        Some((result, text, _)) => {
            CombinedAnswer::new(truncate_chars(&text, max_chars), CombineMode::PickBest)
                .with_source(result.model.clone())
        }
        None => CombinedAnswer::new(NO_VALID_RESPONSES, CombineMode::PickBest),
    }
}
