//! Prompt domain
//!
//! Slot-validated templates and the prompts used at each stage of the
//! combine pipeline.

mod synthesis;
mod template;

pub use synthesis::{DEFAULT_ASSISTANT_SYSTEM, DIRECT_ANSWER_SYSTEM, SynthesisPrompts};
pub use template::PromptTemplate;
