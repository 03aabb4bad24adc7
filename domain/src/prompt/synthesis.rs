//! Prompts for each stage of the combine pipeline

use super::template::PromptTemplate;
use crate::core::error::DomainError;

/// System prompt for single-model mode
pub const DEFAULT_ASSISTANT_SYSTEM: &str = "You are a helpful assistant.";

/// System prompt for participants whose answers will be combined
pub const DIRECT_ANSWER_SYSTEM: &str = "Answer the user's question directly.";

const SYNTHESIZER_TEMPLATE: &str = r#"You are an expert at synthesizing information. You received a question from a user and several answers from different AI assistants.
Your task is to critically analyze every answer, identify the strengths and the correct information in each one, and combine them into a single, cohesive and comprehensive final answer.
Discard any contradictory or incorrect information. Your final answer must be the best possible version, directly answering the user's original question.

Model answers for your evaluation:
{responses}"#;

const REFERENCE_TEMPLATE: &str = r#"You have been provided with a set of responses from various models to the latest user query.
Your task is to synthesize these responses into a single, high-quality response.
It is crucial to critically evaluate the information provided in these responses, recognizing that some of it may be biased or incorrect.
Your response should not simply replicate the given answers, but offer a refined, accurate, and comprehensive reply to the instruction.
Ensure your response is well-structured, coherent, and adheres to the highest standards of accuracy and reliability.
Responses from models:
{responses}"#;

const LAYER_TEMPLATE: &str =
    "You are an expert planner. Think through your answer step by step.\n{helper_response}";

const MAIN_TEMPLATE: &str = "You are a helpful assistant.\n{helper_response}";

/// The prompt set used by the pipeline.
///
/// Custom templates are validated once here; rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisPrompts {
    synthesizer: PromptTemplate,
    reference: PromptTemplate,
    layer: PromptTemplate,
    main: PromptTemplate,
}

impl Default for SynthesisPrompts {
    fn default() -> Self {
        Self {
            synthesizer: PromptTemplate::parse(SYNTHESIZER_TEMPLATE),
            reference: PromptTemplate::parse(REFERENCE_TEMPLATE),
            layer: PromptTemplate::parse(LAYER_TEMPLATE),
            main: PromptTemplate::parse(MAIN_TEMPLATE),
        }
    }
}

impl SynthesisPrompts {
    /// Override the synthesizer system prompt; it must contain `{responses}`.
    pub fn with_synthesizer_template(mut self, source: &str) -> Result<Self, DomainError> {
        self.synthesizer = PromptTemplate::new(source, &["responses"])?;
        Ok(self)
    }

    /// Override the layer participant prompt; it must contain `{helper_response}`.
    pub fn with_layer_template(mut self, source: &str) -> Result<Self, DomainError> {
        self.layer = PromptTemplate::new(source, &["helper_response"])?;
        Ok(self)
    }

    /// System prompt for the synthesizer, embedding every labelled answer.
    pub fn synthesizer_system(&self, responses: &[(String, String)]) -> String {
        self.synthesizer
            .render(&[("responses", &Self::format_labelled(responses))])
    }

    /// Helper context built from one layered round.
    pub fn reference_context(&self, responses: &[String]) -> String {
        self.reference
            .render(&[("responses", &Self::format_numbered(responses))])
    }

    /// System prompt for a layered participant.
    pub fn layer_system(&self, helper_response: &str) -> String {
        self.layer.render(&[("helper_response", helper_response)])
    }

    /// System prompt for the final layered answer.
    pub fn main_system(&self, helper_response: &str) -> String {
        self.main.render(&[("helper_response", helper_response)])
    }

    /// `--- Response from model 'id' ---` blocks, in the given order.
    pub fn format_labelled(responses: &[(String, String)]) -> String {
        let mut out = String::new();
        for (model, text) in responses {
            out.push_str(&format!(
                "--- Response from model '{}' ---\n{}\n\n",
                model, text
            ));
        }
        out
    }

    /// `0. answer` lines, in the given order.
    pub fn format_numbered(responses: &[String]) -> String {
        let mut out = String::new();
        for (i, text) in responses.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i, text));
        }
        out
    }
}
