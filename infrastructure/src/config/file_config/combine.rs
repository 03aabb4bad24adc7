//! Combine policy settings from TOML (`[combine]` section)

use crate::config::validation::ConfigIssue;
use combiner_domain::{CombinePolicy, SynthesisPrompts};
use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// [combine]
/// policy = "synthesize"        # or "pick-best", "layered"
/// max_answer_chars = 500       # pick-best cap
/// layer_cycles = 3             # layered rounds
/// synthesizer_temperature = 0.2
/// participant_temperature = 0.7
/// single_temperature = 0.7
/// # max_tokens = 150
/// # synthesizer_prompt = "Merge these answers:\n{responses}"
/// # layer_prompt = "Refine using:\n{helper_response}"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCombineConfig {
    pub policy: String,
    pub max_answer_chars: usize,
    pub layer_cycles: usize,
    pub synthesizer_temperature: f32,
    pub participant_temperature: f32,
    pub single_temperature: f32,
    pub max_tokens: Option<u32>,
    /// Custom synthesizer system prompt; must contain `{responses}`
    pub synthesizer_prompt: Option<String>,
    /// Custom layered participant prompt; must contain `{helper_response}`
    pub layer_prompt: Option<String>,
}

impl Default for FileCombineConfig {
    fn default() -> Self {
        Self {
            policy: CombinePolicy::default().as_str().to_string(),
            max_answer_chars: 500,
            layer_cycles: 3,
            synthesizer_temperature: 0.2,
            participant_temperature: 0.7,
            single_temperature: 0.7,
            max_tokens: None,
            synthesizer_prompt: None,
            layer_prompt: None,
        }
    }
}

impl FileCombineConfig {
    pub fn parse_policy(&self) -> (CombinePolicy, Vec<ConfigIssue>) {
        match self.policy.parse::<CombinePolicy>() {
            Ok(policy) => (policy, Vec::new()),
            Err(_) => (
                CombinePolicy::default(),
                vec![ConfigIssue::error(
                    "combine.policy",
                    format!(
                        "unknown policy '{}' (expected synthesize, pick-best or layered)",
                        self.policy
                    ),
                )],
            ),
        }
    }

    pub fn parse_prompts(&self) -> (SynthesisPrompts, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut prompts = SynthesisPrompts::default();

        if let Some(source) = &self.synthesizer_prompt {
            match prompts.clone().with_synthesizer_template(source) {
                Ok(updated) => prompts = updated,
                Err(e) => issues.push(ConfigIssue::error("combine.synthesizer_prompt", e.to_string())),
            }
        }
        if let Some(source) = &self.layer_prompt {
            match prompts.clone().with_layer_template(source) {
                Ok(updated) => prompts = updated,
                Err(e) => issues.push(ConfigIssue::error("combine.layer_prompt", e.to_string())),
            }
        }

        (prompts, issues)
    }

    pub fn validate_limits(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_answer_chars == 0 {
            issues.push(ConfigIssue::error(
                "combine.max_answer_chars",
                "must be greater than 0",
            ));
        }
        if self.layer_cycles == 0 {
            issues.push(ConfigIssue::warning(
                "combine.layer_cycles",
                "0 rounds requested; one round will run",
            ));
        }
        if self.max_tokens == Some(0) {
            issues.push(ConfigIssue::error("combine.max_tokens", "must be greater than 0"));
        }
        for (field, value) in [
            ("combine.synthesizer_temperature", self.synthesizer_temperature),
            ("combine.participant_temperature", self.participant_temperature),
            ("combine.single_temperature", self.single_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                issues.push(ConfigIssue::warning(
                    field,
                    format!("{} is outside the usual 0.0..=2.0 range", value),
                ));
            }
        }
        issues
    }
}
