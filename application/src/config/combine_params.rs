//! Combine parameters: how the pipeline runs a request.
//!
//! [`CombineParams`] groups the static knobs of
//! [`RunCombineUseCase`](crate::use_cases::run_combine::RunCombineUseCase).
//! They are resolved from the loaded configuration at startup.

use crate::ports::llm_gateway::GenerationOptions;
use combiner_domain::{CombinePolicy, DEFAULT_MAX_ANSWER_CHARS, Model, SynthesisPrompts};
use std::time::Duration;

/// Default number of refinement rounds for the layered policy
pub const DEFAULT_LAYER_CYCLES: usize = 3;

/// Default per-call wait before a model call fails with a timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline parameters.
///
/// | Role        | Temperature | Used by                      |
/// |-------------|-------------|------------------------------|
/// | participant | 0.7         | fan-out calls                |
/// | synthesizer | 0.2         | synthesize / layered answer  |
/// | single      | 0.7         | single-model mode            |
#[derive(Debug, Clone)]
pub struct CombineParams {
    /// Policy used when a request does not pick one
    pub policy: CombinePolicy,
    /// Model used when a request names none
    pub default_model: Model,
    /// Model that merges the fan-out answers
    pub synthesizer: Model,
    /// Cap on pick-best answers, in characters
    pub max_answer_chars: usize,
    /// Rounds for the layered policy (at least one round always runs)
    pub layer_cycles: usize,
    pub participant_options: GenerationOptions,
    pub synthesizer_options: GenerationOptions,
    pub single_options: GenerationOptions,
    /// Bound on each model call, and on each wait between streamed chunks
    pub timeout: Duration,
    pub prompts: SynthesisPrompts,
}

impl Default for CombineParams {
    fn default() -> Self {
        Self {
            policy: CombinePolicy::default(),
            default_model: Model::default(),
            synthesizer: Model::synthesizer(),
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            layer_cycles: DEFAULT_LAYER_CYCLES,
            participant_options: GenerationOptions::default().with_temperature(0.7),
            synthesizer_options: GenerationOptions::default().with_temperature(0.2),
            single_options: GenerationOptions::default().with_temperature(0.7),
            timeout: DEFAULT_TIMEOUT,
            prompts: SynthesisPrompts::default(),
        }
    }
}

impl CombineParams {
    // ==================== Builder Methods ====================

    pub fn with_policy(mut self, policy: CombinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_model(mut self, model: Model) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_synthesizer(mut self, model: Model) -> Self {
        self.synthesizer = model;
        self
    }

    pub fn with_max_answer_chars(mut self, max: usize) -> Self {
        self.max_answer_chars = max;
        self
    }

    pub fn with_layer_cycles(mut self, cycles: usize) -> Self {
        self.layer_cycles = cycles;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply one output cap to every role.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.participant_options = self.participant_options.with_max_tokens(max_tokens);
        self.synthesizer_options = self.synthesizer_options.with_max_tokens(max_tokens);
        self.single_options = self.single_options.with_max_tokens(max_tokens);
        self
    }

    pub fn with_temperatures(mut self, participant: f32, synthesizer: f32, single: f32) -> Self {
        self.participant_options = self.participant_options.with_temperature(participant);
        self.synthesizer_options = self.synthesizer_options.with_temperature(synthesizer);
        self.single_options = self.single_options.with_temperature(single);
        self
    }

    pub fn with_prompts(mut self, prompts: SynthesisPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Number of layered rounds actually run.
    pub fn effective_layer_cycles(&self) -> usize {
        self.layer_cycles.max(1)
    }
}
