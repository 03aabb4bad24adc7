//! Raw TOML configuration data types
//!
//! These structs mirror the TOML file section by section. They are
//! deserialized directly and converted into application types after
//! validation.

mod combine;
mod models;
mod provider;
mod server;
mod storage;

pub use combine::FileCombineConfig;
pub use models::FileModelsConfig;
pub use provider::FileProviderConfig;
pub use server::FileServerConfig;
pub use storage::{FileLoggingConfig, FileMemoryConfig};

use super::validation::{ConfigIssue, ConfigValidationError};
use combiner_application::CombineParams;
use combiner_domain::Model;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub models: FileModelsConfig,
    pub combine: FileCombineConfig,
    pub provider: FileProviderConfig,
    pub server: FileServerConfig,
    pub memory: FileMemoryConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.parse_default().1);
        issues.extend(self.models.parse_synthesizer().1);
        issues.extend(self.combine.parse_policy().1);
        issues.extend(self.combine.parse_prompts().1);
        issues.extend(self.combine.validate_limits());
        issues.extend(self.provider.validate());
        issues.extend(self.memory.validate());
        if self.server.port == 0 {
            issues.push(ConfigIssue::warning(
                "server.port",
                "port 0 binds a random free port",
            ));
        }
        issues
    }

    /// Build the pipeline parameters, failing if any issue is an error.
    pub fn to_combine_params(&self) -> Result<CombineParams, ConfigValidationError> {
        let issues = self.validate();
        if issues.iter().any(ConfigIssue::is_error) {
            return Err(ConfigValidationError::Invalid(
                issues.into_iter().filter(ConfigIssue::is_error).collect(),
            ));
        }

        let (policy, _) = self.combine.parse_policy();
        let (prompts, _) = self.combine.parse_prompts();
        let default_model = self.models.parse_default().0.unwrap_or_default();
        let synthesizer = self
            .models
            .parse_synthesizer()
            .0
            .unwrap_or_else(Model::synthesizer);

        Ok(CombineParams::default()
            .with_policy(policy)
            .with_default_model(default_model)
            .with_synthesizer(synthesizer)
            .with_max_answer_chars(self.combine.max_answer_chars)
            .with_layer_cycles(self.combine.layer_cycles)
            .with_temperatures(
                self.combine.participant_temperature,
                self.combine.synthesizer_temperature,
                self.combine.single_temperature,
            )
            .with_max_tokens(self.combine.max_tokens)
            .with_timeout(self.provider.timeout())
            .with_prompts(prompts))
    }
}
