//! Model selection from TOML (`[models]` section)

use crate::config::validation::ConfigIssue;
use combiner_domain::Model;
use combiner_domain::core::model::{DEFAULT_MODEL, DEFAULT_SYNTHESIZER_MODEL};
use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// [models]
/// default = "llama3-8b-8192"             # used when a request names no models
/// synthesizer = "llama-3.3-70b-versatile" # merges the fan-out answers
/// catalog_file = "models.txt"            # list served by GET /models
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub default: String,
    pub synthesizer: String,
    pub catalog_file: String,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_MODEL.to_string(),
            synthesizer: DEFAULT_SYNTHESIZER_MODEL.to_string(),
            catalog_file: "models.txt".to_string(),
        }
    }
}

impl FileModelsConfig {
    fn parse_model(field: &str, value: &str) -> (Option<Model>, Vec<ConfigIssue>) {
        match Model::new(value) {
            Ok(model) => (Some(model), Vec::new()),
            Err(_) => (
                None,
                vec![ConfigIssue::error(field, "model name cannot be empty")],
            ),
        }
    }

    pub fn parse_default(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_model("models.default", &self.default)
    }

    pub fn parse_synthesizer(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_model("models.synthesizer", &self.synthesizer)
    }
}
