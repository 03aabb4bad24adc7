//! Upstream provider settings from TOML (`[provider]` section)

use crate::config::validation::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// # Example
///
/// ```toml
/// [provider]
/// base_url = "https://api.groq.com/openai/v1"
/// api_key_env = "GROQ_API_KEY"
/// timeout_seconds = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Any OpenAI-compatible API root
    pub base_url: String,
    /// Environment variable holding the API key, read at call time
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl FileProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.timeout_seconds == 0 {
            issues.push(ConfigIssue::error(
                "provider.timeout_seconds",
                "timeout_seconds cannot be 0",
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            issues.push(ConfigIssue::error(
                "provider.base_url",
                format!("'{}' is not an http(s) URL", self.base_url),
            ));
        }
        if self.api_key_env.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "provider.api_key_env",
                "environment variable name cannot be empty",
            ));
        }
        issues
    }
}
