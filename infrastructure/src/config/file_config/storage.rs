//! Memory and transcript settings (`[memory]` and `[logging]` sections)

use crate::config::validation::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ```toml
/// [memory]
/// max_turns = 20   # keep the last 20 turns per session; unset keeps all
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoryConfig {
    pub max_turns: Option<usize>,
}

impl FileMemoryConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.max_turns == Some(0) {
            vec![ConfigIssue::warning(
                "memory.max_turns",
                "0 keeps no history; conversations will not carry context",
            )]
        } else {
            Vec::new()
        }
    }
}

/// ```toml
/// [logging]
/// transcript_path = "~/.local/share/llm-combiner/transcript.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub transcript_path: Option<String>,
}

impl FileLoggingConfig {
    /// Transcript path with a leading `~/` expanded to the home directory.
    pub fn transcript_path(&self) -> Option<PathBuf> {
        let raw = self.transcript_path.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }
}
