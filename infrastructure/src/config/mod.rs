//! Configuration loading for llm-combiner
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Command-line flags (applied by the binary)
//! 2. `--config <path>` specified file
//! 3. `LLM_COMBINER_*` environment variables
//! 4. Project root: `./combiner.toml`
//! 5. Global: `$XDG_CONFIG_HOME/llm-combiner/config.toml`
//! 6. Default values
//!
//! The model catalog served to clients lives in a separate `models.txt`.

mod catalog;
mod file_config;
mod loader;
mod validation;

pub use catalog::ModelCatalog;
pub use file_config::{
    FileCombineConfig, FileConfig, FileLoggingConfig, FileMemoryConfig, FileModelsConfig,
    FileProviderConfig, FileServerConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
pub use validation::{ConfigIssue, ConfigValidationError, Severity};
