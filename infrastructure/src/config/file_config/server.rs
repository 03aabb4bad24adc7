//! HTTP server settings from TOML (`[server]` section)

use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 8000
/// static_dir = "static"   # optional, served under /static
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<String>,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: None,
        }
    }
}

impl FileServerConfig {
    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
