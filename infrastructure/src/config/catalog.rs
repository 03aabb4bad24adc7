//! Model catalog file (`models.txt`)
//!
//! One model identifier per line; blank lines and `#` comments are ignored.
//! The catalog is only a convenience list for clients: a missing or empty
//! file falls back to [`Model::default_models`].

use combiner_domain::Model;
use std::path::Path;
use tracing::{debug, warn};

pub struct ModelCatalog;

impl ModelCatalog {
    /// Read the catalog, falling back to the built-in defaults.
    pub fn load(path: &Path) -> Vec<Model> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No model catalog at {}; using defaults", path.display());
                return Model::default_models();
            }
            Err(e) => {
                warn!("Could not read model catalog {}: {}", path.display(), e);
                return Model::default_models();
            }
        };

        let models = Self::parse(&content);
        if models.is_empty() {
            warn!("Model catalog {} lists no models; using defaults", path.display());
            return Model::default_models();
        }
        debug!("Loaded {} models from {}", models.len(), path.display());
        models
    }

    /// Parse catalog text; lines that are not identifiers are skipped.
    pub fn parse(content: &str) -> Vec<Model> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| Model::new(line).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(models: &[Model]) -> Vec<&str> {
        models.iter().map(Model::as_str).collect()
    }

    #[test]
    fn test_missing_file_uses_three_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let models = ModelCatalog::load(&dir.path().join("models.txt"));
        assert_eq!(
            ids(&models),
            vec!["llama-3.3-70b-versatile", "llama3-8b-8192", "gemma2-9b-it"]
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.txt");
        std::fs::write(&path, "mixtral-8x7b\n\n  # comment\n qwen-2.5 \n").unwrap();
        assert_eq!(ids(&ModelCatalog::load(&path)), vec!["mixtral-8x7b", "qwen-2.5"]);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.txt");
        std::fs::write(&path, "\n   \n").unwrap();
        assert_eq!(ModelCatalog::load(&path), Model::default_models());
    }
}
