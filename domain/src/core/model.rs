//! Model value object representing an upstream LLM identifier

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fallback model used when a request names no models
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// High-capability model used to synthesize several answers into one
pub const DEFAULT_SYNTHESIZER_MODEL: &str = "llama-3.3-70b-versatile";

/// Identifier of an upstream model (Value Object)
///
/// The identifier is opaque: only the upstream provider decides whether it
/// names a real model, at call time. The only local rule is that it is not
/// blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model(String);

impl Model {
    /// Create a model identifier, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidModel(
                "model identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hardcoded catalog returned when no `models.txt` is present
    pub fn default_models() -> Vec<Model> {
        vec![
            Model(DEFAULT_SYNTHESIZER_MODEL.to_string()),
            Model(DEFAULT_MODEL.to_string()),
            Model("gemma2-9b-it".to_string()),
        ]
    }

    /// The default synthesizer model
    pub fn synthesizer() -> Model {
        Model(DEFAULT_SYNTHESIZER_MODEL.to_string())
    }

    /// Parse a list of identifiers, failing on the first blank one
    pub fn parse_list<I, S>(ids: I) -> Result<Vec<Model>, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter().map(Model::new).collect()
    }
}

impl Default for Model {
    /// Returns the single-model fallback (`llama3-8b-8192`)
    fn default() -> Self {
        Model(DEFAULT_MODEL.to_string())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::new(s)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Model::new(s).map_err(serde::de::Error::custom)
    }
}
