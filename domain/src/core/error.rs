//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("Unknown combine policy: {0}")]
    UnknownPolicy(String),

    #[error("Conversation memory error: {0}")]
    Memory(String),
}

impl DomainError {
    /// Whether this error was caused by caller input rather than the system
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidQuestion(_)
                | DomainError::InvalidModel(_)
                | DomainError::UnknownPolicy(_)
        )
    }
}
