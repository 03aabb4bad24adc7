//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: an opaque upstream model identifier
//! - [`question::Question`]: a validated user query
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
