//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod model_client;
pub mod run_combine;
