//! Application-level configuration.
//!
//! - [`CombineParams`]: policy, models, limits and prompts for the combine pipeline

pub mod combine_params;

pub use combine_params::{CombineParams, DEFAULT_LAYER_CYCLES, DEFAULT_TIMEOUT};
