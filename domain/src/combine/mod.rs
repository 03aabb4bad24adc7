//! Response combination.
//!
//! - [`normalize`]: trimming of raw model output
//! - [`result`]: per-model results and the combined answer
//! - [`policy`]: mode selection and the pick-best heuristic

pub mod normalize;
pub mod policy;
pub mod result;
