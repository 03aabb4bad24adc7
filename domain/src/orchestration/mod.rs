//! Orchestration domain: how one pipeline invocation proceeds.
//!
//! - [`mode`]: [`CombinePolicy`](mode::CombinePolicy) and the derived [`CombineMode`](mode::CombineMode)
//! - [`phase`]: the per-invocation state machine

pub mod mode;
pub mod phase;
