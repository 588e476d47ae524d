//! GRPO: Group Relative Policy Optimization objective
//!
//! Computes standardized group advantages, the clipped surrogate loss with a
//! k3 KL penalty, and the per-sample gradient signal for one group of samples
//! that share a prompt. Log-probabilities come from an external model forward
//! pass; applying the returned signal is left to the caller's optimizer.

pub mod config;
pub mod error;
pub mod training;

pub use config::GrpoConfig;
pub use error::{GrpoError, Result};
pub use training::{compute_advantages, evaluate, Group, GrpoObjective, GrpoOutput, GrpoStats};
