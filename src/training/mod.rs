//! GRPO training objective.
//!
//! This module implements the numerical core of Group Relative Policy
//! Optimization: group-relative advantage estimation and the clipped
//! surrogate loss with a KL penalty toward a reference policy.

pub mod advantage;
pub mod grpo;

pub use advantage::{clip_ratio, compute_advantages, compute_importance_ratio, STD_EPSILON};
pub use grpo::{evaluate, kl_penalty, Group, GrpoObjective, GrpoOutput, GrpoStats};
