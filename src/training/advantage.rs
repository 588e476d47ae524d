//! GRPO advantage estimation utilities.
//!
//! Implements the group-relative advantage normalization:
//!
//!   A_i = (R_i - mean(R)) / sqrt(var(R) + 1e-8)
//!
//! Along with the importance ratio and PPO-style clipping used by the clipped
//! surrogate objective.

use crate::error::{GrpoError, Result};

/// Stability floor added to the reward variance before taking the square root.
pub const STD_EPSILON: f64 = 1e-8;

/// Compute group-relative advantages for a group of G rewards.
///
/// Each advantage is the reward's deviation from the group mean divided by
/// the floored population standard deviation:
///
///   A_i = (R_i - mean(R)) / sqrt(var(R) + STD_EPSILON)
///
/// # Edge cases
///
/// - An empty group is rejected with [`GrpoError::InvalidGroupSize`].
/// - If all rewards are identical, all advantages are exactly `0.0` rather
///   than NaN. A group of one sample is the degenerate case of this.
/// - If the rewards vary by less than the floor, `STD_EPSILON` keeps the
///   denominator positive and the advantages shrink toward zero.
pub fn compute_advantages(rewards: &[f64]) -> Result<Vec<f64>> {
    if rewards.is_empty() {
        return Err(GrpoError::InvalidGroupSize { group_size: 0 });
    }

    // Identical rewards carry no relative signal. Return exact zeros rather
    // than the rounding residue of the mean.
    if rewards.iter().all(|&r| r == rewards[0]) {
        return Ok(vec![0.0; rewards.len()]);
    }

    let n = rewards.len() as f64;
    let mean = rewards.iter().sum::<f64>() / n;

    // Population variance: we normalize within a fixed group, so divide by N.
    let variance = rewards.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = (variance + STD_EPSILON).sqrt();

    Ok(rewards.iter().map(|r| (r - mean) / std).collect())
}

/// Compute the importance sampling ratio between the current and old policies.
///
///   rho_i = exp(log pi_theta - log pi_old)
pub fn compute_importance_ratio(current_log_prob: f64, old_log_prob: f64) -> f64 {
    (current_log_prob - old_log_prob).exp()
}

/// Clip an importance ratio to the interval [1 - epsilon, 1 + epsilon].
///
/// `epsilon` must be non-negative, which [`crate::GrpoConfig::validate`] and
/// [`crate::training::evaluate`] enforce before calling this.
pub fn clip_ratio(ratio: f64, epsilon: f64) -> f64 {
    ratio.clamp(1.0 - epsilon, 1.0 + epsilon)
}
