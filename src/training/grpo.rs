//! Group Relative Policy Optimization (GRPO) loss evaluation.
//!
//! For a group of G samples drawn for the same prompt, the combined objective
//! per sample is
//!
//!   term_i = min(rho_i * A_i, clip(rho_i, 1-eps, 1+eps) * A_i) - beta * KL_i
//!
//! where:
//!   - rho_i = exp(log pi_theta - log pi_old)
//!   - A_i   = group-relative advantage (see [`super::advantage`])
//!   - KL_i  = exp(d_i) - d_i - 1 with d_i = log pi_ref - log pi_theta (k3 estimator)
//!
//! The loss is the negated group mean of `term_i`.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GrpoConfig;
use crate::error::{ensure_len, ensure_non_negative, GrpoError, Result};

use super::advantage::{clip_ratio, compute_advantages, compute_importance_ratio};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A group of G >= 1 samples drawn from the same prompt context.
///
/// The three per-sample arrays always have the same non-zero length; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGroup")]
pub struct Group {
    rewards: Vec<f64>,
    log_probs_old: Vec<f64>,
    log_probs_ref: Vec<f64>,
}

/// Wire form of a [`Group`]. `group_size` is optional and, when present, must
/// agree with every array.
#[derive(Deserialize)]
struct RawGroup {
    group_size: Option<usize>,
    rewards: Vec<f64>,
    log_probs_old: Vec<f64>,
    log_probs_ref: Vec<f64>,
}

impl TryFrom<RawGroup> for Group {
    type Error = GrpoError;

    fn try_from(raw: RawGroup) -> Result<Self> {
        match raw.group_size {
            Some(group_size) => Group::with_size(
                group_size,
                raw.rewards,
                raw.log_probs_old,
                raw.log_probs_ref,
            ),
            None => Group::new(raw.rewards, raw.log_probs_old, raw.log_probs_ref),
        }
    }
}

impl Group {
    /// Build a group whose size is taken from `rewards`.
    pub fn new(
        rewards: Vec<f64>,
        log_probs_old: Vec<f64>,
        log_probs_ref: Vec<f64>,
    ) -> Result<Self> {
        let group_size = rewards.len();
        Self::with_size(group_size, rewards, log_probs_old, log_probs_ref)
    }

    /// Build a group with an explicit size that every array must match.
    pub fn with_size(
        group_size: usize,
        rewards: Vec<f64>,
        log_probs_old: Vec<f64>,
        log_probs_ref: Vec<f64>,
    ) -> Result<Self> {
        if group_size == 0 {
            return Err(GrpoError::InvalidGroupSize { group_size });
        }
        ensure_len("rewards", &rewards, group_size)?;
        ensure_len("log_probs_old", &log_probs_old, group_size)?;
        ensure_len("log_probs_ref", &log_probs_ref, group_size)?;

        Ok(Self {
            rewards,
            log_probs_old,
            log_probs_ref,
        })
    }

    /// Number of samples G.
    pub fn group_size(&self) -> usize {
        self.rewards.len()
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn log_probs_old(&self) -> &[f64] {
        &self.log_probs_old
    }

    pub fn log_probs_ref(&self) -> &[f64] {
        &self.log_probs_ref
    }
}

/// Diagnostics gathered during one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrpoStats {
    /// Mean advantage across the group (~0 by construction).
    pub mean_advantage: f64,
    /// Mean importance sampling ratio.
    pub mean_ratio: f64,
    /// Fraction of ratios that fell outside [1 - eps, 1 + eps].
    pub clip_fraction: f64,
    /// Mean k3 KL estimate against the reference policy.
    pub mean_kl: f64,
    /// Mean clipped surrogate objective, before the KL penalty.
    pub mean_surrogate: f64,
}

/// The result of evaluating the GRPO objective on one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GrpoOutput {
    /// Negated mean of the combined per-sample objective.
    pub loss: f64,
    /// Per-sample contribution `term_i / G` to the mean combined objective.
    ///
    /// This is a forward value, not a derivative: it is meant to be fed into
    /// an external autodiff pass that differentiates through
    /// `log_probs_new[i]`. Note that `grad` sums to `-loss`.
    pub grad: Vec<f64>,
    pub stats: GrpoStats,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// k3 estimate of KL(pi_theta || pi_ref) for one sample.
///
///   d = log pi_ref - log pi_theta
///   KL = exp(d) - d - 1
///
/// Zero when the two log-probabilities agree, positive otherwise.
/// `exp_m1` keeps the result from rounding below zero for tiny `d`.
pub fn kl_penalty(ref_log_prob: f64, current_log_prob: f64) -> f64 {
    let d = ref_log_prob - current_log_prob;
    d.exp_m1() - d
}

/// Evaluate the GRPO loss and per-sample gradient signal for one group.
///
/// # Algorithm
///
/// 1. Compute group-relative advantages from the rewards.
/// 2. For each sample, compute the importance ratio, its clipped version, the
///    pessimistic surrogate `min(rho * A, clip(rho) * A)` and the k3 KL
///    penalty, and combine them into `term_i = surr_i - beta * KL_i`.
/// 3. `loss = -mean(term_i)`, `grad[i] = term_i / G`.
///
/// # Errors
///
/// Fails before any arithmetic if `log_probs_new` does not have one entry per
/// sample, or if `epsilon` / `beta` are negative or not finite.
pub fn evaluate(
    group: &Group,
    log_probs_new: &[f64],
    epsilon: f64,
    beta: f64,
) -> Result<GrpoOutput> {
    let group_size = group.group_size();
    ensure_len("log_probs_new", log_probs_new, group_size)?;
    ensure_non_negative("epsilon", epsilon)?;
    ensure_non_negative("beta", beta)?;

    let g = group_size as f64;
    let advantages = compute_advantages(group.rewards())?;

    if group_size > 1 && advantages.iter().all(|&a| a == 0.0) {
        warn!(group_size, "All rewards in the group are identical; advantages are zero");
    }

    let mut total = 0.0;
    let mut total_surrogate = 0.0;
    let mut total_kl = 0.0;
    let mut total_ratio = 0.0;
    let mut num_clipped = 0usize;
    let mut grad = Vec::with_capacity(group_size);

    let samples = advantages
        .iter()
        .zip(log_probs_new)
        .zip(group.log_probs_old())
        .zip(group.log_probs_ref());

    for (((&advantage, &new_lp), &old_lp), &ref_lp) in samples {
        let ratio = compute_importance_ratio(new_lp, old_lp);
        let clipped = clip_ratio(ratio, epsilon);
        if clipped != ratio {
            num_clipped += 1;
        }

        // Pessimistic bound of the unclipped and clipped surrogates.
        let surrogate = (ratio * advantage).min(clipped * advantage);
        let kl = kl_penalty(ref_lp, new_lp);
        let term = surrogate - beta * kl;

        total += term;
        total_surrogate += surrogate;
        total_kl += kl;
        total_ratio += ratio;
        grad.push(term / g);
    }

    // Optimizers minimize, the combined term is an objective to maximize.
    let loss = -(total / g);

    let stats = GrpoStats {
        mean_advantage: advantages.iter().sum::<f64>() / g,
        mean_ratio: total_ratio / g,
        clip_fraction: num_clipped as f64 / g,
        mean_kl: total_kl / g,
        mean_surrogate: total_surrogate / g,
    };

    debug!(
        loss,
        mean_kl = stats.mean_kl,
        mean_ratio = stats.mean_ratio,
        clip_fraction = stats.clip_fraction,
        "GRPO loss computed for group of {} samples",
        group_size
    );

    Ok(GrpoOutput { loss, grad, stats })
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

/// GRPO objective bound to a validated set of hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct GrpoObjective {
    config: GrpoConfig,
}

impl GrpoObjective {
    /// Create an objective, rejecting invalid hyperparameters up front.
    pub fn new(config: GrpoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GrpoConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.config.clip_epsilon
    }

    pub fn beta(&self) -> f64 {
        self.config.kl_coeff
    }

    /// Compute the loss and per-sample gradient signal for `group`.
    pub fn compute_loss(&self, group: &Group, log_probs_new: &[f64]) -> Result<GrpoOutput> {
        evaluate(group, log_probs_new, self.epsilon(), self.beta())
    }
}
