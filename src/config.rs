use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, Result};

/// GRPO hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrpoConfig {
    /// PPO clipping epsilon: half-width of the ratio interval around 1 (default: 0.2).
    pub clip_epsilon: f64,
    /// KL divergence coefficient beta (default: 0.1).
    pub kl_coeff: f64,
}

impl GrpoConfig {
    /// Reject negative or non-finite hyperparameters.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("clip_epsilon", self.clip_epsilon)?;
        ensure_non_negative("kl_coeff", self.kl_coeff)?;
        Ok(())
    }
}

impl Default for GrpoConfig {
    fn default() -> Self {
        Self {
            clip_epsilon: 0.2,
            kl_coeff: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrpoError;

    #[test]
    fn test_default_config() {
        let config = GrpoConfig::default();
        assert_eq!(config.clip_epsilon, 0.2);
        assert_eq!(config.kl_coeff, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GrpoConfig = serde_json::from_str(r#"{ "kl_coeff": 0.04 }"#).unwrap();
        assert_eq!(config.clip_epsilon, 0.2);
        assert_eq!(config.kl_coeff, 0.04);
    }

    #[test]
    fn test_validate_rejects_negative() {
        let config = GrpoConfig {
            clip_epsilon: -0.2,
            ..GrpoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(GrpoError::InvalidHyperparameter {
                name: "clip_epsilon",
                value: -0.2,
            })
        );
    }

    #[test]
    fn test_validate_rejects_nan_beta() {
        let config = GrpoConfig {
            kl_coeff: f64::NAN,
            ..GrpoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
