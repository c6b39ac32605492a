//! Engine configuration

use amusic_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Over-fetch multiplier applied to the requested count
pub const DEFAULT_OVER_FETCH_FACTOR: usize = 2;

/// Diversity used when a request does not carry one
pub const DEFAULT_DIVERSITY: f32 = 0.7;

/// Tuning knobs of a [`RecommendationEngine`](crate::RecommendationEngine)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidates fetched per requested result before filtering
    pub over_fetch_factor: usize,

    /// Diversity applied when the request leaves it unset, in [0, 1]
    pub default_diversity: f32,

    /// Feature-space distance under which two results count as near-duplicates
    /// at diversity 1.0; scaled linearly by the request's diversity.
    /// Zero disables distance-based rejection, leaving label dedup only.
    pub min_separation: f32,

    /// Re-query with a doubled candidate count when filtering leaves a shortfall
    pub widen_on_shortfall: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            over_fetch_factor: DEFAULT_OVER_FETCH_FACTOR,
            default_diversity: DEFAULT_DIVERSITY,
            min_separation: 0.0,
            widen_on_shortfall: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.over_fetch_factor == 0 {
            return Err(Error::Configuration(
                "over_fetch_factor must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_diversity) {
            return Err(Error::Configuration(format!(
                "default_diversity {} is outside [0, 1]",
                self.default_diversity
            )));
        }
        if !self.min_separation.is_finite() || self.min_separation < 0.0 {
            return Err(Error::Configuration(format!(
                "min_separation {} must be a non-negative number",
                self.min_separation
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.over_fetch_factor, 2);
    }

    #[test]
    fn test_invalid_values() {
        let zero_factor = EngineConfig {
            over_fetch_factor: 0,
            ..Default::default()
        };
        assert!(zero_factor.validate().is_err());

        let diversity = EngineConfig {
            default_diversity: 1.5,
            ..Default::default()
        };
        assert!(diversity.validate().is_err());

        let separation = EngineConfig {
            min_separation: f32::NAN,
            ..Default::default()
        };
        assert!(separation.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"min_separation": 0.5}"#).unwrap();
        assert_eq!(config.min_separation, 0.5);
        assert_eq!(config.over_fetch_factor, DEFAULT_OVER_FETCH_FACTOR);
        assert!(config.widen_on_shortfall);
    }
}
