use crate::block::BlockKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Relative importance of the three similarity signals for one category of node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub name: f64,
    pub options: f64,
    pub children: f64,
}

impl Weights {
    pub const fn new(name: f64, options: f64, children: f64) -> Self {
        Self {
            name,
            options,
            children,
        }
    }

    pub fn total(&self) -> f64 {
        self.name + self.options + self.children
    }

    /// Weighted mean of the three signals, clamped to `[0, 1]` and rounded to nine decimals
    /// so that scores landing exactly on a threshold compare as equal to it.
    pub fn combine(&self, name: f64, options: f64, children: f64) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted = self.name * name + self.options * options + self.children * children;
        let mean = ((weighted / total) * 1e9).round() / 1e9;
        mean.clamp(0.0, 1.0)
    }
}

/// How a similarity score is to be treated by the change detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Clearly the same node; no confirmation needed.
    Confident,
    /// Possibly the same node; the decision source has to confirm.
    Ambiguous,
    Dissimilar,
}

/// Weights and thresholds of the structural comparator.
///
/// The defaults were tuned by hand against typical Wagtail schemas; leaves are judged
/// mostly by their options, containers mostly by how many of their children survived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub confident_threshold: f64,
    pub verifying_threshold: f64,
    pub leaf: Weights,
    pub container: Weights,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            confident_threshold: 0.9,
            verifying_threshold: 0.5,
            leaf: Weights::new(0.2, 0.8, 0.0),
            container: Weights::new(0.1, 0.2, 0.7),
        }
    }
}

impl SimilarityConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::JsonParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Overrides the thresholds that are given, keeping the others.
    pub fn with_thresholds(mut self, confident: Option<f64>, verifying: Option<f64>) -> Self {
        if let Some(confident) = confident {
            self.confident_threshold = confident;
        }
        if let Some(verifying) = verifying {
            self.verifying_threshold = verifying;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, threshold) in [
            ("confident_threshold", self.confident_threshold),
            ("verifying_threshold", self.verifying_threshold),
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Invalid(format!(
                    "{} must lie in [0, 1], got {}",
                    label, threshold
                )));
            }
        }
        if self.verifying_threshold > self.confident_threshold {
            return Err(ConfigError::Invalid(format!(
                "verifying_threshold ({}) is above confident_threshold ({})",
                self.verifying_threshold, self.confident_threshold
            )));
        }
        for (label, weights) in [("leaf", &self.leaf), ("container", &self.container)] {
            if weights.name < 0.0 || weights.options < 0.0 || weights.children < 0.0 {
                return Err(ConfigError::Invalid(format!("{} weights must not be negative", label)));
            }
            if weights.total() <= 0.0 {
                return Err(ConfigError::Invalid(format!("{} weights are all zero", label)));
            }
        }
        Ok(())
    }

    pub fn weights_for(&self, kind: BlockKind) -> &Weights {
        if kind.is_container() {
            &self.container
        } else {
            &self.leaf
        }
    }

    pub fn classify(&self, score: f64) -> Confidence {
        if score >= self.confident_threshold {
            Confidence::Confident
        } else if score >= self.verifying_threshold {
            Confidence::Ambiguous
        } else {
            Confidence::Dissimilar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = SimilarityConfig::from_json(r#"{"verifying_threshold": 0.4}"#).unwrap();
        assert_eq!(config.verifying_threshold, 0.4);
        assert_eq!(config.confident_threshold, 0.9);
        assert_eq!(config.leaf, SimilarityConfig::default().leaf);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = SimilarityConfig::from_json(
            r#"{"confident_threshold": 0.3, "verifying_threshold": 0.6}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_weights() {
        let config = SimilarityConfig {
            leaf: Weights::new(0.0, 0.0, 0.0),
            ..SimilarityConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn classifies_by_thresholds() {
        let config = SimilarityConfig::default();
        assert_eq!(config.classify(0.95), Confidence::Confident);
        assert_eq!(config.classify(0.9), Confidence::Confident);
        assert_eq!(config.classify(0.5), Confidence::Ambiguous);
        assert_eq!(config.classify(0.2), Confidence::Dissimilar);
    }

    #[test]
    fn combine_is_a_weighted_mean() {
        let weights = Weights::new(0.1, 0.2, 0.7);
        let score = weights.combine(0.0, 1.0, 2.0 / 3.0);
        assert!((score - (0.2 + 0.7 * 2.0 / 3.0)).abs() < 1e-9);
    }
}
