//! Inference configuration

use serde::{Deserialize, Serialize};

/// Configuration for the prediction service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Rows kept from an uploaded file when the caller gives no sample size
    pub default_sample_size: usize,

    /// Seed for down-sampling uploads
    pub sample_seed: u64,

    /// Whether to write `test_predictions_<model>.csv` for every prediction
    pub write_predictions: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            default_sample_size: 3000,
            sample_seed: 1,
            write_predictions: true,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the default sample size
    pub fn with_default_sample_size(mut self, n: usize) -> Self {
        self.default_sample_size = n;
        self
    }

    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = seed;
        self
    }

    pub fn with_write_predictions(mut self, write: bool) -> Self {
        self.write_predictions = write;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.default_sample_size, 3000);
        assert_eq!(config.sample_seed, 1);
        assert!(config.write_predictions);
    }

    #[test]
    fn test_builder_pattern() {
        let config = InferenceConfig::new()
            .with_default_sample_size(500)
            .with_write_predictions(false);

        assert_eq!(config.default_sample_size, 500);
        assert!(!config.write_predictions);
    }
}
