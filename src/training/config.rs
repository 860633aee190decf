//! Training configuration

use super::models::ModelKind;
use super::random_forest::MaxFeatures;
use serde::{Deserialize, Serialize};

/// Configuration for the offline train stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Models to train
    pub models: Vec<ModelKind>,

    /// Random seed shared by the stochastic models
    pub random_state: u64,

    // Random forest
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth of trees (unbounded when unset)
    pub max_depth: Option<usize>,
    /// Features considered per split
    pub max_features: MaxFeatures,

    // Gradient boosting
    pub boosting_rounds: usize,
    pub boosting_max_depth: usize,
    pub boosting_learning_rate: f64,

    // Logistic regression
    /// L2 regularization
    pub alpha: f64,
    pub max_iter: usize,
    pub learning_rate: f64,

    // K nearest neighbour
    pub n_neighbors: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.to_vec(),
            random_state: 42,
            n_estimators: 100,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            boosting_rounds: 100,
            boosting_max_depth: 3,
            boosting_learning_rate: 0.1,
            alpha: 0.01,
            max_iter: 1000,
            learning_rate: 0.1,
            n_neighbors: 5,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to choose which models to train
    pub fn with_models(mut self, models: Vec<ModelKind>) -> Self {
        self.models = models;
        self
    }

    /// Builder method to set number of forest trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Builder method to set number of boosting rounds
    pub fn with_boosting_rounds(mut self, n: usize) -> Self {
        self.boosting_rounds = n;
        self
    }

    pub fn with_boosting_max_depth(mut self, depth: usize) -> Self {
        self.boosting_max_depth = depth;
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.models.len(), 4);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.boosting_max_depth, 3);
        assert_eq!(config.n_neighbors, 5);
        assert_eq!(config.random_state, 42);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new()
            .with_models(vec![ModelKind::GradientBoosting])
            .with_boosting_rounds(25)
            .with_max_depth(8)
            .with_max_features(MaxFeatures::All);

        assert_eq!(config.models, vec![ModelKind::GradientBoosting]);
        assert_eq!(config.boosting_rounds, 25);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.max_features, MaxFeatures::All);
    }
}
