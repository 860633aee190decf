//! Preprocessing configuration

use super::FeatureSet;
use serde::{Deserialize, Serialize};

/// Configuration for the offline preprocess stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Feature sets to prepare
    pub feature_sets: Vec<FeatureSet>,

    /// Down-sample the raw data to at most this many rows before preparing
    pub sample_size: Option<usize>,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Random seed for sampling and the train/test split
    pub random_state: u64,

    /// Whether to drop exact-duplicate rows (keeping the first)
    pub drop_duplicates: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            feature_sets: FeatureSet::ALL.to_vec(),
            sample_size: None,
            test_size: 0.2,
            random_state: 42,
            drop_duplicates: true,
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to restrict preparation to the given feature sets
    pub fn with_feature_sets(mut self, feature_sets: Vec<FeatureSet>) -> Self {
        self.feature_sets = feature_sets;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_drop_duplicates(mut self, drop_duplicates: bool) -> Self {
        self.drop_duplicates = drop_duplicates;
        self
    }
}
