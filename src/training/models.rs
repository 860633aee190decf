//! Model kinds and the fitted model enum

use super::config::TrainingConfig;
use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::knn::{KNNClassifier, KNNConfig};
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use crate::error::{FlightDelayError, Result};
use crate::preprocessing::FeatureSet;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The classifiers the pipeline trains, each bound to one feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    LogisticRegression,
    KNearestNeighbor,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::RandomForest,
        ModelKind::LogisticRegression,
        ModelKind::KNearestNeighbor,
        ModelKind::GradientBoosting,
    ];

    /// Stable name used in requests and artifact file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::KNearestNeighbor => "k_nearest_neighbor",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    /// Name shown in evaluation output
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "Random Forest",
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::KNearestNeighbor => "K Nearest Neighbor",
            ModelKind::GradientBoosting => "Gradient Boosting",
        }
    }

    pub fn feature_set(&self) -> FeatureSet {
        match self {
            ModelKind::RandomForest => FeatureSet::FlightStatus,
            ModelKind::LogisticRegression => FeatureSet::Baseline,
            ModelKind::KNearestNeighbor => FeatureSet::Knn,
            ModelKind::GradientBoosting => FeatureSet::Weather,
        }
    }

    pub fn valid_names() -> Vec<String> {
        ModelKind::ALL.iter().map(|k| k.as_str().to_string()).collect()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = FlightDelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "random_forest" => Ok(ModelKind::RandomForest),
            "logistic_regression" | "log_reg" => Ok(ModelKind::LogisticRegression),
            "k_nearest_neighbor" => Ok(ModelKind::KNearestNeighbor),
            "gradient_boosting" => Ok(ModelKind::GradientBoosting),
            other => Err(FlightDelayError::InvalidModelChoice {
                choice: other.to_string(),
                valid: ModelKind::valid_names(),
            }),
        }
    }
}

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    KNearestNeighbor(KNNClassifier),
    GradientBoosting(GradientBoostingClassifier),
}

impl TrainedModel {
    /// Fit a fresh model of `kind` with the configured hyperparameters
    pub fn fit(
        kind: ModelKind,
        config: &TrainingConfig,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Self> {
        match kind {
            ModelKind::RandomForest => {
                let mut model = RandomForest::new(config.n_estimators)
                    .with_max_features(config.max_features)
                    .with_random_state(config.random_state);
                if let Some(depth) = config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y)?;
                Ok(TrainedModel::RandomForest(model))
            }
            ModelKind::LogisticRegression => {
                let mut model = LogisticRegression::new()
                    .with_alpha(config.alpha)
                    .with_max_iter(config.max_iter)
                    .with_learning_rate(config.learning_rate);
                model.fit(x, y)?;
                Ok(TrainedModel::LogisticRegression(model))
            }
            ModelKind::KNearestNeighbor => {
                let mut model = KNNClassifier::new(KNNConfig {
                    n_neighbors: config.n_neighbors,
                });
                model.fit(x, y)?;
                Ok(TrainedModel::KNearestNeighbor(model))
            }
            ModelKind::GradientBoosting => {
                let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
                    n_estimators: config.boosting_rounds,
                    learning_rate: config.boosting_learning_rate,
                    max_depth: config.boosting_max_depth,
                    ..Default::default()
                });
                model.fit(x, y)?;
                Ok(TrainedModel::GradientBoosting(model))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::LogisticRegression(_) => ModelKind::LogisticRegression,
            TrainedModel::KNearestNeighbor(_) => ModelKind::KNearestNeighbor,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    /// Predicted labels in {0, 1}
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::RandomForest(m) => m.predict(x),
            TrainedModel::LogisticRegression(m) => m.predict(x),
            TrainedModel::KNearestNeighbor(m) => m.predict(x),
            TrainedModel::GradientBoosting(m) => m.predict(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_names() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!("log_reg".parse::<ModelKind>().unwrap(), ModelKind::LogisticRegression);
        assert_eq!(ModelKind::KNearestNeighbor.display_name(), "K Nearest Neighbor");
    }

    #[test]
    fn test_invalid_choice_lists_valid_names() {
        let err = "svm".parse::<ModelKind>().unwrap_err();
        match err {
            FlightDelayError::InvalidModelChoice { choice, valid } => {
                assert_eq!(choice, "svm");
                assert_eq!(valid.len(), 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_each_kind_has_distinct_feature_set() {
        let mut sets: Vec<FeatureSet> = ModelKind::ALL.iter().map(|k| k.feature_set()).collect();
        sets.sort();
        sets.dedup();
        assert_eq!(sets.len(), 4);
    }

    #[test]
    fn test_fit_every_kind() {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [0.3, 0.2],
            [2.0, 2.1],
            [2.2, 1.9],
            [2.1, 2.3],
            [1.9, 2.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let config = TrainingConfig::default()
            .with_n_estimators(10)
            .with_boosting_rounds(10)
            .with_n_neighbors(3);

        for kind in ModelKind::ALL {
            let model = TrainedModel::fit(kind, &config, &x, &y).unwrap();
            assert_eq!(model.kind(), kind);
            let predictions = model.predict(&x).unwrap();
            assert_eq!(predictions, y, "{} misclassified separable data", kind);
        }
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let model =
            TrainedModel::fit(ModelKind::RandomForest, &TrainingConfig::default().with_n_estimators(5), &x, &y)
                .unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }
}
