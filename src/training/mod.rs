//! Model training module
//!
//! Fits the delay classifiers on preprocessed feature sets:
//! - Random forest over CART decision trees
//! - L2-regularised logistic regression
//! - K-nearest neighbours
//! - Gradient boosted regression trees on log-loss
//!
//! and scores them with accuracy, a confusion matrix and a per-class report.

mod config;
mod engine;
mod metrics;
mod models;
mod split;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod linear_models;
pub mod random_forest;

pub use config::TrainingConfig;
pub use engine::{PreprocessSummary, Trainer, TrainingSummary};
pub use metrics::{ClassMetrics, ClassificationReport, EvaluationReport};
pub use models::{ModelKind, TrainedModel};
pub use split::{train_test_split, TrainTestSplit};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use knn::{KNNClassifier, KNNConfig};
pub use linear_models::LogisticRegression;
pub use random_forest::{MaxFeatures, RandomForest};
