//! Flight delay prediction
//!
//! Predicts whether a flight departs 15+ minutes late from flight and
//! weather records.
//!
//! # Modules
//!
//! - [`preprocessing`] - Column validation, `PART_OF_DAY` derivation, one-hot encoding, scaling
//! - [`training`] - Classifiers, train/test split, evaluation metrics, offline stages
//! - [`store`] - Persisted scalers, archives, models and evaluation tables
//! - [`inference`] - Prediction and evaluation from persisted artifacts
//! - [`server`] - HTTP API
//! - [`cli`] - Command-line interface

pub mod error;

pub mod preprocessing;
pub mod training;
pub mod store;
pub mod inference;
pub mod utils;

pub mod server;
pub mod cli;

pub use error::{FlightDelayError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{FlightDelayError, Result};
    pub use crate::inference::{InferenceConfig, PredictionOutput, PredictionService};
    pub use crate::preprocessing::{FeaturePreparer, FeatureSet, PreprocessingConfig, StandardScaler};
    pub use crate::store::{ArtifactStore, ModelArtifact};
    pub use crate::training::{EvaluationReport, ModelKind, Trainer, TrainingConfig};
}
