//! Persisted artifact payloads

use crate::preprocessing::{FeatureSchema, FeatureSet};
use crate::training::{EvaluationReport, ModelKind, TrainedModel};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Scaled train/test matrices for one feature set, written by the preprocess
/// stage and read back by the train stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessedArchive {
    pub schema: FeatureSchema,
    /// Fingerprint of the scaler the matrices were scaled with
    pub scaler_fingerprint: String,
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
    pub created_at: DateTime<Utc>,
}

impl PreprocessedArchive {
    pub fn feature_set(&self) -> FeatureSet {
        self.schema.feature_set
    }
}

/// A fitted classifier together with everything needed to serve it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub model: TrainedModel,
    pub schema: FeatureSchema,
    pub scaler_fingerprint: String,
    /// Held-out evaluation at training time
    pub report: EvaluationReport,
    pub n_train_samples: usize,
    pub trained_at: DateTime<Utc>,
}
