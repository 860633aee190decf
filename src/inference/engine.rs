//! Prediction service
//!
//! Loads a persisted model and its scaler, runs uploaded records through the
//! same feature preparation the model was trained with, and scores the
//! stored held-out tables.

use super::InferenceConfig;
use crate::error::{FlightDelayError, Result};
use crate::preprocessing::{
    schema::{PREDICTED_DEP_DEL15, TARGET},
    FeaturePreparer, StandardScaler,
};
use crate::store::{ArtifactStore, ModelArtifact};
use crate::training::{EvaluationReport, ModelKind};
use crate::utils::{frame_to_matrix, sample_rows, DataLoader};
use ndarray::Array1;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Rows with predictions attached
#[derive(Debug, Clone)]
pub struct PredictionOutput {
    pub kind: ModelKind,
    /// Cleaned input rows plus `PART_OF_DAY` and `PREDICTED_DEP_DEL15`
    pub frame: DataFrame,
    /// Where the frame was written, if it was
    pub output_path: Option<PathBuf>,
}

impl PredictionOutput {
    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }
}

/// A model artifact with the scaler it was trained against
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub scaler: StandardScaler,
}

/// Serves predictions and evaluations from an artifact store
#[derive(Debug, Clone)]
pub struct PredictionService {
    store: ArtifactStore,
    config: InferenceConfig,
}

impl PredictionService {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            config: InferenceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InferenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Load a model and its scaler, checking the scaler is the one the model
    /// was trained with
    pub fn load(&self, kind: ModelKind) -> Result<LoadedModel> {
        let artifact = self.store.load_model(kind)?;
        let (scaler, fingerprint) = self.store.load_scaler(kind.feature_set())?;

        if fingerprint != artifact.scaler_fingerprint {
            return Err(FlightDelayError::ScalerMismatch {
                model: kind.to_string(),
                expected: artifact.scaler_fingerprint,
                found: fingerprint,
            });
        }
        let scaler_names = scaler.feature_names();
        if scaler_names != artifact.schema.feature_names {
            return Err(FlightDelayError::SchemaMismatch {
                expected: artifact.schema.feature_names.clone(),
                actual: scaler_names,
            });
        }

        Ok(LoadedModel { artifact, scaler })
    }

    /// Predict delays for the rows of a CSV file
    ///
    /// The model choice is validated before anything is read from disk.
    pub fn predict_file(
        &self,
        path: &Path,
        choice: &str,
        sample_size: Option<usize>,
    ) -> Result<PredictionOutput> {
        let kind: ModelKind = choice.parse()?;
        let loaded = self.load(kind)?;
        let df = DataLoader::new().load_csv(path)?;
        self.predict_with(&loaded, &df, sample_size)
    }

    /// Predict delays for an in-memory record table
    pub fn predict(&self, df: &DataFrame, choice: &str, sample_size: Option<usize>) -> Result<PredictionOutput> {
        let kind: ModelKind = choice.parse()?;
        let loaded = self.load(kind)?;
        self.predict_with(&loaded, df, sample_size)
    }

    pub fn predict_with(
        &self,
        loaded: &LoadedModel,
        df: &DataFrame,
        sample_size: Option<usize>,
    ) -> Result<PredictionOutput> {
        let start = Instant::now();
        let kind = loaded.artifact.kind;
        let schema = &loaded.artifact.schema;

        let sample_size = sample_size.unwrap_or(self.config.default_sample_size);
        if sample_size == 0 {
            return Err(FlightDelayError::ConfigError("sample_size must be positive".to_string()));
        }
        let sampled = sample_rows(df, sample_size, self.config.sample_seed)?;

        // Every uploaded row that survives null filtering gets a prediction
        let prepared = FeaturePreparer::new(schema.feature_set)
            .with_drop_duplicates(false)
            .transform(&sampled, schema)?;
        let scaled = loaded.scaler.transform(&prepared.features, &prepared.feature_names)?;
        let predictions = loaded.artifact.model.predict(&scaled)?;

        let labels: Vec<i64> = predictions.iter().map(|&p| if p >= 0.5 { 1 } else { 0 }).collect();
        let mut frame = prepared.frame;
        frame.with_column(Series::new(PREDICTED_DEP_DEL15.into(), labels))?;

        let output_path = if self.config.write_predictions {
            Some(self.store.save_predictions(kind, &mut frame)?)
        } else {
            None
        };

        info!(
            model = %kind,
            rows = frame.height(),
            uploaded = df.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Predictions complete"
        );

        Ok(PredictionOutput {
            kind,
            frame,
            output_path,
        })
    }

    /// Re-score one model on its stored evaluation table
    pub fn evaluate_model(&self, kind: ModelKind) -> Result<EvaluationReport> {
        let artifact = self.store.load_model(kind)?;
        let df = self.store.load_evaluation_data(kind.feature_set())?;

        let present: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let mut expected = artifact.schema.feature_names.clone();
        expected.push(TARGET.to_string());
        if expected.iter().any(|name| !present.contains(name)) {
            return Err(FlightDelayError::SchemaMismatch {
                expected,
                actual: present,
            });
        }

        let x = frame_to_matrix(&df, &artifact.schema.feature_names)?;
        let y: Array1<f64> = frame_to_matrix(&df, &[TARGET.to_string()])?.column(0).to_owned();

        let predictions = artifact.model.predict(&x)?;
        let report = EvaluationReport::compute(&y, &predictions)?;
        debug!(model = %kind, rows = y.len(), accuracy = report.accuracy, "Evaluated model");
        Ok(report)
    }

    /// Evaluate every model, keyed by display name
    pub fn evaluate(&self) -> Result<BTreeMap<String, EvaluationReport>> {
        let start = Instant::now();
        let mut reports = BTreeMap::new();
        for kind in ModelKind::ALL {
            reports.insert(kind.display_name().to_string(), self.evaluate_model(kind)?);
        }
        info!(
            models = reports.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Evaluation complete"
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_choice_fails_before_io() {
        let service = PredictionService::new(ArtifactStore::new("/nonexistent/m", "/nonexistent/d", "/nonexistent/r"));
        let err = service
            .predict_file(Path::new("/nonexistent/input.csv"), "svm", None)
            .unwrap_err();
        assert!(matches!(err, FlightDelayError::InvalidModelChoice { .. }));
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = PredictionService::new(ArtifactStore::under(dir.path()));
        let err = service
            .predict_file(&dir.path().join("input.csv"), "random_forest", None)
            .unwrap_err();
        assert!(matches!(err, FlightDelayError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_evaluate_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let service = PredictionService::new(ArtifactStore::under(dir.path()));
        assert!(matches!(service.evaluate(), Err(FlightDelayError::ArtifactNotFound(_))));
    }
}
