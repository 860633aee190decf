//! Offline preprocess and train stages

use super::config::TrainingConfig;
use super::metrics::EvaluationReport;
use super::models::{ModelKind, TrainedModel};
use super::split::train_test_split;
use crate::error::{FlightDelayError, Result};
use crate::preprocessing::{schema::TARGET, FeaturePreparer, FeatureSet, PreprocessingConfig, StandardScaler};
use crate::store::{ArtifactStore, ModelArtifact, PreprocessedArchive};
use crate::utils::{matrix_to_frame, sample_rows, DataLoader};
use chrono::Utc;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// What the preprocess stage wrote for one feature set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessSummary {
    pub feature_set: FeatureSet,
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    pub scaler_fingerprint: String,
    pub archive_path: PathBuf,
    pub evaluation_path: PathBuf,
}

/// Outcome of fitting one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub kind: ModelKind,
    pub n_train: usize,
    pub n_test: usize,
    pub report: EvaluationReport,
    pub training_time_secs: f64,
    pub model_path: PathBuf,
}

/// Runs the offline stages against an artifact store
pub struct Trainer {
    store: ArtifactStore,
    preprocessing: PreprocessingConfig,
    training: TrainingConfig,
}

impl Trainer {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            preprocessing: PreprocessingConfig::default(),
            training: TrainingConfig::default(),
        }
    }

    pub fn with_preprocessing(mut self, config: PreprocessingConfig) -> Self {
        self.preprocessing = config;
        self
    }

    pub fn with_training(mut self, config: TrainingConfig) -> Self {
        self.training = config;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Read a raw CSV and preprocess it for every configured feature set
    pub fn preprocess_file(&self, path: &Path) -> Result<Vec<PreprocessSummary>> {
        let df = DataLoader::new().load_csv(path)?;
        self.preprocess(&df)
    }

    /// Split, scale and persist each configured feature set
    pub fn preprocess(&self, raw: &DataFrame) -> Result<Vec<PreprocessSummary>> {
        let config = &self.preprocessing;
        if config.feature_sets.is_empty() {
            return Err(FlightDelayError::ConfigError("no feature sets configured".to_string()));
        }
        self.store.ensure_dirs()?;

        let df = match config.sample_size {
            Some(n) => sample_rows(raw, n, config.random_state)?,
            None => raw.clone(),
        };
        info!(rows = df.height(), sampled_from = raw.height(), "Starting preprocessing");

        config
            .feature_sets
            .iter()
            .map(|&feature_set| self.preprocess_feature_set(&df, feature_set))
            .collect()
    }

    fn preprocess_feature_set(&self, df: &DataFrame, feature_set: FeatureSet) -> Result<PreprocessSummary> {
        let config = &self.preprocessing;
        let start = Instant::now();

        let preparer = FeaturePreparer::new(feature_set).with_drop_duplicates(config.drop_duplicates);
        let (schema, prepared) = preparer.fit(df)?;
        let target = prepared.target.ok_or_else(|| {
            FlightDelayError::MissingColumns(vec![TARGET.to_string()])
        })?;

        let split = train_test_split(&prepared.features, &target, config.test_size, config.random_state)?;

        let scaler = StandardScaler::fit(&split.x_train, &schema.feature_names)?;
        let x_train = scaler.transform(&split.x_train, &schema.feature_names)?;
        let x_test = scaler.transform(&split.x_test, &schema.feature_names)?;
        let scaler_fingerprint = self.store.save_scaler(feature_set, &scaler)?;

        let mut evaluation = matrix_to_frame(&schema.feature_names, &x_test, Some((TARGET, &split.y_test)))?;
        let evaluation_path = self.store.save_evaluation_data(feature_set, &mut evaluation)?;

        let archive = PreprocessedArchive {
            schema: schema.clone(),
            scaler_fingerprint: scaler_fingerprint.clone(),
            x_train,
            y_train: split.y_train,
            x_test,
            y_test: split.y_test,
            created_at: Utc::now(),
        };
        let archive_path = self.store.save_archive(&archive)?;

        info!(
            feature_set = %feature_set,
            train = archive.x_train.nrows(),
            test = archive.x_test.nrows(),
            features = schema.n_features(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessed feature set"
        );

        Ok(PreprocessSummary {
            feature_set,
            n_rows: prepared.frame.height(),
            n_train: archive.x_train.nrows(),
            n_test: archive.x_test.nrows(),
            feature_names: schema.feature_names,
            scaler_fingerprint,
            archive_path,
            evaluation_path,
        })
    }

    /// Fit, evaluate and persist every configured model
    pub fn train(&self) -> Result<Vec<TrainingSummary>> {
        if self.training.models.is_empty() {
            return Err(FlightDelayError::ConfigError("no models configured".to_string()));
        }
        self.training
            .models
            .iter()
            .map(|&kind| self.train_model(kind))
            .collect()
    }

    pub fn train_model(&self, kind: ModelKind) -> Result<TrainingSummary> {
        let start = Instant::now();
        let archive = self.store.load_archive(kind.feature_set())?;

        // The archive must still match the scaler on disk
        let (_, fingerprint) = self.store.load_scaler(kind.feature_set())?;
        if fingerprint != archive.scaler_fingerprint {
            warn!(model = %kind, "Archive was scaled with a different scaler");
            return Err(FlightDelayError::ScalerMismatch {
                model: kind.to_string(),
                expected: archive.scaler_fingerprint,
                found: fingerprint,
            });
        }

        info!(
            model = %kind,
            feature_set = %kind.feature_set(),
            samples = archive.x_train.nrows(),
            features = archive.x_train.ncols(),
            "Training model"
        );

        let model = TrainedModel::fit(kind, &self.training, &archive.x_train, &archive.y_train)?;
        let predictions = model.predict(&archive.x_test)?;
        let report = EvaluationReport::compute(&archive.y_test, &predictions)?;
        let training_time_secs = start.elapsed().as_secs_f64();

        let artifact = ModelArtifact {
            kind,
            model,
            schema: archive.schema,
            scaler_fingerprint: archive.scaler_fingerprint,
            report: report.clone(),
            n_train_samples: archive.x_train.nrows(),
            trained_at: Utc::now(),
        };
        let model_path = self.store.save_model(&artifact)?;

        info!(
            model = %kind,
            accuracy = report.accuracy,
            elapsed_secs = training_time_secs,
            "Model trained"
        );

        Ok(TrainingSummary {
            kind,
            n_train: archive.x_train.nrows(),
            n_test: archive.x_test.nrows(),
            report,
            training_time_secs,
            model_path,
        })
    }
}
