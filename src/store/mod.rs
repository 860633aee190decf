//! On-disk artifact layout shared by the offline stages and the service
//!
//! ```text
//! <models_dir>/scaler_<feature_set>.json
//! <models_dir>/<model>_model.json
//! <data_dir>/preprocessed_<feature_set>.json.lz4
//! <data_dir>/evaluation_data_<feature_set>.csv
//! <results_dir>/test_predictions_<model>.csv
//! ```

mod artifacts;

pub use artifacts::{ModelArtifact, PreprocessedArchive};

use crate::error::{FlightDelayError, Result};
use crate::preprocessing::{FeatureSet, StandardScaler};
use crate::training::ModelKind;
use crate::utils::{DataLoader, DataSaver};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory roots for every persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStore {
    pub models_dir: PathBuf,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ArtifactStore {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            data_dir: data_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    /// All three directories under one root (`trained/`, `data/`, `results/`)
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("trained"), root.join("data"), root.join("results"))
    }

    /// Read `MODELS_DIR`, `DATA_DIR` and `RESULTS_DIR`
    pub fn from_env() -> Self {
        let dir = |key: &str, default: &str| {
            PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.to_string()))
        };
        Self::new(
            dir("MODELS_DIR", "./trained"),
            dir("DATA_DIR", "./data"),
            dir("RESULTS_DIR", "./results"),
        )
    }

    pub fn scaler_path(&self, feature_set: FeatureSet) -> PathBuf {
        self.models_dir.join(format!("scaler_{}.json", feature_set))
    }

    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        self.models_dir.join(format!("{}_model.json", kind))
    }

    pub fn archive_path(&self, feature_set: FeatureSet) -> PathBuf {
        self.data_dir.join(format!("preprocessed_{}.json.lz4", feature_set))
    }

    pub fn evaluation_path(&self, feature_set: FeatureSet) -> PathBuf {
        self.data_dir.join(format!("evaluation_data_{}.csv", feature_set))
    }

    pub fn predictions_path(&self, kind: ModelKind) -> PathBuf {
        self.results_dir.join(format!("test_predictions_{}.csv", kind))
    }

    /// Create the models, data and results directories
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.models_dir, &self.data_dir, &self.results_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Save the scaler and return its fingerprint
    pub fn save_scaler(&self, feature_set: FeatureSet, scaler: &StandardScaler) -> Result<String> {
        std::fs::create_dir_all(&self.models_dir)?;
        let path = self.scaler_path(feature_set);
        let fingerprint = scaler.save(&path)?;
        info!(path = %path.display(), %fingerprint, "Saved scaler");
        Ok(fingerprint)
    }

    /// Load a scaler and the fingerprint of its bytes
    pub fn load_scaler(&self, feature_set: FeatureSet) -> Result<(StandardScaler, String)> {
        StandardScaler::load(&self.scaler_path(feature_set))
    }

    pub fn save_archive(&self, archive: &PreprocessedArchive) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.archive_path(archive.feature_set());

        let serialized = serde_json::to_vec(archive)?;
        let compressed = lz4_flex::compress_prepend_size(&serialized);
        std::fs::write(&path, &compressed)?;

        info!(
            path = %path.display(),
            raw_bytes = serialized.len(),
            compressed_bytes = compressed.len(),
            "Saved preprocessed archive"
        );
        Ok(path)
    }

    pub fn load_archive(&self, feature_set: FeatureSet) -> Result<PreprocessedArchive> {
        let path = self.archive_path(feature_set);
        let compressed = read_artifact(&path)?;
        let serialized = lz4_flex::decompress_size_prepended(&compressed).map_err(|e| {
            FlightDelayError::SerializationError(format!(
                "LZ4 decompression of {} failed: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_slice(&serialized)?)
    }

    pub fn save_model(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.models_dir)?;
        let path = self.model_path(artifact.kind);
        std::fs::write(&path, serde_json::to_vec(artifact)?)?;
        info!(model = %artifact.kind, path = %path.display(), "Saved model");
        Ok(path)
    }

    pub fn load_model(&self, kind: ModelKind) -> Result<ModelArtifact> {
        let path = self.model_path(kind);
        let artifact: ModelArtifact = serde_json::from_slice(&read_artifact(&path)?)?;
        if artifact.kind != kind {
            return Err(FlightDelayError::SerializationError(format!(
                "{} holds a {} model",
                path.display(),
                artifact.kind
            )));
        }
        debug!(model = %kind, path = %path.display(), "Loaded model");
        Ok(artifact)
    }

    pub fn save_evaluation_data(&self, feature_set: FeatureSet, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.evaluation_path(feature_set);
        DataSaver::save_csv(df, &path)?;
        info!(path = %path.display(), rows = df.height(), "Saved evaluation data");
        Ok(path)
    }

    pub fn load_evaluation_data(&self, feature_set: FeatureSet) -> Result<DataFrame> {
        DataLoader::new().load_csv(&self.evaluation_path(feature_set))
    }

    pub fn save_predictions(&self, kind: ModelKind, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.predictions_path(kind);
        DataSaver::save_csv(df, &path)?;
        info!(model = %kind, path = %path.display(), rows = df.height(), "Saved predictions");
        Ok(path)
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FlightDelayError::ArtifactNotFound(path.to_path_buf()),
        _ => FlightDelayError::IoError(e),
    })
}
