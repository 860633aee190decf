//! Feature standardization

use crate::error::{FlightDelayError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parameters for one fitted feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub feature: String,
    pub mean: f64,
    pub scale: f64,
}

/// Standard scaler (z-score normalization): (x - mean) / std
///
/// Fitted once on training features and immutable afterwards. The fitted
/// feature names travel with the parameters so a transform on a differently
/// ordered matrix is rejected instead of silently misapplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Fit on a training matrix whose columns are named by `feature_names`
    pub fn fit(x: &Array2<f64>, feature_names: &[String]) -> Result<Self> {
        if x.ncols() != feature_names.len() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("{} columns", feature_names.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        if x.nrows() == 0 {
            return Err(FlightDelayError::EmptyDataset);
        }

        let params = feature_names
            .iter()
            .zip(x.axis_iter(Axis(1)))
            .map(|(name, column)| {
                let mean = column.mean().unwrap_or(0.0);
                // population std, as StandardScaler does
                let std = column.std(0.0);
                ScalerParams {
                    feature: name.clone(),
                    mean,
                    scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
                }
            })
            .collect();

        Ok(Self {
            params,
            n_samples_seen: x.nrows(),
        })
    }

    /// Standardize `x` using the fitted parameters
    pub fn transform(&self, x: &Array2<f64>, feature_names: &[String]) -> Result<Array2<f64>> {
        let expected = self.feature_names();
        if expected.as_slice() != feature_names {
            return Err(FlightDelayError::SchemaMismatch {
                expected,
                actual: feature_names.to_vec(),
            });
        }
        if x.ncols() != self.params.len() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut scaled = x.clone();
        for (mut column, params) in scaled.axis_iter_mut(Axis(1)).zip(&self.params) {
            column.mapv_inplace(|v| (v - params.mean) / params.scale);
        }
        Ok(scaled)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.feature.clone()).collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Save the scaler, returning the SHA-256 fingerprint of the written bytes
    pub fn save(&self, path: &Path) -> Result<String> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(fingerprint(&bytes))
    }

    /// Load a scaler together with the fingerprint of its file
    pub fn load(path: &Path) -> Result<(Self, String)> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FlightDelayError::ArtifactNotFound(path.to_path_buf()),
            _ => FlightDelayError::IoError(e),
        })?;
        Ok((Self::from_bytes(&bytes)?, fingerprint(&bytes)))
    }
}

/// Hex SHA-256 of an artifact's bytes
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
