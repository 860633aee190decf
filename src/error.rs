//! Error types for the flight delay pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FlightDelayError>;

/// Main error type for feature preparation, training and serving
#[derive(Error, Debug)]
pub enum FlightDelayError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("File is missing some of the required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No rows left after filtering")]
    EmptyDataset,

    #[error("Invalid departure time block '{0}'")]
    InvalidTimeBlock(String),

    #[error("Feature schema mismatch: expected [{}], got [{}]", .expected.join(", "), .actual.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Invalid model choice '{choice}'. Must be one of: {}", .valid.join(", "))]
    InvalidModelChoice { choice: String, valid: Vec<String> },

    #[error("Invalid feature set '{0}'")]
    InvalidFeatureSet(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Scaler on disk ({found}) does not match the scaler model {model} was trained with ({expected})")]
    ScalerMismatch {
        model: String,
        expected: String,
        found: String,
    },

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl FlightDelayError {
    /// Whether the error was caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FlightDelayError::MissingColumns(_)
                | FlightDelayError::EmptyDataset
                | FlightDelayError::InvalidTimeBlock(_)
                | FlightDelayError::SchemaMismatch { .. }
                | FlightDelayError::ScalerMismatch { .. }
                | FlightDelayError::InvalidModelChoice { .. }
                | FlightDelayError::InvalidFeatureSet(_)
                | FlightDelayError::FeatureNotFound(_)
        )
    }
}

impl From<polars::error::PolarsError> for FlightDelayError {
    fn from(err: polars::error::PolarsError) -> Self {
        FlightDelayError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FlightDelayError {
    fn from(err: serde_json::Error) -> Self {
        FlightDelayError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FlightDelayError {
    fn from(err: ndarray::ShapeError) -> Self {
        FlightDelayError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
