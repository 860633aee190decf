//! Inference module
//!
//! Serves delay predictions from persisted artifacts:
//! - Model and scaler loading with fingerprint checks
//! - Seeded down-sampling of uploaded records
//! - Re-evaluation on the stored held-out tables

mod config;
mod engine;

pub use config::InferenceConfig;
pub use engine::{LoadedModel, PredictionOutput, PredictionService};
