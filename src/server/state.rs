//! Application state management

use crate::inference::{InferenceConfig, PredictionService};

use super::ServerConfig;

/// Application state shared across handlers
///
/// Artifacts are loaded per request, so nothing here is mutable.
pub struct AppState {
    pub config: ServerConfig,
    pub service: PredictionService,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let service = PredictionService::new(config.store.clone()).with_config(
            InferenceConfig::new().with_default_sample_size(config.default_sample_size),
        );
        Self { config, service }
    }
}
