//! Data preprocessing module
//!
//! Turns raw flight/weather records into model-ready features:
//! - Required column validation and null/duplicate removal
//! - `PART_OF_DAY` derivation from the departure time block
//! - One-hot encoding of the previous airport
//! - Standard scaling persisted per feature set

mod config;
mod encoder;
pub mod part_of_day;
mod pipeline;
mod scaler;
pub mod schema;

pub use config::PreprocessingConfig;
pub use encoder::OneHotEncoder;
pub use part_of_day::PartOfDay;
pub use pipeline::{FeaturePreparer, FeatureSchema, PreparedData};
pub use scaler::{fingerprint, ScalerParams, StandardScaler};
pub use schema::{FeatureColumn, FeatureSet};
