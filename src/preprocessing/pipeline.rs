//! Feature preparation: raw flight records to a fixed model feature matrix

use super::{
    encoder::OneHotEncoder,
    part_of_day::PartOfDay,
    schema::{self, FeatureColumn, FeatureSet, DEP_TIME_BLK, PART_OF_DAY, RAW_COLUMNS, TARGET},
};
use crate::error::{FlightDelayError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// The exact feature layout a scaler and model were fitted on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub feature_set: FeatureSet,
    /// Ordered names after categorical expansion
    pub feature_names: Vec<String>,
    pub encoder: OneHotEncoder,
}

impl FeatureSchema {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Output of the preparer
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Cleaned table including the derived `PART_OF_DAY` column
    pub frame: DataFrame,
    pub features: Array2<f64>,
    /// Present when the input carried `DEP_DEL15`
    pub target: Option<Array1<f64>>,
    pub feature_names: Vec<String>,
}

impl PreparedData {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }
}

/// Turns raw record tables into feature matrices for one feature set
#[derive(Debug, Clone)]
pub struct FeaturePreparer {
    feature_set: FeatureSet,
    drop_duplicates: bool,
}

impl FeaturePreparer {
    pub fn new(feature_set: FeatureSet) -> Self {
        Self {
            feature_set,
            drop_duplicates: true,
        }
    }

    pub fn with_drop_duplicates(mut self, drop_duplicates: bool) -> Self {
        self.drop_duplicates = drop_duplicates;
        self
    }

    pub fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    /// Prepare training data: the target is required and the categorical
    /// encoder is fitted on this data
    pub fn fit(&self, df: &DataFrame) -> Result<(FeatureSchema, PreparedData)> {
        let start = Instant::now();
        let frame = self.clean(df, true)?;

        let mut encoder = OneHotEncoder::new();
        let categorical = self.feature_set.categorical_columns();
        if !categorical.is_empty() {
            encoder.fit(&frame, &categorical)?;
        }

        let (feature_names, features) = build_matrix(&frame, self.feature_set, &encoder)?;
        let target = extract_target(&frame)?;

        let schema = FeatureSchema {
            feature_set: self.feature_set,
            feature_names: feature_names.clone(),
            encoder,
        };

        info!(
            feature_set = %self.feature_set,
            rows = frame.height(),
            features = feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prepared training features"
        );

        Ok((
            schema,
            PreparedData {
                frame,
                features,
                target,
                feature_names,
            },
        ))
    }

    /// Prepare data against a previously fitted schema. The target is used
    /// when present but not required
    pub fn transform(&self, df: &DataFrame, schema: &FeatureSchema) -> Result<PreparedData> {
        if schema.feature_set != self.feature_set {
            return Err(FlightDelayError::InvalidFeatureSet(format!(
                "schema was fitted for '{}', preparer is '{}'",
                schema.feature_set, self.feature_set
            )));
        }

        let frame = self.clean(df, false)?;
        let (feature_names, features) = build_matrix(&frame, self.feature_set, &schema.encoder)?;
        if feature_names != schema.feature_names {
            return Err(FlightDelayError::SchemaMismatch {
                expected: schema.feature_names.clone(),
                actual: feature_names,
            });
        }
        let target = extract_target(&frame)?;

        debug!(feature_set = %self.feature_set, rows = frame.height(), "Prepared features");

        Ok(PreparedData {
            frame,
            features,
            target,
            feature_names,
        })
    }

    /// Validate, restrict, drop nulls and duplicates, then derive `PART_OF_DAY`
    pub fn clean(&self, df: &DataFrame, require_target: bool) -> Result<DataFrame> {
        let present: HashSet<&str> = df.get_column_names().into_iter().map(|c| c.as_str()).collect();

        let missing: Vec<String> = schema::required_columns(require_target)
            .into_iter()
            .filter(|c| !present.contains(c))
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(FlightDelayError::MissingColumns(missing));
        }

        // keep raw order; the target rides along when supplied
        let selected: Vec<&str> = RAW_COLUMNS
            .iter()
            .copied()
            .filter(|c| present.contains(c))
            .collect();
        let frame = df.select(selected)?;
        let input_rows = frame.height();

        let frame = drop_null_rows(&frame)?;
        let frame = if self.drop_duplicates {
            drop_duplicate_rows(&frame)?
        } else {
            frame
        };

        if frame.height() == 0 {
            return Err(FlightDelayError::EmptyDataset);
        }

        let frame = with_part_of_day(frame)?;

        debug!(
            input_rows,
            kept_rows = frame.height(),
            "Cleaned raw records"
        );
        Ok(frame)
    }
}

/// Rows with a null in any column are removed
fn drop_null_rows(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.drop_nulls::<String>(None)?)
}

/// Exact duplicates are removed, keeping the first occurrence in input order
fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

fn string_column(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

fn with_part_of_day(mut frame: DataFrame) -> Result<DataFrame> {
    let blocks = string_column(frame.column(DEP_TIME_BLK)?.as_materialized_series())?;
    let ordinals = blocks
        .iter()
        .map(|block| {
            let block = block.as_deref().unwrap_or("");
            PartOfDay::from_time_block(block).map(|p| p.ordinal())
        })
        .collect::<Result<Vec<i64>>>()?;

    frame.with_column(Series::new(PART_OF_DAY.into(), ordinals))?;
    Ok(frame)
}

/// Numeric values of a column; anything that cannot be read as a number is an error
fn numeric_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = frame
        .column(name)
        .map_err(|_| FlightDelayError::FeatureNotFound(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    series
        .f64()?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                FlightDelayError::DataError(format!("Column {} contains non-numeric values", name))
            })
        })
        .collect()
}

fn build_matrix(
    frame: &DataFrame,
    feature_set: FeatureSet,
    encoder: &OneHotEncoder,
) -> Result<(Vec<String>, Array2<f64>)> {
    let mut names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for column in feature_set.columns() {
        match column {
            FeatureColumn::Numeric(name) => {
                columns.push(numeric_values(frame, name)?);
                names.push(name.to_string());
            }
            FeatureColumn::OneHot(name) => {
                for (expanded, values) in encoder.transform_column(frame, name)? {
                    names.push(expanded);
                    columns.push(values);
                }
            }
        }
    }

    let n_rows = frame.height();
    let matrix = Array2::from_shape_fn((n_rows, columns.len()), |(i, j)| columns[j][i]);
    Ok((names, matrix))
}

fn extract_target(frame: &DataFrame) -> Result<Option<Array1<f64>>> {
    if frame.column(TARGET).is_err() {
        return Ok(None);
    }
    Ok(Some(Array1::from(numeric_values(frame, TARGET)?)))
}
