//! Data loading utilities

use crate::error::{FlightDelayError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// CSV loader
pub struct DataLoader {
    /// Rows scanned for type inference; `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let start = Instant::now();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FlightDelayError::ArtifactNotFound(path.to_path_buf()),
            _ => FlightDelayError::IoError(e),
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );
        Ok(df)
    }
}

/// Save DataFrames
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header row
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        Ok(())
    }
}

/// Down-sample to at most `n` rows with a seeded shuffle; smaller frames are returned unchanged
pub fn sample_rows(df: &DataFrame, n: usize, seed: u64) -> Result<DataFrame> {
    if df.height() <= n {
        return Ok(df.clone());
    }

    let mut indices: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices.truncate(n);

    let idx = IdxCa::from_vec("idx".into(), indices);
    Ok(df.take(&idx)?)
}

/// Build a frame from a feature matrix, optionally appending a target column
pub fn matrix_to_frame(
    feature_names: &[String],
    x: &Array2<f64>,
    target: Option<(&str, &Array1<f64>)>,
) -> Result<DataFrame> {
    if feature_names.len() != x.ncols() {
        return Err(FlightDelayError::ShapeError {
            expected: format!("{} columns", feature_names.len()),
            actual: format!("{} columns", x.ncols()),
        });
    }

    let mut columns: Vec<Column> = feature_names
        .iter()
        .zip(x.columns())
        .map(|(name, values)| Column::new(name.as_str().into(), values.to_vec()))
        .collect();

    if let Some((name, y)) = target {
        columns.push(Column::new(name.into(), y.to_vec()));
    }

    Ok(DataFrame::new(columns)?)
}

/// Stack the named columns, cast to f64, into a row-major matrix
pub fn frame_to_matrix(df: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let mut x = Array2::zeros((df.height(), names.len()));
    for (j, name) in names.iter().enumerate() {
        let series = df
            .column(name)
            .map_err(|_| FlightDelayError::FeatureNotFound(name.clone()))?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        for (i, value) in series.f64()?.into_iter().enumerate() {
            x[[i, j]] = value.ok_or_else(|| {
                FlightDelayError::DataError(format!("Column {} has a null at row {}", name, i))
            })?;
        }
    }
    Ok(x)
}

fn any_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::from(v),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => Value::from(v as f64),
        AnyValue::Float64(v) => Value::from(v),
        AnyValue::String(v) => Value::from(v),
        AnyValue::StringOwned(v) => Value::from(v.as_str()),
        other => Value::from(other.to_string()),
    }
}

/// One JSON object per row, keyed by column name
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<Map<String, Value>>> {
    let columns = df.get_columns();
    let mut records = Vec::with_capacity(df.height());

    for row in 0..df.height() {
        let mut record = Map::with_capacity(columns.len());
        for column in columns {
            record.insert(column.name().to_string(), any_to_json(column.get(row)?));
        }
        records.push(record);
    }

    Ok(records)
}
