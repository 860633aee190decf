//! Categorical one-hot encoding

use crate::error::{FlightDelayError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One-hot encoder over string categories.
///
/// Categories are learned once at fit time and kept sorted, so the expanded
/// column order is stable across processes. Values not seen during fit
/// encode to all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // column name -> sorted categories
    categories: BTreeMap<String, Vec<String>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the category vocabulary of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let values = string_values(df, col_name)?;
            let vocabulary: BTreeSet<String> = values.into_iter().flatten().collect();
            self.categories
                .insert(col_name.to_string(), vocabulary.into_iter().collect());
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories.get(column).map(|c| c.as_slice())
    }

    /// Names of the indicator columns produced for `column`
    pub fn feature_names(&self, column: &str) -> Result<Vec<String>> {
        let categories = self
            .categories
            .get(column)
            .ok_or_else(|| FlightDelayError::FeatureNotFound(column.to_string()))?;
        Ok(categories
            .iter()
            .map(|category| format!("{}_{}", column, category))
            .collect())
    }

    /// Expand `column` into indicator vectors, one per learned category
    pub fn transform_column(&self, df: &DataFrame, column: &str) -> Result<Vec<(String, Vec<f64>)>> {
        if !self.is_fitted {
            return Err(FlightDelayError::ModelNotFitted);
        }

        let categories = self
            .categories
            .get(column)
            .ok_or_else(|| FlightDelayError::FeatureNotFound(column.to_string()))?;
        let values = string_values(df, column)?;

        let index: BTreeMap<&str, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut encoded = vec![vec![0.0; values.len()]; categories.len()];
        for (row, value) in values.iter().enumerate() {
            if let Some(&slot) = value.as_deref().and_then(|v| index.get(v)) {
                encoded[slot][row] = 1.0;
            }
        }

        Ok(self
            .feature_names(column)?
            .into_iter()
            .zip(encoded)
            .collect())
    }
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .map_err(|_| FlightDelayError::FeatureNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
}
