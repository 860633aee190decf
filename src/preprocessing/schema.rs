//! Raw record schema and the named feature sets each classifier is trained on

use crate::error::{FlightDelayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MONTH: &str = "MONTH";
pub const DAY_OF_WEEK: &str = "DAY_OF_WEEK";
pub const DEP_DEL15: &str = "DEP_DEL15";
pub const DEP_TIME_BLK: &str = "DEP_TIME_BLK";
pub const DISTANCE_GROUP: &str = "DISTANCE_GROUP";
pub const SEGMENT_NUMBER: &str = "SEGMENT_NUMBER";
pub const CONCURRENT_FLIGHTS: &str = "CONCURRENT_FLIGHTS";
pub const NUMBER_OF_SEATS: &str = "NUMBER_OF_SEATS";
pub const CARRIER_NAME: &str = "CARRIER_NAME";
pub const AIRPORT_FLIGHTS_MONTH: &str = "AIRPORT_FLIGHTS_MONTH";
pub const AIRLINE_FLIGHTS_MONTH: &str = "AIRLINE_FLIGHTS_MONTH";
pub const AIRLINE_AIRPORT_FLIGHTS_MONTH: &str = "AIRLINE_AIRPORT_FLIGHTS_MONTH";
pub const AVG_MONTHLY_PASS_AIRPORT: &str = "AVG_MONTHLY_PASS_AIRPORT";
pub const AVG_MONTHLY_PASS_AIRLINE: &str = "AVG_MONTHLY_PASS_AIRLINE";
pub const FLT_ATTENDANTS_PER_PASS: &str = "FLT_ATTENDANTS_PER_PASS";
pub const GROUND_SERV_PER_PASS: &str = "GROUND_SERV_PER_PASS";
pub const PLANE_AGE: &str = "PLANE_AGE";
pub const DEPARTING_AIRPORT: &str = "DEPARTING_AIRPORT";
pub const PREVIOUS_AIRPORT: &str = "PREVIOUS_AIRPORT";
pub const PRCP: &str = "PRCP";
pub const SNOW: &str = "SNOW";
pub const SNWD: &str = "SNWD";
pub const TMAX: &str = "TMAX";
pub const AWND: &str = "AWND";

/// Derived ordinal time-of-day bucket
pub const PART_OF_DAY: &str = "PART_OF_DAY";

/// Column appended to prediction output
pub const PREDICTED_DEP_DEL15: &str = "PREDICTED_DEP_DEL15";

/// Target column
pub const TARGET: &str = DEP_DEL15;

/// Every column a raw flight record must carry, in canonical order
pub const RAW_COLUMNS: [&str; 24] = [
    MONTH,
    DAY_OF_WEEK,
    DEP_DEL15,
    DEP_TIME_BLK,
    DISTANCE_GROUP,
    SEGMENT_NUMBER,
    CONCURRENT_FLIGHTS,
    NUMBER_OF_SEATS,
    CARRIER_NAME,
    AIRPORT_FLIGHTS_MONTH,
    AIRLINE_FLIGHTS_MONTH,
    AIRLINE_AIRPORT_FLIGHTS_MONTH,
    AVG_MONTHLY_PASS_AIRPORT,
    AVG_MONTHLY_PASS_AIRLINE,
    FLT_ATTENDANTS_PER_PASS,
    GROUND_SERV_PER_PASS,
    PLANE_AGE,
    DEPARTING_AIRPORT,
    PREVIOUS_AIRPORT,
    PRCP,
    SNOW,
    SNWD,
    TMAX,
    AWND,
];

/// One entry of a feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    /// Numeric column taken as-is (cast to f64)
    Numeric(&'static str),
    /// Categorical column expanded into one indicator column per category
    OneHot(&'static str),
}

impl FeatureColumn {
    pub fn source(&self) -> &'static str {
        match self {
            FeatureColumn::Numeric(name) | FeatureColumn::OneHot(name) => name,
        }
    }
}

/// Named feature subsets; each classifier is paired with exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    /// Weather plus segment number and part of day
    Baseline,
    /// Operational fields
    FlightStatus,
    /// Weather fields
    Weather,
    /// Operational and weather fields with the previous airport one-hot encoded
    Knn,
}

const BASELINE: &[FeatureColumn] = &[
    FeatureColumn::Numeric(PRCP),
    FeatureColumn::Numeric(AWND),
    FeatureColumn::Numeric(SNOW),
    FeatureColumn::Numeric(SNWD),
    FeatureColumn::Numeric(SEGMENT_NUMBER),
    FeatureColumn::Numeric(PART_OF_DAY),
];

const FLIGHT_STATUS: &[FeatureColumn] = &[
    FeatureColumn::Numeric(PART_OF_DAY),
    FeatureColumn::Numeric(MONTH),
    FeatureColumn::Numeric(CONCURRENT_FLIGHTS),
    FeatureColumn::Numeric(PLANE_AGE),
    FeatureColumn::Numeric(SEGMENT_NUMBER),
    FeatureColumn::Numeric(DISTANCE_GROUP),
    FeatureColumn::Numeric(AIRPORT_FLIGHTS_MONTH),
];

const WEATHER: &[FeatureColumn] = &[
    FeatureColumn::Numeric(PART_OF_DAY),
    FeatureColumn::Numeric(MONTH),
    FeatureColumn::Numeric(AWND),
    FeatureColumn::Numeric(SNOW),
    FeatureColumn::Numeric(PRCP),
    FeatureColumn::Numeric(SNWD),
    FeatureColumn::Numeric(TMAX),
];

const KNN: &[FeatureColumn] = &[
    FeatureColumn::Numeric(PART_OF_DAY),
    FeatureColumn::Numeric(DISTANCE_GROUP),
    FeatureColumn::Numeric(CONCURRENT_FLIGHTS),
    FeatureColumn::OneHot(PREVIOUS_AIRPORT),
    FeatureColumn::Numeric(MONTH),
    FeatureColumn::Numeric(PLANE_AGE),
    FeatureColumn::Numeric(SEGMENT_NUMBER),
    FeatureColumn::Numeric(PRCP),
    FeatureColumn::Numeric(SNOW),
    FeatureColumn::Numeric(AWND),
    FeatureColumn::Numeric(SNWD),
    FeatureColumn::Numeric(TMAX),
    FeatureColumn::Numeric(AIRPORT_FLIGHTS_MONTH),
];

impl FeatureSet {
    pub const ALL: [FeatureSet; 4] = [
        FeatureSet::Baseline,
        FeatureSet::FlightStatus,
        FeatureSet::Weather,
        FeatureSet::Knn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSet::Baseline => "baseline",
            FeatureSet::FlightStatus => "flight_status",
            FeatureSet::Weather => "weather",
            FeatureSet::Knn => "knn",
        }
    }

    /// Ordered feature columns before categorical expansion
    pub fn columns(&self) -> &'static [FeatureColumn] {
        match self {
            FeatureSet::Baseline => BASELINE,
            FeatureSet::FlightStatus => FLIGHT_STATUS,
            FeatureSet::Weather => WEATHER,
            FeatureSet::Knn => KNN,
        }
    }

    /// Categorical columns that need a fitted encoder
    pub fn categorical_columns(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter_map(|c| match c {
                FeatureColumn::OneHot(name) => Some(*name),
                FeatureColumn::Numeric(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureSet {
    type Err = FlightDelayError;

    fn from_str(s: &str) -> Result<Self> {
        FeatureSet::ALL
            .into_iter()
            .find(|fs| fs.as_str() == s)
            .ok_or_else(|| FlightDelayError::InvalidFeatureSet(s.to_string()))
    }
}

/// Raw columns required for a given stage
pub fn required_columns(require_target: bool) -> Vec<&'static str> {
    RAW_COLUMNS
        .iter()
        .copied()
        .filter(|c| require_target || *c != TARGET)
        .collect()
}
