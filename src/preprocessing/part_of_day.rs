//! Part-of-day bucketing of departure time blocks
//!
//! A time block looks like `0600-0659`. Only the start (`HHMM`, 24h clock)
//! decides the bucket:
//!
//! | start        | bucket                     | ordinal |
//! |--------------|----------------------------|---------|
//! | 0000 - 0559  | Early Morning & Late Night | 1       |
//! | 0600 - 1159  | Morning                    | 2       |
//! | 1200 - 1659  | Afternoon                  | 3       |
//! | 1700 - 1959  | Evening                    | 4       |
//! | 2000 - 2359  | Night                      | 5       |

use crate::error::{FlightDelayError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfDay {
    EarlyMorningLateNight,
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// Upper bounds (exclusive) of each bucket, in `HHMM`
const BOUNDARIES: [(u32, PartOfDay); 5] = [
    (600, PartOfDay::EarlyMorningLateNight),
    (1200, PartOfDay::Morning),
    (1700, PartOfDay::Afternoon),
    (2000, PartOfDay::Evening),
    (2400, PartOfDay::Night),
];

impl PartOfDay {
    /// Bucket for a `HHMM` clock value; the minute digits are never checked
    pub fn from_hhmm(hhmm: u32) -> Option<Self> {
        BOUNDARIES
            .iter()
            .find(|(upper, _)| hhmm < *upper)
            .map(|(_, bucket)| *bucket)
    }

    /// Bucket for a `HHMM-HHMM` departure time block
    pub fn from_time_block(block: &str) -> Result<Self> {
        let start = block.split('-').next().unwrap_or("").trim();
        if start.is_empty() || !start.chars().all(|c| c.is_ascii_digit()) {
            return Err(FlightDelayError::InvalidTimeBlock(block.to_string()));
        }
        start
            .parse::<u32>()
            .ok()
            .and_then(Self::from_hhmm)
            .ok_or_else(|| FlightDelayError::InvalidTimeBlock(block.to_string()))
    }

    /// Ordinal code used as a model feature (1..=5)
    pub fn ordinal(&self) -> i64 {
        match self {
            PartOfDay::EarlyMorningLateNight => 1,
            PartOfDay::Morning => 2,
            PartOfDay::Afternoon => 3,
            PartOfDay::Evening => 4,
            PartOfDay::Night => 5,
        }
    }
}
