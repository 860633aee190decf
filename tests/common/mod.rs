//! Shared fixtures for the integration tests

#![allow(dead_code)]

use flight_delay::preprocessing::{schema::RAW_COLUMNS, PreprocessingConfig};
use flight_delay::store::ArtifactStore;
use flight_delay::training::{Trainer, TrainingConfig};
use std::path::{Path, PathBuf};

const TIME_BLOCKS: [&str; 5] = ["0001-0559", "0900-0959", "1300-1359", "1800-1859", "2100-2159"];
const CARRIERS: [&str; 3] = ["Delta Air Lines Inc.", "Southwest Airlines Co.", "American Airlines Inc."];
const AIRPORTS: [&str; 4] = ["Atlanta Municipal", "Denver International", "NONE", "Chicago O'Hare International"];

/// One synthetic raw record; delays follow the departure block so every
/// feature set carries signal through `PART_OF_DAY`
pub fn raw_row(i: usize) -> Vec<String> {
    let block = i % TIME_BLOCKS.len();
    let delayed = usize::from(block >= 3);
    vec![
        (1 + i % 12).to_string(),                  // MONTH
        (1 + i % 7).to_string(),                   // DAY_OF_WEEK
        delayed.to_string(),                       // DEP_DEL15
        TIME_BLOCKS[block].to_string(),            // DEP_TIME_BLK
        (1 + i % 10).to_string(),                  // DISTANCE_GROUP
        (1 + i % 4).to_string(),                   // SEGMENT_NUMBER
        (5 + i % 40).to_string(),                  // CONCURRENT_FLIGHTS
        (50 + i % 150).to_string(),                // NUMBER_OF_SEATS
        CARRIERS[i % CARRIERS.len()].to_string(),  // CARRIER_NAME
        (10_000 + i).to_string(),                  // AIRPORT_FLIGHTS_MONTH
        (50_000 + i % 300).to_string(),            // AIRLINE_FLIGHTS_MONTH
        (2_000 + i % 90).to_string(),              // AIRLINE_AIRPORT_FLIGHTS_MONTH
        (1_000_000 + i % 500).to_string(),         // AVG_MONTHLY_PASS_AIRPORT
        (8_000_000 + i % 700).to_string(),         // AVG_MONTHLY_PASS_AIRLINE
        format!("{:.6}", 0.0001 + (i % 13) as f64 * 0.00001), // FLT_ATTENDANTS_PER_PASS
        format!("{:.6}", 0.0002 + (i % 17) as f64 * 0.00001), // GROUND_SERV_PER_PASS
        (i % 30).to_string(),                      // PLANE_AGE
        AIRPORTS[(i + 1) % AIRPORTS.len()].to_string(), // DEPARTING_AIRPORT
        AIRPORTS[i % AIRPORTS.len()].to_string(),  // PREVIOUS_AIRPORT
        format!("{:.2}", (i % 9) as f64 * 0.1),    // PRCP
        format!("{:.2}", (i % 5) as f64 * 0.2),    // SNOW
        format!("{:.2}", (i % 3) as f64 * 0.5),    // SNWD
        format!("{:.1}", 40.0 + (i % 50) as f64),  // TMAX
        format!("{:.2}", 2.0 + (i % 11) as f64 * 0.7), // AWND
    ]
}

fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV text with a header and `n` unique, null-free rows
pub fn raw_csv(n: usize) -> String {
    raw_csv_with(n, &RAW_COLUMNS)
}

/// CSV text restricted to `columns`, in the given order
pub fn raw_csv_with(n: usize, columns: &[&str]) -> String {
    let positions: Vec<usize> = columns
        .iter()
        .map(|c| RAW_COLUMNS.iter().position(|r| r == c).expect("unknown column"))
        .collect();

    let mut out = columns.join(",");
    out.push('\n');
    for i in 0..n {
        let row = raw_row(i);
        let fields: Vec<String> = positions.iter().map(|&p| quote(&row[p])).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Fast training settings for tests
pub fn quick_training() -> TrainingConfig {
    TrainingConfig::new()
        .with_n_estimators(10)
        .with_boosting_rounds(40)
        .with_n_neighbors(3)
}

/// Preprocess and train every model on `n` synthetic rows under `root`
pub fn trained_store(root: &Path, n: usize) -> ArtifactStore {
    let store = ArtifactStore::under(root);
    let raw = write_csv(root, "raw.csv", &raw_csv(n));

    let trainer = Trainer::new(store.clone())
        .with_preprocessing(PreprocessingConfig::new())
        .with_training(quick_training());
    trainer.preprocess_file(&raw).unwrap();
    trainer.train().unwrap();
    store
}
