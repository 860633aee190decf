//! Integration test: feature preparation and scaling on CSV input

mod common;

use flight_delay::preprocessing::{
    schema::{PART_OF_DAY, RAW_COLUMNS, TARGET},
    FeaturePreparer, FeatureSet, StandardScaler,
};
use flight_delay::utils::DataLoader;
use flight_delay::FlightDelayError;
use polars::prelude::*;

fn load(csv: &str) -> DataFrame {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_csv(dir.path(), "raw.csv", csv);
    DataLoader::new().load_csv(&path).unwrap()
}

#[test]
fn test_part_of_day_follows_time_block() {
    let df = load(&common::raw_csv(10));
    let (_, prepared) = FeaturePreparer::new(FeatureSet::Baseline).fit(&df).unwrap();

    let part_of_day: Vec<i64> = prepared
        .frame
        .column(PART_OF_DAY)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(part_of_day, vec![1, 2, 3, 4, 5, 1, 2, 3, 4, 5]);
}

#[test]
fn test_feature_columns_follow_feature_set() {
    let df = load(&common::raw_csv(40));

    let (schema, prepared) = FeaturePreparer::new(FeatureSet::Weather).fit(&df).unwrap();
    assert_eq!(
        schema.feature_names,
        vec!["PART_OF_DAY", "MONTH", "AWND", "SNOW", "PRCP", "SNWD", "TMAX"]
    );
    assert_eq!(prepared.features.ncols(), 7);
    assert_eq!(prepared.target.as_ref().unwrap().len(), 40);

    let (schema, _) = FeaturePreparer::new(FeatureSet::Knn).fit(&df).unwrap();
    // previous airport expands in place, categories sorted
    assert_eq!(&schema.feature_names[..3], &["PART_OF_DAY", "DISTANCE_GROUP", "CONCURRENT_FLIGHTS"]);
    assert_eq!(
        &schema.feature_names[3..7],
        &[
            "PREVIOUS_AIRPORT_Atlanta Municipal",
            "PREVIOUS_AIRPORT_Chicago O'Hare International",
            "PREVIOUS_AIRPORT_Denver International",
            "PREVIOUS_AIRPORT_NONE",
        ]
    );
    assert_eq!(schema.feature_names[7], "MONTH");
    assert_eq!(schema.n_features(), 16);
}

#[test]
fn test_transform_reuses_fitted_schema() {
    let train = load(&common::raw_csv(40));
    let preparer = FeaturePreparer::new(FeatureSet::Knn);
    let (schema, _) = preparer.fit(&train).unwrap();

    // one row sees a single previous airport; the layout must not shrink
    let few = load(&common::raw_csv(1));
    let prepared = preparer.transform(&few, &schema).unwrap();
    assert_eq!(prepared.feature_names, schema.feature_names);
    assert_eq!(prepared.features.ncols(), schema.n_features());
}

#[test]
fn test_target_optional_at_inference() {
    let train = load(&common::raw_csv(20));
    let preparer = FeaturePreparer::new(FeatureSet::FlightStatus);
    let (schema, _) = preparer.fit(&train).unwrap();

    let without_target: Vec<&str> = RAW_COLUMNS.iter().copied().filter(|c| *c != TARGET).collect();
    let unlabeled = load(&common::raw_csv_with(5, &without_target));

    let prepared = preparer.transform(&unlabeled, &schema).unwrap();
    assert_eq!(prepared.n_rows(), 5);
    assert!(prepared.target.is_none());

    // training still needs it
    let err = preparer.fit(&unlabeled).unwrap_err();
    assert!(matches!(err, FlightDelayError::MissingColumns(ref cols) if cols == &vec![TARGET.to_string()]));
}

#[test]
fn test_missing_columns_are_listed() {
    let columns: Vec<&str> = RAW_COLUMNS
        .iter()
        .copied()
        .filter(|c| *c != "PRCP" && *c != "TMAX")
        .collect();
    let df = load(&common::raw_csv_with(5, &columns));

    match FeaturePreparer::new(FeatureSet::Baseline).fit(&df) {
        Err(FlightDelayError::MissingColumns(missing)) => {
            assert_eq!(missing, vec!["PRCP".to_string(), "TMAX".to_string()]);
        }
        other => panic!("expected missing columns, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_null_rows_dropped_and_empty_is_error() {
    let mut csv = common::raw_csv(3);
    // blank PRCP in a fourth row
    let mut row = common::raw_row(3);
    row[19] = String::new();
    csv.push_str(&row.join(","));
    csv.push('\n');

    let df = load(&csv);
    let (_, prepared) = FeaturePreparer::new(FeatureSet::Weather).fit(&df).unwrap();
    assert_eq!(prepared.n_rows(), 3);

    let header_only = load(&common::raw_csv(0));
    assert!(matches!(
        FeaturePreparer::new(FeatureSet::Weather).fit(&header_only),
        Err(FlightDelayError::EmptyDataset) | Err(FlightDelayError::DataError(_))
    ));
}

#[test]
fn test_duplicates_dropped_when_enabled() {
    let mut csv = common::raw_csv(4);
    csv.push_str(&common::raw_row(0).join(","));
    csv.push('\n');
    let df = load(&csv);

    let (_, deduped) = FeaturePreparer::new(FeatureSet::Baseline).fit(&df).unwrap();
    assert_eq!(deduped.n_rows(), 4);

    let (_, kept) = FeaturePreparer::new(FeatureSet::Baseline)
        .with_drop_duplicates(false)
        .fit(&df)
        .unwrap();
    assert_eq!(kept.n_rows(), 5);
}

#[test]
fn test_bad_time_block_is_rejected() {
    let mut csv = common::raw_csv(2);
    let mut row = common::raw_row(2);
    row[3] = "late-evening".to_string();
    csv.push_str(&row.join(","));
    csv.push('\n');

    let df = load(&csv);
    assert!(matches!(
        FeaturePreparer::new(FeatureSet::Baseline).fit(&df),
        Err(FlightDelayError::InvalidTimeBlock(_))
    ));
}

#[test]
fn test_scaler_is_stable_across_calls() {
    let df = load(&common::raw_csv(50));
    let (schema, prepared) = FeaturePreparer::new(FeatureSet::FlightStatus).fit(&df).unwrap();
    let scaler = StandardScaler::fit(&prepared.features, &schema.feature_names).unwrap();

    let first = scaler.transform(&prepared.features, &schema.feature_names).unwrap();
    let second = scaler.transform(&prepared.features, &schema.feature_names).unwrap();
    assert_eq!(first, second);

    let mut reordered = schema.feature_names.clone();
    reordered.swap(0, 1);
    assert!(matches!(
        scaler.transform(&prepared.features, &reordered),
        Err(FlightDelayError::SchemaMismatch { .. })
    ));
}
