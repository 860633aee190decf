//! K-Nearest Neighbors classifier

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{FlightDelayError, Result};

/// KNN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNNConfig {
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
            classes: Vec::new(),
        }
    }

    /// Fit the classifier (stores training data)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(FlightDelayError::EmptyDataset);
        }
        if self.config.n_neighbors == 0 {
            return Err(FlightDelayError::TrainingError(
                "n_neighbors must be at least 1".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn training_data(&self, x: &Array2<f64>) -> Result<(&Array2<f64>, &Array1<f64>)> {
        let (Some(x_train), Some(y_train)) = (self.x_train.as_ref(), self.y_train.as_ref()) else {
            return Err(FlightDelayError::ModelNotFitted);
        };
        if x.ncols() != x_train.ncols() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("{} features", x_train.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x_train, y_train))
    }

    /// Predict class labels (parallelized over test samples)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;

        Ok(proba
            .outer_iter()
            .map(|row| {
                // lowest label wins a tied vote
                let mut best = 0;
                for (class_idx, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = class_idx;
                    }
                }
                self.classes.get(best).copied().unwrap_or(0.0)
            })
            .collect())
    }

    /// Predict class probabilities, columns ordered as `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (x_train, y_train) = self.training_data(x)?;
        let n_classes = self.classes.len();
        let k = self.config.n_neighbors;

        let probs: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k);
                class_probs_from(&neighbors, &self.classes)
            })
            .collect();

        let flat: Vec<f64> = probs.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}

/// Max-heap entry for partial sort (keeps k smallest distances); ties are
/// broken by training row so results do not depend on iteration order
#[derive(PartialEq)]
struct Neighbor {
    dist: f64,
    row: usize,
    label: f64,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then(self.row.cmp(&other.row))
    }
}

/// Find k nearest neighbors using a max-heap, O(n log k)
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<f64> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (row, train_row) in x_train.outer_iter().enumerate() {
        let candidate = Neighbor {
            dist: euclidean(point, train_row),
            row,
            label: y_train[row],
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().map_or(false, |top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_iter().map(|n| n.label).collect()
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Uniform vote shares over `classes`
fn class_probs_from(labels: &[f64], classes: &[f64]) -> Vec<f64> {
    let mut counts = vec![0.0; classes.len()];
    let mut total = 0.0;
    for &label in labels {
        if let Some(class_idx) = classes.iter().position(|&c| c == label) {
            counts[class_idx] += 1.0;
            total += 1.0;
        }
    }
    if total > 0.0 {
        counts.iter_mut().for_each(|c| *c /= total);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_classification_data() -> (Array2<f64>, Array1<f64>) {
        // two well separated clusters
        let x = array![
            [0.0, 0.0],
            [0.5, 0.2],
            [0.1, 0.6],
            [0.4, 0.4],
            [5.0, 5.0],
            [5.5, 5.2],
            [5.1, 5.6],
            [5.4, 5.4],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_knn_classifier() {
        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::new(KNNConfig { n_neighbors: 3 });
        knn.fit(&x, &y).unwrap();

        let test = array![[0.2, 0.1], [5.2, 5.3]];
        let predictions = knn.predict(&test).unwrap();
        assert_eq!(predictions, array![0.0, 1.0]);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::new(KNNConfig { n_neighbors: 5 });
        knn.fit(&x, &y).unwrap();

        let proba = knn.predict_proba(&array![[2.5, 2.5], [0.0, 0.1]]).unwrap();
        for row in proba.outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!(proba[[1, 0]] > 0.5);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::new(KNNConfig { n_neighbors: 50 });
        knn.fit(&x, &y).unwrap();
        // four votes each; tie resolves to the lowest label
        assert_eq!(knn.predict(&array![[0.0, 0.0]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(euclidean(a.view(), b.view()), 5.0);
    }

    #[test]
    fn test_unfitted_and_wrong_width() {
        let knn = KNNClassifier::new(KNNConfig { n_neighbors: 3 });
        assert!(matches!(
            knn.predict(&array![[0.0, 0.0]]),
            Err(FlightDelayError::ModelNotFitted)
        ));

        let (x, y) = create_classification_data();
        let mut knn = KNNClassifier::new(KNNConfig { n_neighbors: 3 });
        knn.fit(&x, &y).unwrap();
        assert!(knn.predict(&array![[0.0]]).is_err());
    }
}
