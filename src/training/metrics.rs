//! Classification metrics: accuracy, confusion matrix and per-class report

use crate::error::{FlightDelayError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Precision, recall, F1 and support for one class or one average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class report keyed by label, plus accuracy and averages
///
/// Serializes to the familiar layout:
/// `{"0": {...}, "1": {...}, "accuracy": .., "macro avg": {...}, "weighted avg": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub classes: BTreeMap<String, ClassMetrics>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

/// Evaluation of one model on held-out data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    /// Rows are true labels, columns predicted labels, both in sorted label order
    pub confusion_matrix: Vec<Vec<usize>>,
    pub classification_report: ClassificationReport,
}

impl EvaluationReport {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(FlightDelayError::EmptyDataset);
        }

        let mut labels: Vec<f64> = y_true.iter().chain(y_pred.iter()).copied().collect();
        labels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        labels.dedup();

        let position = |v: f64| labels.iter().position(|&l| l == v).unwrap_or(0);

        let n_labels = labels.len();
        let mut confusion_matrix = vec![vec![0usize; n_labels]; n_labels];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            confusion_matrix[position(t)][position(p)] += 1;
        }

        let total = y_true.len();
        let correct: usize = (0..n_labels).map(|i| confusion_matrix[i][i]).sum();
        let accuracy = correct as f64 / total as f64;

        let mut classes = BTreeMap::new();
        let mut per_class = Vec::with_capacity(n_labels);
        for (i, label) in labels.iter().enumerate() {
            let tp = confusion_matrix[i][i];
            let support: usize = confusion_matrix[i].iter().sum();
            let predicted: usize = confusion_matrix.iter().map(|row| row[i]).sum();

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            let metrics = ClassMetrics {
                precision,
                recall,
                f1_score,
                support,
            };
            classes.insert(format!("{}", label), metrics.clone());
            per_class.push(metrics);
        }

        let macro_avg = average(&per_class, |_| 1.0, total);
        let weighted_avg = average(&per_class, |m| m.support as f64, total);

        Ok(Self {
            accuracy,
            confusion_matrix,
            classification_report: ClassificationReport {
                classes,
                accuracy,
                macro_avg,
                weighted_avg,
            },
        })
    }
}

// zero division reports 0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn average(per_class: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64, support: usize) -> ClassMetrics {
    let total_weight: f64 = per_class.iter().map(&weight).sum();
    let mean = |f: &dyn Fn(&ClassMetrics) -> f64| {
        if total_weight == 0.0 {
            0.0
        } else {
            per_class.iter().map(|m| weight(m) * f(m)).sum::<f64>() / total_weight
        }
    };

    ClassMetrics {
        precision: mean(&|m| m.precision),
        recall: mean(&|m| m.recall),
        f1_score: mean(&|m| m.f1_score),
        support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_report() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let report = EvaluationReport::compute(&y_true, &y_pred).unwrap();

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.confusion_matrix, vec![vec![3, 1], vec![1, 3]]);

        let positive = &report.classification_report.classes["1"];
        assert_eq!(positive.precision, 0.75);
        assert_eq!(positive.recall, 0.75);
        assert_eq!(positive.support, 4);
        assert_eq!(report.classification_report.macro_avg.support, 8);
    }

    #[test]
    fn test_confusion_rows_sum_to_class_counts() {
        let y_true = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let report = EvaluationReport::compute(&y_true, &y_pred).unwrap();
        let row_sums: Vec<usize> = report.confusion_matrix.iter().map(|r| r.iter().sum()).collect();
        assert_eq!(row_sums, vec![5, 2]);
    }

    #[test]
    fn test_weighted_average() {
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0, 0.0];

        let report = EvaluationReport::compute(&y_true, &y_pred).unwrap();
        let cr = &report.classification_report;
        // class 1 is never predicted: precision defined as 0
        assert_eq!(cr.classes["1"].precision, 0.0);
        assert!((cr.macro_avg.recall - 0.5).abs() < 1e-12);
        assert!((cr.weighted_avg.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_report_json_layout() {
        let report = EvaluationReport::compute(&array![0.0, 1.0], &array![0.0, 1.0]).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let cr = &json["classification_report"];

        assert_eq!(cr["accuracy"], 1.0);
        assert_eq!(cr["0"]["f1-score"], 1.0);
        assert_eq!(cr["macro avg"]["support"], 2);
        assert!(cr.get("weighted avg").is_some());

        let back: EvaluationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(EvaluationReport::compute(&array![0.0, 1.0], &array![0.0]).is_err());
    }
}
