//! Decision tree implementation

use crate::error::{FlightDelayError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Mean squared error (regression)
    MSE,
}

/// Targets as seen by the split search
enum Targets<'a> {
    /// Class index per sample
    Classes { labels: Vec<usize>, n_classes: usize },
    Values(&'a Array1<f64>),
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split; all features when unset
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    /// Seed for the per-split feature draw
    pub random_state: Option<u64>,
    n_features: usize,
    is_classification: bool,
    /// Sorted class labels (classification only)
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            is_classification: true,
            classes: Vec::new(),
        }
    }

    /// Create a new regressor tree
    pub fn new_regressor() -> Self {
        Self {
            criterion: Criterion::MSE,
            is_classification: false,
            ..Self::new_classifier()
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(FlightDelayError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(FlightDelayError::TrainingError(format!(
                "Cannot fit a tree on {} samples with {} features",
                n_samples, n_features
            )));
        }

        self.n_features = n_features;

        let targets = if self.is_classification {
            let mut classes: Vec<f64> = y.iter().copied().collect();
            classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            classes.dedup();

            let labels = y
                .iter()
                .map(|v| {
                    classes
                        .binary_search_by(|c| c.partial_cmp(v).unwrap_or(Ordering::Equal))
                        .unwrap_or(0)
                })
                .collect();
            let n_classes = classes.len();
            self.classes = classes;
            Targets::Classes { labels, n_classes }
        } else {
            Targets::Values(y)
        };

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.random_state.unwrap_or(0));
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, &targets, &indices, 0, &mut rng);
        self.root = Some(root);

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        targets: &Targets<'_>,
        indices: &[usize],
        depth: usize,
        rng: &mut Xoshiro256PlusPlus,
    ) -> TreeNode {
        let n_samples = indices.len();
        let impurity = self.impurity(targets, indices);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf.max(1)
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= 1e-12;

        if should_stop {
            return self.leaf(targets, indices);
        }

        let candidates = self.candidate_features(rng);

        let best = candidates
            .par_iter()
            .filter_map(|&feature| self.best_split_on_feature(x, targets, indices, feature, impurity))
            .collect::<Vec<_>>()
            .into_iter()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

        let Some((feature_idx, threshold, _)) = best else {
            return self.leaf(targets, indices);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return self.leaf(targets, indices);
        }

        let left = Box::new(self.build_tree(x, targets, &left_indices, depth + 1, rng));
        let right = Box::new(self.build_tree(x, targets, &right_indices, depth + 1, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn candidate_features(&self, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        match self.max_features {
            Some(k) if k > 0 && k < self.n_features => {
                let mut drawn = sample(rng, self.n_features, k).into_vec();
                drawn.sort_unstable();
                drawn
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Best threshold on one feature by a single sorted scan
    fn best_split_on_feature(
        &self,
        x: &Array2<f64>,
        targets: &Targets<'_>,
        indices: &[usize],
        feature: usize,
        parent_impurity: f64,
    ) -> Option<(usize, f64, f64)> {
        let mut order: Vec<(f64, usize)> = indices.iter().map(|&i| (x[[i, feature]], i)).collect();
        order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let n = order.len();
        let min_leaf = self.min_samples_leaf.max(1);
        let mut best_gain = 0.0f64;
        let mut best_threshold = None;

        let mut consider = |pos: usize, left_impurity: f64, right_impurity: f64| {
            let n_left = (pos + 1) as f64;
            let n_right = (n - pos - 1) as f64;
            let weighted = (n_left * left_impurity + n_right * right_impurity) / n as f64;
            let gain = parent_impurity - weighted;
            if gain > best_gain {
                best_gain = gain;
                best_threshold = Some((order[pos].0 + order[pos + 1].0) / 2.0);
            }
        };

        match targets {
            Targets::Classes { labels, n_classes } => {
                let mut left = vec![0usize; *n_classes];
                let mut right = vec![0usize; *n_classes];
                for &(_, i) in &order {
                    right[labels[i]] += 1;
                }
                for pos in 0..n - 1 {
                    let label = labels[order[pos].1];
                    left[label] += 1;
                    right[label] -= 1;

                    let n_left = pos + 1;
                    if order[pos + 1].0 <= order[pos].0 || n_left < min_leaf || n - n_left < min_leaf {
                        continue;
                    }
                    consider(pos, gini(&left, n_left), gini(&right, n - n_left));
                }
            }
            Targets::Values(y) => {
                let (total_sum, total_sq) = order
                    .iter()
                    .fold((0.0, 0.0), |(s, sq), &(_, i)| (s + y[i], sq + y[i] * y[i]));
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                for pos in 0..n - 1 {
                    let yi = y[order[pos].1];
                    left_sum += yi;
                    left_sq += yi * yi;

                    let n_left = pos + 1;
                    if order[pos + 1].0 <= order[pos].0 || n_left < min_leaf || n - n_left < min_leaf {
                        continue;
                    }
                    consider(
                        pos,
                        variance(n_left, left_sum, left_sq),
                        variance(n - n_left, total_sum - left_sum, total_sq - left_sq),
                    );
                }
            }
        }

        best_threshold.map(|threshold| (feature, threshold, best_gain))
    }

    fn impurity(&self, targets: &Targets<'_>, indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        match targets {
            Targets::Classes { labels, n_classes } => {
                let mut counts = vec![0usize; *n_classes];
                for &i in indices {
                    counts[labels[i]] += 1;
                }
                gini(&counts, indices.len())
            }
            Targets::Values(y) => {
                let (sum, sq) = indices
                    .iter()
                    .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
                variance(indices.len(), sum, sq)
            }
        }
    }

    fn leaf(&self, targets: &Targets<'_>, indices: &[usize]) -> TreeNode {
        let n_samples = indices.len();
        let value = match targets {
            // majority class, lowest label on ties
            Targets::Classes { labels, n_classes } => {
                let mut counts = vec![0usize; *n_classes];
                for &i in indices {
                    counts[labels[i]] += 1;
                }
                let mut best = 0;
                for (class, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = class;
                    }
                }
                self.classes.get(best).copied().unwrap_or(0.0)
            }
            Targets::Values(y) => {
                if n_samples == 0 {
                    0.0
                } else {
                    indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64
                }
            }
        };
        TreeNode::Leaf { value, n_samples }
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(FlightDelayError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(FlightDelayError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.outer_iter().map(|row| predict_row(root, row)).collect())
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }
}

fn predict_row(node: &TreeNode, row: ArrayView1<f64>) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if row[*feature_idx] <= *threshold {
                predict_row(left, row)
            } else {
                predict_row(right, row)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

// Var = E[X²] - E[X]²
fn variance(n: usize, sum: f64, sq_sum: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}
