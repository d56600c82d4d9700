//! Classification metrics
//!
//! Confusion-matrix based precision, recall, and F1 with support-weighted
//! averaging, matching the convention that an undefined ratio (zero
//! denominator) scores 0 rather than erroring.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confusion matrix; element `[i][j]` counts samples with true label `i`
/// predicted as `j`
#[derive(Clone, Debug)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

impl ConfusionMatrix {
    /// Build from parallel prediction / ground-truth slices
    pub fn from_predictions(y_pred: &[usize], y_true: &[usize]) -> Self {
        assert_eq!(
            y_pred.len(),
            y_true.len(),
            "predictions and targets must have same length"
        );
        let n_classes = y_pred
            .iter()
            .chain(y_true.iter())
            .max()
            .map_or(0, |&m| m + 1);
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&pred, &truth) in y_pred.iter().zip(y_true) {
            matrix[truth][pred] += 1;
        }
        Self { matrix, n_classes }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Count of samples whose true label is `class`
    pub fn support(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    fn true_positives(&self, class: usize) -> usize {
        self.matrix[class][class]
    }

    fn false_positives(&self, class: usize) -> usize {
        (0..self.n_classes)
            .filter(|&i| i != class)
            .map(|i| self.matrix[i][class])
            .sum()
    }

    fn false_negatives(&self, class: usize) -> usize {
        (0..self.n_classes)
            .filter(|&j| j != class)
            .map(|j| self.matrix[class][j])
            .sum()
    }
}

/// Weighted-average precision, recall, and F1 for one target column
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl TargetMetrics {
    /// Compute support-weighted metrics from predictions
    pub fn from_predictions(y_pred: &[usize], y_true: &[usize]) -> Self {
        let cm = ConfusionMatrix::from_predictions(y_pred, y_true);
        let total: usize = (0..cm.n_classes()).map(|c| cm.support(c)).sum();
        if total == 0 {
            return Self::default();
        }

        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for class in 0..cm.n_classes() {
            let support = cm.support(class) as f64;
            if support == 0.0 {
                continue;
            }
            let tp = cm.true_positives(class) as f64;
            let fp = cm.false_positives(class) as f64;
            let fn_ = cm.false_negatives(class) as f64;

            let p = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
            let r = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
            let f = if p + r > 0.0 {
                2.0 * p * r / (p + r)
            } else {
                0.0
            };

            let weight = support / total as f64;
            precision += weight * p;
            recall += weight * r;
            f1 += weight * f;
        }
        Self {
            f1,
            precision,
            recall,
        }
    }
}

/// Classification accuracy
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_pred
        .iter()
        .zip(y_true)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Per-target metrics for one training run, plus the derived average F1
/// that drives promotion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub per_target: BTreeMap<String, TargetMetrics>,
}

impl MetricsRecord {
    /// Unweighted mean F1 across target columns; empty record scores 0
    pub fn average_f1(&self) -> f64 {
        if self.per_target.is_empty() {
            return 0.0;
        }
        self.per_target.values().map(|m| m.f1).sum::<f64>() / self.per_target.len() as f64
    }
}

/// The persisted best-model baseline: average F1 plus the per-target detail
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BestModelMetrics {
    pub avg_f1_score: f64,
    pub metrics_per_target: BTreeMap<String, TargetMetrics>,
}
