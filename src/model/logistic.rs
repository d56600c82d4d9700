//! Multinomial logistic regression
//!
//! Softmax regression trained with full-batch gradient descent and L2
//! weight decay. Deliberately simple: the feature block is already
//! standardized by the preprocessor, so plain gradient descent with a
//! modest learning rate converges quickly.

use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Training hyperparameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 300,
            l2: 1e-4,
        }
    }
}

/// Fitted softmax classifier
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// `(n_features, n_classes)` weight matrix
    weights: Array2<f64>,
    bias: Array1<f64>,
    n_classes: usize,
}

fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
}

impl LogisticRegression {
    /// Fit with full-batch gradient descent on the cross-entropy loss
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        params: &LogisticParams,
    ) -> Result<Self> {
        let context = "logistic regression fit";
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::data(
                context,
                format!("{} rows of features for {} labels", x.nrows(), y.len()),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(Error::data(
                context,
                format!("label {bad} out of range for {n_classes} classes"),
            ));
        }

        let n = x.nrows() as f64;
        let d = x.ncols();
        let mut onehot = Array2::<f64>::zeros((x.nrows(), n_classes));
        for (i, &label) in y.iter().enumerate() {
            onehot[(i, label)] = 1.0;
        }

        let mut weights = Array2::<f64>::zeros((d, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);
        for _ in 0..params.epochs {
            let mut probs = x.dot(&weights) + &bias;
            softmax_rows(&mut probs);
            let diff = probs - &onehot;
            let mut grad_w = x.t().dot(&diff) / n;
            grad_w.scaled_add(params.l2, &weights);
            let grad_b = diff.sum_axis(Axis(0)) / n;
            weights.scaled_add(-params.learning_rate, &grad_w);
            bias.scaled_add(-params.learning_rate, &grad_b);
        }

        Ok(Self {
            weights,
            bias,
            n_classes,
        })
    }

    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut scores = x.dot(&self.weights) + &self.bias;
        softmax_rows(&mut scores);
        scores
    }

    /// Most probable class per row
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        let scores = x.dot(&self.weights) + &self.bias;
        scores
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}
