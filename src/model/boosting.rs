//! Gradient-boosted trees
//!
//! Softmax gradient boosting: each round fits one regression tree per
//! class to the negative gradient of the cross-entropy loss (one-hot
//! minus predicted probability) and adds its shrunken output to the
//! class score. The binary case runs the same machinery with two score
//! columns, so `objective` and `eval_metric` are carried as metadata
//! rather than switching code paths.

use crate::model::tree::{RegressionTree, TreeParams};
use crate::{Error, Result};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Boosting hyperparameters plus the objective metadata injected for
/// multiclass targets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub objective: String,
    pub eval_metric: String,
    pub num_class: Option<usize>,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 0.1,
            max_depth: 3,
            objective: "binary:logistic".to_string(),
            eval_metric: "logloss".to_string(),
            num_class: None,
        }
    }
}

/// Fitted boosted ensemble; `trees[round][class]`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradientBoosting {
    trees: Vec<Vec<RegressionTree>>,
    n_classes: usize,
    learning_rate: f64,
    objective: String,
    eval_metric: String,
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

impl GradientBoosting {
    /// Fit `n_estimators` boosting rounds
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        params: &BoostingParams,
    ) -> Result<Self> {
        let context = "gradient boosting fit";
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::data(
                context,
                format!("{} rows of features for {} labels", x.nrows(), y.len()),
            ));
        }
        if params.n_estimators == 0 {
            return Err(Error::config(context, "n_estimators must be positive"));
        }
        if let Some(declared) = params.num_class {
            if declared != n_classes {
                return Err(Error::config(
                    context,
                    format!("num_class {declared} does not match {n_classes} observed classes"),
                ));
            }
        }

        let n = x.nrows();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: 2,
        };
        let mut onehot = Array2::<f64>::zeros((n, n_classes));
        for (i, &label) in y.iter().enumerate() {
            if label >= n_classes {
                return Err(Error::data(
                    context,
                    format!("label {label} out of range for {n_classes} classes"),
                ));
            }
            onehot[(i, label)] = 1.0;
        }

        let mut scores = Array2::<f64>::zeros((n, n_classes));
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let mut probs = scores.clone();
            softmax_rows(&mut probs);

            let mut round = Vec::with_capacity(n_classes);
            for class in 0..n_classes {
                let residuals: Vec<f64> = (0..n)
                    .map(|i| onehot[(i, class)] - probs[(i, class)])
                    .collect();
                let tree = RegressionTree::fit(x, &residuals, &tree_params)?;
                let updates = tree.predict(x);
                for (i, update) in updates.into_iter().enumerate() {
                    scores[(i, class)] += params.learning_rate * update;
                }
                round.push(tree);
            }
            trees.push(round);
        }

        Ok(Self {
            trees,
            n_classes,
            learning_rate: params.learning_rate,
            objective: params.objective.clone(),
            eval_metric: params.eval_metric.clone(),
        })
    }

    fn scores(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut scores = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for round in &self.trees {
            for (class, tree) in round.iter().enumerate() {
                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[(i, class)] += self.learning_rate * tree.predict_row(row);
                }
            }
        }
        scores
    }

    /// Highest-scoring class per row
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        self.scores(x)
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

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn eval_metric(&self) -> &str {
        &self.eval_metric
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_separable() {
        let x = array![[0.0], [0.5], [1.0], [5.0], [5.5], [6.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let model =
            GradientBoosting::fit(x.view(), &y, 2, &BoostingParams::default()).unwrap();
        assert_eq!(model.predict(x.view()), y);
        assert_eq!(model.n_rounds(), 50);
    }

    #[test]
    fn test_three_class_separable() {
        let x = array![
            [0.0, 0.0],
            [0.3, 0.1],
            [5.0, 0.0],
            [5.3, 0.2],
            [0.0, 5.0],
            [0.1, 5.2]
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let params = BoostingParams {
            objective: "multi:softprob".to_string(),
            eval_metric: "mlogloss".to_string(),
            num_class: Some(3),
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(x.view(), &y, 3, &params).unwrap();
        assert_eq!(model.predict(x.view()), y);
        assert_eq!(model.objective(), "multi:softprob");
        assert_eq!(model.eval_metric(), "mlogloss");
    }

    #[test]
    fn test_num_class_mismatch_rejected() {
        let x = array![[0.0], [1.0]];
        let params = BoostingParams {
            num_class: Some(5),
            ..BoostingParams::default()
        };
        let err = GradientBoosting::fit(x.view(), &[0, 1], 2, &params).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let x = array![[0.0], [1.0]];
        let params = BoostingParams {
            n_estimators: 0,
            ..BoostingParams::default()
        };
        assert!(GradientBoosting::fit(x.view(), &[0, 1], 2, &params).is_err());
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let x = array![[0.0], [1.0], [5.0], [6.0]];
        let y = vec![0, 0, 1, 1];
        let params = BoostingParams {
            n_estimators: 10,
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(x.view(), &y, 2, &params).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let parsed: GradientBoosting = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.predict(x.view()), model.predict(x.view()));
    }
}
