//! Decision trees
//!
//! Flat-array CART trees: a Gini-split classification tree used directly and
//! inside the random forest, and a variance-split regression tree used as
//! the gradient-boosting base learner. Nodes live in a `Vec` and children
//! are indices, which keeps the fitted trees serializable.

use crate::{Error, Result};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum ClassNode {
    Leaf {
        prediction: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Gini-impurity classification tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassificationTree {
    nodes: Vec<ClassNode>,
    n_classes: usize,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / t;
            p * p
        })
        .sum::<f64>()
}

fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl ClassificationTree {
    /// Grow a tree on the given rows
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        params: &TreeParams,
    ) -> Result<Self> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::data(
                "decision tree fit",
                format!("{} rows of features for {} labels", x.nrows(), y.len()),
            ));
        }
        let mut tree = Self {
            nodes: Vec::new(),
            n_classes,
        };
        let indices: Vec<usize> = (0..x.nrows()).collect();
        tree.grow(x, y, &indices, 0, params);
        Ok(tree)
    }

    fn grow(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        indices: &[usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        let parent_gini = gini(&counts, indices.len());

        let can_split = depth < params.max_depth
            && indices.len() >= params.min_samples_split
            && parent_gini > 0.0;
        let split = if can_split {
            self.best_split(x, y, indices, &counts, parent_gini)
        } else {
            None
        };

        match split {
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[(i, feature)] <= threshold);
                // reserve the slot before recursing so child indices are stable
                let slot = self.nodes.len();
                self.nodes.push(ClassNode::Leaf { prediction: 0 });
                let left = self.grow(x, y, &left_idx, depth + 1, params);
                let right = self.grow(x, y, &right_idx, depth + 1, params);
                self.nodes[slot] = ClassNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                slot
            }
            None => {
                let slot = self.nodes.len();
                self.nodes.push(ClassNode::Leaf {
                    prediction: majority(&counts),
                });
                slot
            }
        }
    }

    fn best_split(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        indices: &[usize],
        total_counts: &[usize],
        parent_gini: f64,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let mut best: Option<(usize, f64)> = None;
        let mut best_impurity = parent_gini - 1e-12;

        for feature in 0..x.ncols() {
            let mut ordered: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (x[(i, feature)], y[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; self.n_classes];
            for k in 0..n - 1 {
                left_counts[ordered[k].1] += 1;
                if ordered[k].0 == ordered[k + 1].0 {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                let right_counts: Vec<usize> = total_counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(&t, &l)| t - l)
                    .collect();
                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                if weighted < best_impurity {
                    best_impurity = weighted;
                    best = Some((feature, (ordered[k].0 + ordered[k + 1].0) / 2.0));
                }
            }
        }
        best
    }

    /// Predict the class of one row
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                ClassNode::Leaf { prediction } => return *prediction,
                ClassNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Predict classes for every row
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        x.rows().into_iter().map(|r| self.predict_row(r)).collect()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum RegNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Variance-reduction regression tree (gradient-boosting base learner)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<RegNode>,
}

impl RegressionTree {
    /// Fit to a continuous target (typically pseudo-residuals)
    pub fn fit(
        x: ArrayView2<'_, f64>,
        targets: &[f64],
        params: &TreeParams,
    ) -> Result<Self> {
        if x.nrows() == 0 || x.nrows() != targets.len() {
            return Err(Error::data(
                "regression tree fit",
                format!("{} rows of features for {} targets", x.nrows(), targets.len()),
            ));
        }
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.nrows()).collect();
        tree.grow(x, targets, &indices, 0, params);
        Ok(tree)
    }

    fn grow(
        &mut self,
        x: ArrayView2<'_, f64>,
        targets: &[f64],
        indices: &[usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| targets[i]).sum();
        let mean = sum / n;

        let split = if depth < params.max_depth && indices.len() >= params.min_samples_split {
            self.best_split(x, targets, indices)
        } else {
            None
        };

        match split {
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[(i, feature)] <= threshold);
                let slot = self.nodes.len();
                self.nodes.push(RegNode::Leaf { value: mean });
                let left = self.grow(x, targets, &left_idx, depth + 1, params);
                let right = self.grow(x, targets, &right_idx, depth + 1, params);
                self.nodes[slot] = RegNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                };
                slot
            }
            None => {
                let slot = self.nodes.len();
                self.nodes.push(RegNode::Leaf { value: mean });
                slot
            }
        }
    }

    fn best_split(
        &self,
        x: ArrayView2<'_, f64>,
        targets: &[f64],
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        let mut best: Option<(usize, f64)> = None;
        let mut best_cost = parent_sse - 1e-12;

        for feature in 0..x.ncols() {
            let mut ordered: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[(i, feature)], targets[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..n - 1 {
                left_sum += ordered[k].1;
                left_sq += ordered[k].1 * ordered[k].1;
                if ordered[k].0 == ordered[k + 1].0 {
                    continue;
                }
                let n_left = (k + 1) as f64;
                let n_right = (n - k - 1) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let cost = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((feature, (ordered[k].0 + ordered[k + 1].0) / 2.0));
                }
            }
        }
        best
    }

    /// Predict the value of one row
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                RegNode::Leaf { value } => return *value,
                RegNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Predict values for every row
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<f64> {
        x.rows().into_iter().map(|r| self.predict_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_tree_separable() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let tree = ClassificationTree::fit(x.view(), &y, 2, &TreeParams::default()).unwrap();
        assert_eq!(tree.predict(x.view()), y);
        assert_eq!(tree.predict_row(array![5.9].view()), 0);
        assert_eq!(tree.predict_row(array![6.1].view()), 1);
    }

    #[test]
    fn test_classification_tree_pure_node_is_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = vec![1, 1, 1];
        let tree = ClassificationTree::fit(x.view(), &y, 2, &TreeParams::default()).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_row(array![99.0].view()), 1);
    }

    #[test]
    fn test_classification_tree_depth_limit() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = vec![0, 1, 0, 1];
        let shallow = TreeParams {
            max_depth: 0,
            min_samples_split: 2,
        };
        let tree = ClassificationTree::fit(x.view(), &y, 2, &shallow).unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn test_classification_tree_xor_with_two_features() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.1, 0.1],
            [0.1, 0.9],
            [0.9, 0.1],
            [0.9, 0.9]
        ];
        let y = vec![0, 1, 1, 0, 0, 1, 1, 0];
        let tree = ClassificationTree::fit(x.view(), &y, 2, &TreeParams::default()).unwrap();
        assert_eq!(tree.predict(x.view()), y);
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let x = array![[1.0], [2.0]];
        assert!(ClassificationTree::fit(x.view(), &[0], 2, &TreeParams::default()).is_err());
    }

    #[test]
    fn test_regression_tree_step_function() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let t = vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let tree = RegressionTree::fit(x.view(), &t, &TreeParams::default()).unwrap();
        assert!(tree.predict_row(array![0.5].view()) < 0.0);
        assert!(tree.predict_row(array![11.5].view()) > 0.0);
    }

    #[test]
    fn test_regression_tree_constant_target_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let t = vec![0.5, 0.5, 0.5];
        let tree = RegressionTree::fit(x.view(), &t, &TreeParams::default()).unwrap();
        assert_eq!(tree.predict(x.view()), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_tree_serde_roundtrip() {
        let x = array![[0.0], [1.0], [10.0], [11.0]];
        let y = vec![0, 0, 1, 1];
        let tree = ClassificationTree::fit(x.view(), &y, 2, &TreeParams::default()).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let parsed: ClassificationTree = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.predict(x.view()), y);
    }
}
