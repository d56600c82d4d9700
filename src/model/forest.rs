//! Random forest
//!
//! Bagged Gini trees with per-tree feature subsampling. Each tree gets a
//! bootstrap sample of the rows and a random `sqrt(d)` subset of the
//! columns; the subset is stored with the tree so prediction can project
//! rows into the tree's feature space. Votes are aggregated by majority,
//! ties broken toward the lower class index.

use crate::model::tree::{ClassificationTree, TreeParams};
use crate::{Error, Result};
use ndarray::{Array1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Forest hyperparameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ForestMember {
    /// Sorted column indices this tree was grown on
    features: Vec<usize>,
    tree: ClassificationTree,
}

/// Fitted bagged ensemble
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RandomForest {
    members: Vec<ForestMember>,
    n_classes: usize,
}

impl RandomForest {
    /// Grow the ensemble; deterministic for a fixed seed
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self> {
        let context = "random forest fit";
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(Error::data(
                context,
                format!("{} rows of features for {} labels", x.nrows(), y.len()),
            ));
        }
        if params.n_estimators == 0 {
            return Err(Error::config(context, "n_estimators must be positive"));
        }

        let n = x.nrows();
        let d = x.ncols();
        let n_subset = ((d as f64).sqrt().round() as usize).clamp(1, d);
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
        };

        let mut members = Vec::with_capacity(params.n_estimators);
        for t in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));

            let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let mut features: Vec<usize> = (0..d).collect();
            features.shuffle(&mut rng);
            features.truncate(n_subset);
            features.sort_unstable();

            let x_sub = x.select(Axis(0), &bootstrap).select(Axis(1), &features);
            let y_sub: Vec<usize> = bootstrap.iter().map(|&i| y[i]).collect();
            let tree = ClassificationTree::fit(x_sub.view(), &y_sub, n_classes, &tree_params)?;
            members.push(ForestMember { features, tree });
        }

        Ok(Self { members, n_classes })
    }

    /// Majority vote over the ensemble
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        x.rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0usize; self.n_classes];
                for member in &self.members {
                    let projected: Array1<f64> =
                        member.features.iter().map(|&f| row[f]).collect();
                    votes[member.tree.predict_row(projected.view())] += 1;
                }
                votes
                    .iter()
                    .enumerate()
                    .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn n_estimators(&self) -> usize {
        self.members.len()
    }
}
