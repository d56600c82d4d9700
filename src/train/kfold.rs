//! Stratified k-fold splitting
//!
//! Folds preserve per-class proportions: samples are grouped by label,
//! each group is (optionally) shuffled with the seeded generator, and
//! group members are dealt round-robin across folds. The fold count is
//! capped at the smallest class count so every fold sees every class.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Stratified splitter with a fixed seed for reproducible folds
#[derive(Clone, Copy, Debug)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(2),
            shuffle: true,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Produce `(train_indices, test_indices)` pairs for the given labels.
    ///
    /// The effective fold count is `min(n_splits, smallest class count)`
    /// but never below 2, so a rare class shrinks the folds instead of
    /// producing folds that lack it.
    pub fn split(&self, y: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
        if y.len() < 2 {
            return Vec::new();
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            groups.entry(label).or_default().push(i);
        }

        let smallest = groups.values().map(Vec::len).min().unwrap_or(0);
        let effective = self.n_splits.min(smallest).max(2);

        let mut fold_of = vec![0usize; y.len()];
        let mut rng = StdRng::seed_from_u64(self.seed);
        for indices in groups.values_mut() {
            if self.shuffle {
                indices.shuffle(&mut rng);
            }
            for (position, &i) in indices.iter().enumerate() {
                fold_of[i] = position % effective;
            }
        }

        (0..effective)
            .map(|fold| {
                let mut train = Vec::new();
                let mut test = Vec::new();
                for (i, &f) in fold_of.iter().enumerate() {
                    if f == fold {
                        test.push(i);
                    } else {
                        train.push(i);
                    }
                }
                (train, test)
            })
            .collect()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_test_folds_are_disjoint_and_exhaustive(
            y in prop::collection::vec(0usize..3, 6..80),
            n_splits in 2usize..6,
            seed in 0u64..1000,
        ) {
            let folds = StratifiedKFold::new(n_splits).with_seed(seed).split(&y);
            let mut seen = vec![false; y.len()];
            for (_, test) in &folds {
                for &i in test {
                    prop_assert!(!seen[i], "sample {} in two test folds", i);
                    seen[i] = true;
                }
            }
            prop_assert!(seen.into_iter().all(|s| s));
        }
    }
}
