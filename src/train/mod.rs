//! Model training
//!
//! One grid sweep per (target column, catalog entry): every combination is
//! scored with stratified cross-validation on the training block, the best
//! combination is refit on the full training block, and the refit model is
//! scored once on the held-out test block. Across catalog entries the
//! model with the strictly highest test F1 wins the target; ties keep the
//! earlier (lower-keyed) entry.

pub mod grid;
pub mod kfold;
pub mod progress;

pub use grid::{param_grid, ParamCombination, ParamValue};
pub use kfold::StratifiedKFold;
pub use progress::{GridSearchObserver, SilentProgress, StdoutProgress};

use crate::config::{GridSearchSettings, ModelCatalog, Scoring};
use crate::eval::{accuracy, MetricsRecord, TargetMetrics};
use crate::model::{TrainedModel, UnfitEstimator};
use crate::preprocess::PreprocessorBundle;
use crate::{Error, Result};
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn fold_score(
    estimator: &UnfitEstimator,
    x: ArrayView2<'_, f64>,
    y: &[usize],
    train_idx: &[usize],
    test_idx: &[usize],
    scoring: Scoring,
) -> Result<f64> {
    let x_train = x.select(Axis(0), train_idx);
    let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
    let x_test = x.select(Axis(0), test_idx);
    let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

    let model = estimator.fit(x_train.view(), &y_train)?;
    let predictions = model.predict(x_test.view());
    Ok(match scoring {
        Scoring::F1Weighted => TargetMetrics::from_predictions(&predictions, &y_test).f1,
        Scoring::Accuracy => accuracy(&predictions, &y_test),
    })
}

/// Mean cross-validated score of one estimator configuration.
///
/// Folds fan out across the rayon pool when the settings ask for
/// parallelism; scores are averaged in fold order either way, so the
/// result does not depend on scheduling.
pub fn cross_val_score(
    estimator: &UnfitEstimator,
    x: ArrayView2<'_, f64>,
    y: &[usize],
    settings: &GridSearchSettings,
) -> Result<f64> {
    let mut splitter = StratifiedKFold::new(settings.cv).with_seed(settings.random_state);
    if !settings.shuffle {
        splitter = splitter.without_shuffle();
    }
    let folds = splitter.split(y);
    if folds.is_empty() {
        return Err(Error::data(
            "cross-validation",
            format!("{} samples are too few to split", y.len()),
        ));
    }

    let scores: Vec<f64> = if settings.parallel() {
        folds
            .par_iter()
            .map(|(train_idx, test_idx)| {
                fold_score(estimator, x, y, train_idx, test_idx, settings.scoring)
            })
            .collect::<Result<_>>()?
    } else {
        folds
            .iter()
            .map(|(train_idx, test_idx)| {
                fold_score(estimator, x, y, train_idx, test_idx, settings.scoring)
            })
            .collect::<Result<_>>()?
    };

    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Everything inference needs, persisted as one JSON document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainedModelPackage {
    pub preprocessing: PreprocessorBundle,
    /// Winning fitted model per target column
    pub models: BTreeMap<String, TrainedModel>,
    /// Winning catalog key per target column, for audit
    pub chosen: BTreeMap<String, String>,
}

/// Runs the full sweep for every target column
pub struct ModelTrainer {
    catalog: ModelCatalog,
    observer: Box<dyn GridSearchObserver>,
}

impl ModelTrainer {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            observer: Box::new(SilentProgress),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn GridSearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Train on the transformed blocks. Both blocks carry the feature
    /// columns first and one encoded target column per target at the end,
    /// exactly as the transformation stage wrote them.
    pub fn train(
        &self,
        train: &Array2<f64>,
        test: &Array2<f64>,
        bundle: &PreprocessorBundle,
    ) -> Result<(TrainedModelPackage, MetricsRecord)> {
        let context = "model training";
        let n_targets = bundle.target_map.n_targets();
        if train.ncols() != test.ncols() {
            return Err(Error::data(
                context,
                format!(
                    "train block has {} columns, test block has {}",
                    train.ncols(),
                    test.ncols()
                ),
            ));
        }
        if train.ncols() <= n_targets {
            return Err(Error::data(
                context,
                format!(
                    "{} columns cannot hold features plus {n_targets} targets",
                    train.ncols()
                ),
            ));
        }
        if self.catalog.model_selection.is_empty() {
            return Err(Error::config(context, "model catalog is empty"));
        }

        let n_features = train.ncols() - n_targets;
        let x_train = train.slice(s![.., ..n_features]);
        let x_test = test.slice(s![.., ..n_features]);
        let settings = self.catalog.grid_search.clone().unwrap_or_default();

        let mut models = BTreeMap::new();
        let mut chosen = BTreeMap::new();
        let mut record = MetricsRecord::default();

        for (j, target) in bundle.target_map.target_columns().iter().enumerate() {
            let y_train: Vec<usize> = train
                .column(n_features + j)
                .iter()
                .map(|&v| v.round() as usize)
                .collect();
            let y_test: Vec<usize> = test
                .column(n_features + j)
                .iter()
                .map(|&v| v.round() as usize)
                .collect();
            let n_classes = bundle
                .target_map
                .classes(target)
                .map(<[String]>::len)
                .ok_or_else(|| {
                    Error::training(target, "target column missing from the fitted encoders")
                })?;

            let mut best: Option<(f64, TrainedModel, String)> = None;
            for (key, spec) in &self.catalog.model_selection {
                let base = UnfitEstimator::from_spec(spec, n_classes)
                    .map_err(|e| Error::training(target, format!("{key}: {e}")))?;
                let combination = self
                    .sweep(target, key, &base, x_train, &y_train, &settings)
                    .map_err(|e| Error::training(target, format!("{key}: {e}")))?;

                let tuned = base.with_params(&combination)?;
                let model = tuned
                    .fit(x_train, &y_train)
                    .map_err(|e| Error::training(target, format!("{key}: {e}")))?;
                let predictions = model.predict(x_test);
                let metrics = TargetMetrics::from_predictions(&predictions, &y_test);
                let improves = match &best {
                    Some((f1, _, _)) => metrics.f1 > *f1,
                    None => true,
                };
                if improves {
                    best = Some((metrics.f1, model, key.clone()));
                }
            }

            let (_, model, key) = best
                .ok_or_else(|| Error::training(target, "no candidate model could be trained"))?;
            let winning = model.predict(x_test);
            record.per_target.insert(
                target.clone(),
                TargetMetrics::from_predictions(&winning, &y_test),
            );
            models.insert(target.clone(), model);
            chosen.insert(target.clone(), key);
        }

        let package = TrainedModelPackage {
            preprocessing: bundle.clone(),
            models,
            chosen,
        };
        Ok((package, record))
    }

    /// Sweep one catalog entry's grid for one target, returning the best
    /// combination by mean cross-validated score.
    fn sweep(
        &self,
        target: &str,
        key: &str,
        base: &UnfitEstimator,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        settings: &GridSearchSettings,
    ) -> Result<ParamCombination> {
        let combinations = param_grid(&self.find_grid(key));
        let total = combinations.len();
        self.observer.on_search_begin(target, key, total);

        let interval = settings.clamped_snapshot_interval();
        let mut next_milestone = interval;
        let mut best: Option<(f64, ParamCombination)> = None;

        for (done, combination) in combinations.into_iter().enumerate() {
            let candidate = base.with_params(&combination)?;
            let score = cross_val_score(&candidate, x, y, settings)?;
            let improves = match &best {
                Some((s, _)) => score > *s,
                None => true,
            };
            if improves {
                best = Some((score, combination));
            }

            let completed = done + 1;
            let fraction = completed as f64 / total as f64;
            if fraction + 1e-9 >= next_milestone {
                let best_score = best.as_ref().map_or(0.0, |(s, _)| *s);
                self.observer
                    .on_progress(target, key, completed, total, best_score);
                while next_milestone <= fraction + 1e-9 {
                    next_milestone += interval;
                }
            }
        }

        let (best_score, combination) = best.ok_or_else(|| {
            Error::training(target, format!("{key}: empty hyperparameter sweep"))
        })?;
        self.observer.on_search_end(target, key, best_score);
        Ok(combination)
    }

    fn find_grid(&self, key: &str) -> BTreeMap<String, Vec<ParamValue>> {
        self.catalog
            .model_selection
            .get(key)
            .map(|spec| spec.search_param_grid.clone())
            .unwrap_or_default()
    }
}
