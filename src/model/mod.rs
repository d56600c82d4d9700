//! Estimator registry
//!
//! A closed registry: catalog entries name a [`ModelFamily`], and the
//! registry turns family + untyped catalog parameters into a typed,
//! unfitted estimator. Unknown parameter names are configuration errors
//! at construction, not silent defaults. The legacy `use_label_encoder`
//! flag is accepted and ignored for catalog compatibility.

mod boosting;
mod forest;
mod logistic;
mod tree;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use logistic::{LogisticParams, LogisticRegression};
pub use tree::{ClassificationTree, RegressionTree, TreeParams};

use crate::config::{ModelFamily, ModelSpec};
use crate::train::grid::{ParamCombination, ParamValue};
use crate::{Error, Result};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

const CONTEXT: &str = "estimator registry";

fn float_param(name: &str, value: &ParamValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::config(CONTEXT, format!("parameter '{name}' must be numeric")))
}

fn count_param(name: &str, value: &ParamValue) -> Result<usize> {
    value.as_usize().ok_or_else(|| {
        Error::config(
            CONTEXT,
            format!("parameter '{name}' must be a non-negative integer"),
        )
    })
}

fn string_param(name: &str, value: &ParamValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::config(CONTEXT, format!("parameter '{name}' must be a string")))
}

/// A configured but not yet fitted estimator
#[derive(Clone, Debug)]
pub enum UnfitEstimator {
    LogisticRegression {
        params: LogisticParams,
        n_classes: usize,
    },
    DecisionTree {
        params: TreeParams,
        n_classes: usize,
    },
    RandomForest {
        params: ForestParams,
        n_classes: usize,
    },
    GradientBoosting {
        params: BoostingParams,
        n_classes: usize,
    },
}

impl UnfitEstimator {
    /// Instantiate from a catalog entry for a target with `n_classes`
    /// classes. Boosting on a multiclass target gets the softprob
    /// objective, the class count, and the multiclass log-loss metric
    /// injected before the entry's own parameters apply.
    pub fn from_spec(spec: &ModelSpec, n_classes: usize) -> Result<Self> {
        let mut estimator = match spec.family {
            ModelFamily::LogisticRegression => Self::LogisticRegression {
                params: LogisticParams::default(),
                n_classes,
            },
            ModelFamily::DecisionTree => Self::DecisionTree {
                params: TreeParams::default(),
                n_classes,
            },
            ModelFamily::RandomForest => Self::RandomForest {
                params: ForestParams::default(),
                n_classes,
            },
            ModelFamily::GradientBoosting => {
                let mut params = BoostingParams::default();
                if n_classes > 2 {
                    params.objective = "multi:softprob".to_string();
                    params.eval_metric = "mlogloss".to_string();
                    params.num_class = Some(n_classes);
                }
                Self::GradientBoosting { params, n_classes }
            }
        };
        estimator.apply_all(&spec.params)?;
        Ok(estimator)
    }

    /// A copy with one grid combination applied on top
    pub fn with_params(&self, combination: &ParamCombination) -> Result<Self> {
        let mut configured = self.clone();
        configured.apply_all(combination)?;
        Ok(configured)
    }

    fn apply_all(&mut self, params: &ParamCombination) -> Result<()> {
        for (name, value) in params {
            if name == "use_label_encoder" {
                continue;
            }
            self.apply(name, value)?;
        }
        Ok(())
    }

    fn apply(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match self {
            Self::LogisticRegression { params, .. } => match name {
                "learning_rate" => params.learning_rate = float_param(name, value)?,
                "epochs" => params.epochs = count_param(name, value)?,
                "l2" => params.l2 = float_param(name, value)?,
                _ => return Err(self.unknown_param(name)),
            },
            Self::DecisionTree { params, .. } => match name {
                "max_depth" => params.max_depth = count_param(name, value)?,
                "min_samples_split" => params.min_samples_split = count_param(name, value)?,
                _ => return Err(self.unknown_param(name)),
            },
            Self::RandomForest { params, .. } => match name {
                "n_estimators" => params.n_estimators = count_param(name, value)?,
                "max_depth" => params.max_depth = count_param(name, value)?,
                "min_samples_split" => params.min_samples_split = count_param(name, value)?,
                "random_state" => params.seed = count_param(name, value)? as u64,
                _ => return Err(self.unknown_param(name)),
            },
            Self::GradientBoosting { params, .. } => match name {
                "n_estimators" => params.n_estimators = count_param(name, value)?,
                "learning_rate" => params.learning_rate = float_param(name, value)?,
                "max_depth" => params.max_depth = count_param(name, value)?,
                "objective" => params.objective = string_param(name, value)?,
                "eval_metric" => params.eval_metric = string_param(name, value)?,
                "num_class" => params.num_class = Some(count_param(name, value)?),
                _ => return Err(self.unknown_param(name)),
            },
        }
        Ok(())
    }

    fn unknown_param(&self, name: &str) -> Error {
        Error::config(
            CONTEXT,
            format!(
                "unknown parameter '{name}' for family '{:?}'",
                self.family()
            ),
        )
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            Self::LogisticRegression { .. } => ModelFamily::LogisticRegression,
            Self::DecisionTree { .. } => ModelFamily::DecisionTree,
            Self::RandomForest { .. } => ModelFamily::RandomForest,
            Self::GradientBoosting { .. } => ModelFamily::GradientBoosting,
        }
    }

    /// Fit on the given training block
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<TrainedModel> {
        match self {
            Self::LogisticRegression { params, n_classes } => Ok(TrainedModel::LogisticRegression(
                LogisticRegression::fit(x, y, *n_classes, params)?,
            )),
            Self::DecisionTree { params, n_classes } => Ok(TrainedModel::DecisionTree(
                ClassificationTree::fit(x, y, *n_classes, params)?,
            )),
            Self::RandomForest { params, n_classes } => Ok(TrainedModel::RandomForest(
                RandomForest::fit(x, y, *n_classes, params)?,
            )),
            Self::GradientBoosting { params, n_classes } => Ok(TrainedModel::GradientBoosting(
                GradientBoosting::fit(x, y, *n_classes, params)?,
            )),
        }
    }
}

/// A fitted estimator, serializable as part of the model package
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    DecisionTree(ClassificationTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl TrainedModel {
    /// Predicted class per row
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        match self {
            Self::LogisticRegression(m) => m.predict(x),
            Self::DecisionTree(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
            Self::GradientBoosting(m) => m.predict(x),
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            Self::LogisticRegression(_) => ModelFamily::LogisticRegression,
            Self::DecisionTree(_) => ModelFamily::DecisionTree,
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::GradientBoosting(_) => ModelFamily::GradientBoosting,
        }
    }
}
