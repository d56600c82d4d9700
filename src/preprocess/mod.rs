//! Fit-once, apply-many preprocessing
//!
//! The numeric branch imputes missing values with the training median and
//! scales to zero mean / unit variance; the categorical branch imputes with
//! the training mode and one-hot expands, mapping categories unseen at
//! inference time to an all-zero indicator rather than erroring. The two
//! branches run independently and their outputs are concatenated; columns
//! not listed in either branch are dropped.
//!
//! All statistics come from the training set alone — `fit` builds the state
//! once, `transform` applies it to train, test, and inference data alike.

mod target;

pub use target::TargetValueMap;

use crate::data::{Column, Frame};
use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Learned state for one numeric column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericColumnState {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub std: f64,
}

/// Learned state for one categorical column
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumnState {
    pub name: String,
    pub mode: String,
    /// Sorted training vocabulary; one output feature per entry
    pub categories: Vec<String>,
}

/// The fitted numeric/categorical transform pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericColumnState>,
    categorical: Vec<CategoricalColumnState>,
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn numeric_cells<'a>(frame: &'a Frame, name: &str, context: &str) -> Result<&'a [Option<f64>]> {
    match frame.column(name) {
        Some(Column::Float(values)) => Ok(values),
        Some(Column::Str(_)) => Err(Error::data(
            context,
            format!("column '{name}' is not numeric"),
        )),
        None => Err(Error::data(context, format!("missing column '{name}'"))),
    }
}

fn string_cells<'a>(frame: &'a Frame, name: &str, context: &str) -> Result<&'a [Option<String>]> {
    match frame.column(name) {
        Some(Column::Str(values)) => Ok(values),
        Some(Column::Float(_)) => Err(Error::data(
            context,
            format!("column '{name}' is not categorical"),
        )),
        None => Err(Error::data(context, format!("missing column '{name}'"))),
    }
}

impl Preprocessor {
    /// Learn imputation and scaling statistics from the training frame.
    /// Called exactly once per pipeline run; a new run builds a new
    /// preprocessor.
    pub fn fit(
        numeric_columns: &[String],
        categorical_columns: &[String],
        train: &Frame,
    ) -> Result<Self> {
        let context = "preprocessor fit";
        let mut numeric = Vec::with_capacity(numeric_columns.len());
        for name in numeric_columns {
            let cells = numeric_cells(train, name, context)?;
            let present: Vec<f64> = cells.iter().flatten().copied().collect();
            let median = median(present);
            let imputed: Vec<f64> = cells.iter().map(|v| v.unwrap_or(median)).collect();
            let n = imputed.len().max(1) as f64;
            let mean = imputed.iter().sum::<f64>() / n;
            let var = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };
            numeric.push(NumericColumnState {
                name: name.clone(),
                median,
                mean,
                std,
            });
        }

        let mut categorical = Vec::with_capacity(categorical_columns.len());
        for name in categorical_columns {
            let cells = string_cells(train, name, context)?;
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for value in cells.iter().flatten() {
                *counts.entry(value.as_str()).or_insert(0) += 1;
            }
            // most frequent value; BTreeMap order makes ties deterministic
            let mode = counts
                .iter()
                .max_by_key(|(_, &count)| count)
                .map(|(&value, _)| value.to_string())
                .unwrap_or_default();
            let mut categories: Vec<String> = cells
                .iter()
                .map(|v| v.clone().unwrap_or_else(|| mode.clone()))
                .collect();
            categories.sort();
            categories.dedup();
            categorical.push(CategoricalColumnState {
                name: name.clone(),
                mode,
                categories,
            });
        }

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Total width of the transformed feature block
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Output feature names, numeric block first then one-hot indicators
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
        for column in &self.categorical {
            for category in &column.categories {
                names.push(format!("{}={}", column.name, category));
            }
        }
        names
    }

    /// Apply the learned transform. Unseen categories produce all-zero
    /// indicators; missing listed columns are a data error.
    pub fn transform(&self, frame: &Frame) -> Result<Array2<f64>> {
        let context = "preprocessor transform";
        let n_rows = frame.n_rows();
        let mut out = Array2::zeros((n_rows, self.n_features()));

        for (j, state) in self.numeric.iter().enumerate() {
            let cells = numeric_cells(frame, &state.name, context)?;
            for (i, cell) in cells.iter().enumerate() {
                let value = cell.unwrap_or(state.median);
                out[(i, j)] = (value - state.mean) / state.std;
            }
        }

        let mut offset = self.numeric.len();
        for state in &self.categorical {
            let cells = string_cells(frame, &state.name, context)?;
            for (i, cell) in cells.iter().enumerate() {
                let value = cell.as_deref().unwrap_or(state.mode.as_str());
                if let Ok(pos) = state.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                    out[(i, offset + pos)] = 1.0;
                }
            }
            offset += state.categories.len();
        }

        Ok(out)
    }
}

/// Everything the transformation stage hands to the trainer: the fitted
/// transform, the per-target encoders, and the resolved column lists.
/// Built once per run, read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessorBundle {
    pub preprocessor: Preprocessor,
    pub target_map: TargetValueMap,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub feature_names: Vec<String>,
}
