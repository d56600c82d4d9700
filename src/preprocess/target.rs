//! Target label encoding
//!
//! One integer encoder per target column, fit on training labels only.
//! `transform` is deliberately strict: a label absent from training is a
//! data error, surfacing schema drift immediately instead of silently
//! mis-encoding it.

use crate::data::{Column, Frame};
use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bidirectional label↔code maps for every target column, in fit order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetValueMap {
    /// (column name, sorted class labels); a label's code is its index
    encoders: Vec<(String, Vec<String>)>,
}

impl TargetValueMap {
    /// Fit encoders on a frame of target columns and return the encoded
    /// targets as a float matrix (one column per target, codes as floats
    /// so they concatenate with the feature block).
    pub fn fit(targets: &Frame) -> Result<(Self, Array2<f64>)> {
        let context = "target encoding";
        let mut encoders = Vec::with_capacity(targets.n_cols());
        for name in targets.column_names() {
            let cells = match targets.column(name) {
                Some(Column::Str(values)) => values,
                Some(Column::Float(_)) => {
                    return Err(Error::data(
                        context,
                        format!("target column '{name}' must be categorical"),
                    ))
                }
                None => unreachable!("column_names only yields present columns"),
            };
            let mut classes: Vec<String> = Vec::new();
            for (row, cell) in cells.iter().enumerate() {
                match cell {
                    Some(value) => classes.push(value.clone()),
                    None => {
                        return Err(Error::data(
                            context,
                            format!("missing label in target column '{name}' row {row}"),
                        ))
                    }
                }
            }
            classes.sort();
            classes.dedup();
            encoders.push((name.to_string(), classes));
        }
        let map = Self { encoders };
        let encoded = map.transform(targets)?;
        Ok((map, encoded))
    }

    /// Encode targets with the fitted maps. Errors on labels unseen during
    /// fit — intentional strictness, not a bug.
    pub fn transform(&self, targets: &Frame) -> Result<Array2<f64>> {
        let context = "target encoding";
        let n_rows = targets.n_rows();
        let mut out = Array2::zeros((n_rows, self.encoders.len()));
        for (j, (name, classes)) in self.encoders.iter().enumerate() {
            let column = targets
                .column(name)
                .ok_or_else(|| Error::data(context, format!("missing target column '{name}'")))?;
            for i in 0..n_rows {
                let label = column.str_at(i).ok_or_else(|| {
                    Error::data(
                        context,
                        format!("missing label in target column '{name}' row {i}"),
                    )
                })?;
                let code = classes
                    .binary_search_by(|c| c.as_str().cmp(label))
                    .map_err(|_| {
                        Error::data(
                            context,
                            format!("unseen label '{label}' in target column '{name}'"),
                        )
                    })?;
                out[(i, j)] = code as f64;
            }
        }
        Ok(out)
    }

    /// Decode a matrix of integer codes back into a frame of label strings
    pub fn inverse_transform(&self, encoded: &Array2<f64>) -> Result<Frame> {
        let context = "target decoding";
        if encoded.ncols() != self.encoders.len() {
            return Err(Error::data(
                context,
                format!(
                    "expected {} target columns, got {}",
                    self.encoders.len(),
                    encoded.ncols()
                ),
            ));
        }
        let mut out = Frame::new();
        for (j, (name, classes)) in self.encoders.iter().enumerate() {
            let mut cells = Vec::with_capacity(encoded.nrows());
            for i in 0..encoded.nrows() {
                let code = encoded[(i, j)].round() as usize;
                let label = classes.get(code).ok_or_else(|| {
                    Error::data(
                        context,
                        format!("code {code} out of range for target column '{name}'"),
                    )
                })?;
                cells.push(Some(label.clone()));
            }
            out.insert(name.clone(), Column::Str(cells))?;
        }
        Ok(out)
    }

    /// Decode one predicted code per named target into a name→label map,
    /// for single-record inference.
    pub fn decode_prediction(
        &self,
        codes: &[usize],
        order: &[String],
    ) -> Result<BTreeMap<String, String>> {
        let context = "target decoding";
        if codes.len() != order.len() {
            return Err(Error::data(
                context,
                format!(
                    "{} codes for {} target names",
                    codes.len(),
                    order.len()
                ),
            ));
        }
        let mut decoded = BTreeMap::new();
        for (name, &code) in order.iter().zip(codes) {
            let classes = self.classes(name).ok_or_else(|| {
                Error::data(context, format!("unknown target column '{name}'"))
            })?;
            let label = classes.get(code).ok_or_else(|| {
                Error::data(
                    context,
                    format!("code {code} out of range for target column '{name}'"),
                )
            })?;
            decoded.insert(name.clone(), label.clone());
        }
        Ok(decoded)
    }

    /// Full integer↔label table per column, for audit and debugging
    pub fn mapping(&self) -> BTreeMap<String, BTreeMap<usize, String>> {
        self.encoders
            .iter()
            .map(|(name, classes)| {
                let table = classes
                    .iter()
                    .enumerate()
                    .map(|(code, label)| (code, label.clone()))
                    .collect();
                (name.clone(), table)
            })
            .collect()
    }

    /// Target column names in fit order
    pub fn target_columns(&self) -> Vec<String> {
        self.encoders.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of target columns
    pub fn n_targets(&self) -> usize {
        self.encoders.len()
    }

    /// Class labels for one target column
    pub fn classes(&self, name: &str) -> Option<&[String]> {
        self.encoders
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, classes)| classes.as_slice())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_fit_then_inverse_is_identity(
            labels in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 1..40)
        ) {
            let mut f = Frame::new();
            f.insert(
                "target",
                Column::Str(labels.iter().map(|s| Some(s.to_string())).collect()),
            )
            .unwrap();
            let (map, encoded) = TargetValueMap::fit(&f).unwrap();
            let decoded = map.inverse_transform(&encoded).unwrap();
            prop_assert_eq!(decoded, f);
        }
    }
}
