//! Hyperparameter grids
//!
//! Exhaustive Cartesian expansion of a named search space. Grid axes come
//! from the model catalog YAML, so values arrive untyped; [`ParamValue`]
//! keeps them as written and lets each estimator coerce at construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One hyperparameter value as it appears in the catalog YAML.
///
/// `Int` is listed before `Float` so untagged deserialization keeps whole
/// numbers integral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) | Self::Str(_) => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|v| usize::try_from(v).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            Self::Int(_) | Self::Float(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// A single assignment of values to grid axes
pub type ParamCombination = BTreeMap<String, ParamValue>;

/// Expand named axes into every combination.
///
/// An empty grid yields one empty combination, so a catalog entry with no
/// `search_param_grid` still trains once on its fixed parameters. Axis
/// order is the map's key order, which makes the expansion deterministic.
pub fn param_grid(axes: &BTreeMap<String, Vec<ParamValue>>) -> Vec<ParamCombination> {
    let mut combinations = vec![ParamCombination::new()];
    for (name, values) in axes {
        let mut expanded = Vec::with_capacity(combinations.len() * values.len().max(1));
        for combination in &combinations {
            for value in values {
                let mut next = combination.clone();
                next.insert(name.clone(), value.clone());
                expanded.push(next);
            }
        }
        combinations = expanded;
    }
    combinations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(pairs: &[(&str, Vec<ParamValue>)]) -> BTreeMap<String, Vec<ParamValue>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_grid_yields_single_empty_combination() {
        let combos = param_grid(&BTreeMap::new());
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_cartesian_product_size() {
        let grid = axes(&[
            (
                "max_depth",
                vec![ParamValue::Int(4), ParamValue::Int(8), ParamValue::Int(12)],
            ),
            (
                "learning_rate",
                vec![ParamValue::Float(0.01), ParamValue::Float(0.1)],
            ),
        ]);
        let combos = param_grid(&grid);
        assert_eq!(combos.len(), 6);
        assert!(combos
            .iter()
            .any(|c| c["max_depth"] == ParamValue::Int(8)
                && c["learning_rate"] == ParamValue::Float(0.1)));
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let grid = axes(&[
            ("b", vec![ParamValue::Int(1), ParamValue::Int(2)]),
            ("a", vec![ParamValue::Str("x".into())]),
        ]);
        assert_eq!(param_grid(&grid), param_grid(&grid));
        // key-sorted axes: "a" varies slowest
        let combos = param_grid(&grid);
        assert_eq!(combos[0]["b"], ParamValue::Int(1));
        assert_eq!(combos[1]["b"], ParamValue::Int(2));
    }

    #[test]
    fn test_untagged_yaml_keeps_integers_integral() {
        let parsed: Vec<ParamValue> = serde_yaml::from_str("[5, 0.5, gini]").unwrap();
        assert_eq!(
            parsed,
            vec![
                ParamValue::Int(5),
                ParamValue::Float(0.5),
                ParamValue::Str("gini".into())
            ]
        );
    }

    #[test]
    fn test_coercions() {
        assert_eq!(ParamValue::Int(5).as_f64(), Some(5.0));
        assert_eq!(ParamValue::Int(5).as_usize(), Some(5));
        assert_eq!(ParamValue::Int(-1).as_usize(), None);
        assert_eq!(ParamValue::Float(0.5).as_i64(), None);
        assert_eq!(ParamValue::Str("gini".into()).as_str(), Some("gini"));
        assert_eq!(ParamValue::Str("gini".into()).as_f64(), None);
    }
}
