//! Declarative pipeline configuration
//!
//! Two static YAML documents drive a run: the column schema (which columns
//! play which role) and the model catalog (which estimator families to try,
//! with what fixed parameters and search grids). Both are loaded once and
//! treated read-only afterwards.
//!
//! The catalog is a closed registry: model keys map to a [`ModelFamily`]
//! enum known at compile time, and an unrecognized family is a configuration
//! error at parse time rather than a dynamic-lookup failure at train time.

use crate::train::grid::ParamValue;
use crate::{io, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Column roles, loaded from `schema.yaml`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    #[serde(default)]
    pub dropped_columns: Vec<String>,
    #[serde(default)]
    pub engineered_columns: Vec<String>,
    #[serde(default)]
    pub target_columns: Vec<String>,
}

impl SchemaConfig {
    /// Load the schema document from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        io::load_yaml(path, "schema load")
    }
}

/// The closed set of estimator families the trainer can instantiate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LogisticRegression,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

/// One catalog entry: a family, its fixed construction parameters, and an
/// optional hyperparameter search grid
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSpec {
    pub family: ModelFamily,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub search_param_grid: BTreeMap<String, Vec<ParamValue>>,
}

/// Scoring metric used during cross-validated selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    #[default]
    F1Weighted,
    Accuracy,
}

fn default_cv() -> usize {
    3
}

fn default_shuffle() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

fn default_snapshot_interval() -> f64 {
    0.25
}

/// Cross-validation settings shared by every grid sweep in a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridSearchSettings {
    /// Stratified fold count
    #[serde(default = "default_cv")]
    pub cv: usize,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub random_state: u64,
    #[serde(default)]
    pub scoring: Scoring,
    /// Fold-level parallelism: `None` or `Some(1)` runs folds sequentially,
    /// anything else fans out across the rayon pool
    #[serde(default)]
    pub n_jobs: Option<i64>,
    /// Fraction of the combination sweep between progress milestones
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: f64,
}

impl Default for GridSearchSettings {
    fn default() -> Self {
        Self {
            cv: default_cv(),
            shuffle: default_shuffle(),
            random_state: default_seed(),
            scoring: Scoring::default(),
            n_jobs: None,
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

impl GridSearchSettings {
    /// Snapshot interval clamped to its legal range
    pub fn clamped_snapshot_interval(&self) -> f64 {
        self.snapshot_interval.clamp(0.05, 1.0)
    }

    /// Whether fold scoring should fan out across threads
    pub fn parallel(&self) -> bool {
        !matches!(self.n_jobs, None | Some(1))
    }
}

/// The model catalog document (`model.yaml`)
///
/// `model_selection` is key-sorted, which fixes the candidate iteration
/// order: ties on test F1 are broken in favor of the lowest model key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub model_selection: BTreeMap<String, ModelSpec>,
    #[serde(default)]
    pub grid_search: Option<GridSearchSettings>,
}

impl ModelCatalog {
    /// Load the catalog document from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        io::load_yaml(path, "model catalog load")
    }
}

/// Output locations for the transformation stage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformationConfig {
    pub transformed_object_path: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        let dir = PathBuf::from("artifacts/data_transformation");
        Self {
            transformed_object_path: dir.join("preprocessing.json"),
            transformed_train_path: dir.join("train.arr"),
            transformed_test_path: dir.join("test.arr"),
        }
    }
}

/// Output locations for the training stage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub trained_model_path: PathBuf,
    pub metrics_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let dir = PathBuf::from("artifacts/model_trainer");
        Self {
            trained_model_path: dir.join("model.json"),
            metrics_path: dir.join("metrics.yaml"),
        }
    }
}

/// Promotion threshold and the canonical best-model locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Minimum average-F1 improvement required to replace the current best
    pub change_threshold: f64,
    pub best_model_path: PathBuf,
    pub best_metrics_path: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        let dir = PathBuf::from("best_model");
        Self {
            change_threshold: 0.07,
            best_model_path: dir.join("model.json"),
            best_metrics_path: dir.join("metrics.yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_parses_from_yaml() {
        let yaml = r"
numerical_columns: [previous_gpa, interview_score]
categorical_columns: [country]
dropped_columns: [bit_program_applied]
engineered_columns: [weighted_score]
target_columns: [admission_decision, scholarship_tier]
";
        let schema: SchemaConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.numerical_columns.len(), 2);
        assert_eq!(
            schema.target_columns,
            vec!["admission_decision", "scholarship_tier"]
        );
    }

    #[test]
    fn test_schema_missing_sections_default_empty() {
        let schema: SchemaConfig = serde_yaml::from_str("numerical_columns: [a]").unwrap();
        assert!(schema.dropped_columns.is_empty());
        assert!(schema.target_columns.is_empty());
    }

    #[test]
    fn test_catalog_parses_families_and_grids() {
        let yaml = r"
model_selection:
  random_forest:
    family: random_forest
    params:
      n_estimators: 50
    search_param_grid:
      max_depth: [4, 8]
  gbdt:
    family: gradient_boosting
    params:
      learning_rate: 0.1
grid_search:
  cv: 5
  shuffle: true
  random_state: 7
  scoring: f1_weighted
  n_jobs: -1
  snapshot_interval: 0.5
";
        let catalog: ModelCatalog = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(catalog.model_selection.len(), 2);
        let rf = &catalog.model_selection["random_forest"];
        assert_eq!(rf.family, ModelFamily::RandomForest);
        assert_eq!(rf.search_param_grid["max_depth"].len(), 2);
        let gs = catalog.grid_search.unwrap();
        assert_eq!(gs.cv, 5);
        assert!(gs.parallel());
    }

    #[test]
    fn test_catalog_rejects_unknown_family() {
        let yaml = r"
model_selection:
  mystery:
    family: quantum_svm
";
        assert!(serde_yaml::from_str::<ModelCatalog>(yaml).is_err());
    }

    #[test]
    fn test_catalog_iteration_is_key_sorted() {
        let yaml = r"
model_selection:
  zeta: {family: decision_tree}
  alpha: {family: logistic_regression}
";
        let catalog: ModelCatalog = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<_> = catalog.model_selection.keys().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_snapshot_interval_clamped() {
        let mut gs = GridSearchSettings::default();
        gs.snapshot_interval = 0.001;
        assert_eq!(gs.clamped_snapshot_interval(), 0.05);
        gs.snapshot_interval = 3.0;
        assert_eq!(gs.clamped_snapshot_interval(), 1.0);
        gs.snapshot_interval = 0.25;
        assert_eq!(gs.clamped_snapshot_interval(), 0.25);
    }

    #[test]
    fn test_n_jobs_one_is_sequential() {
        let mut gs = GridSearchSettings::default();
        assert!(!gs.parallel());
        gs.n_jobs = Some(1);
        assert!(!gs.parallel());
        gs.n_jobs = Some(4);
        assert!(gs.parallel());
    }

    #[test]
    fn test_evaluation_config_default_threshold() {
        let cfg = EvaluationConfig::default();
        assert_eq!(cfg.change_threshold, 0.07);
    }
}
