//! Model evaluation and promotion
//!
//! The promotion gate compares a freshly trained run against the persisted
//! best-model baseline and replaces it only when the average F1 improves by
//! at least the configured threshold. With no baseline on disk any run is
//! accepted. Acceptance commits the model document first, then the metrics
//! document, each through an atomic write-then-rename, so a crash between
//! the two leaves a usable model with stale metrics rather than the
//! reverse.

mod metrics;

pub use metrics::{accuracy, BestModelMetrics, ConfusionMatrix, MetricsRecord, TargetMetrics};

use crate::config::EvaluationConfig;
use crate::{io, Error, Result};
use std::path::{Path, PathBuf};

/// Outcome of one promotion decision
#[derive(Clone, Debug)]
pub struct EvaluationDecision {
    pub accepted: bool,
    /// Candidate average F1 minus the baseline's; equals the candidate
    /// score when no baseline exists
    pub improvement: f64,
    pub candidate_avg_f1: f64,
    pub baseline_avg_f1: Option<f64>,
    /// Canonical best-model locations the gate manages
    pub best_model_path: PathBuf,
    pub best_metrics_path: PathBuf,
}

/// Threshold-gated replacement of the current best model
pub struct ModelEvaluation {
    threshold: f64,
    best_model_path: PathBuf,
    best_metrics_path: PathBuf,
}

impl ModelEvaluation {
    pub fn new(config: &EvaluationConfig) -> Self {
        Self {
            threshold: config.change_threshold,
            best_model_path: config.best_model_path.clone(),
            best_metrics_path: config.best_metrics_path.clone(),
        }
    }

    /// Current baseline average F1, if a best model has been promoted before
    fn baseline(&self) -> Result<Option<f64>> {
        if !self.best_metrics_path.exists() {
            return Ok(None);
        }
        let baseline: BestModelMetrics =
            io::load_yaml(&self.best_metrics_path, "best-model baseline load")?;
        Ok(Some(baseline.avg_f1_score))
    }

    /// Gate the candidate run. On acceptance the candidate model document
    /// at `candidate_model_path` becomes the new best model and the run's
    /// metrics become the new baseline; on rejection nothing on disk
    /// changes.
    pub fn evaluate(
        &self,
        record: &MetricsRecord,
        candidate_model_path: &Path,
    ) -> Result<EvaluationDecision> {
        let context = "model evaluation";
        let candidate_avg_f1 = record.average_f1();
        let baseline_avg_f1 = self.baseline()?;

        let (accepted, improvement) = match baseline_avg_f1 {
            None => (true, candidate_avg_f1),
            Some(baseline) => {
                let improvement = candidate_avg_f1 - baseline;
                (improvement >= self.threshold, improvement)
            }
        };

        if accepted {
            let model_bytes = std::fs::read(candidate_model_path).map_err(|source| {
                Error::io(context, candidate_model_path.to_path_buf(), source)
            })?;
            io::atomic_write(&self.best_model_path, &model_bytes, context)?;
            let baseline = BestModelMetrics {
                avg_f1_score: candidate_avg_f1,
                metrics_per_target: record.per_target.clone(),
            };
            io::save_yaml(&self.best_metrics_path, &baseline, context)?;
        }

        Ok(EvaluationDecision {
            accepted,
            improvement,
            candidate_avg_f1,
            baseline_avg_f1,
            best_model_path: self.best_model_path.clone(),
            best_metrics_path: self.best_metrics_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(f1: f64) -> MetricsRecord {
        MetricsRecord {
            per_target: BTreeMap::from([(
                "admission_decision".to_string(),
                TargetMetrics {
                    f1,
                    precision: f1,
                    recall: f1,
                },
            )]),
        }
    }

    fn setup(dir: &TempDir) -> (ModelEvaluation, PathBuf) {
        let config = EvaluationConfig {
            change_threshold: 0.07,
            best_model_path: dir.path().join("best/model.json"),
            best_metrics_path: dir.path().join("best/metrics.yaml"),
        };
        let candidate = dir.path().join("candidate.json");
        std::fs::write(&candidate, br#"{"model":"candidate"}"#).unwrap();
        (ModelEvaluation::new(&config), candidate)
    }

    #[test]
    fn test_first_run_is_always_accepted() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        let decision = gate.evaluate(&record(0.40), &candidate).unwrap();
        assert!(decision.accepted);
        assert_eq!(decision.baseline_avg_f1, None);
        assert_relative_eq!(decision.improvement, 0.40);
        assert!(dir.path().join("best/model.json").exists());
        assert!(dir.path().join("best/metrics.yaml").exists());
    }

    #[test]
    fn test_improvement_at_threshold_is_accepted() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        gate.evaluate(&record(0.70), &candidate).unwrap();
        // 0.78 - 0.70 = 0.08 >= 0.07
        let decision = gate.evaluate(&record(0.78), &candidate).unwrap();
        assert!(decision.accepted);
        assert_relative_eq!(decision.improvement, 0.08, epsilon = 1e-12);
    }

    #[test]
    fn test_small_improvement_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        gate.evaluate(&record(0.70), &candidate).unwrap();
        // 0.75 - 0.70 = 0.05 < 0.07
        let decision = gate.evaluate(&record(0.75), &candidate).unwrap();
        assert!(!decision.accepted);
        assert_eq!(decision.baseline_avg_f1, Some(0.70));

        // baseline untouched
        let baseline: BestModelMetrics =
            io::load_yaml(dir.path().join("best/metrics.yaml"), "test").unwrap();
        assert_relative_eq!(baseline.avg_f1_score, 0.70);
    }

    #[test]
    fn test_regression_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        gate.evaluate(&record(0.70), &candidate).unwrap();
        let decision = gate.evaluate(&record(0.50), &candidate).unwrap();
        assert!(!decision.accepted);
        assert!(decision.improvement < 0.0);
    }

    #[test]
    fn test_rejection_leaves_model_bytes_untouched() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        gate.evaluate(&record(0.70), &candidate).unwrap();
        let before = std::fs::read(dir.path().join("best/model.json")).unwrap();
        std::fs::write(&candidate, br#"{"model":"worse"}"#).unwrap();
        gate.evaluate(&record(0.71), &candidate).unwrap();
        let after = std::fs::read(dir.path().join("best/model.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_identical_rerun_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (gate, candidate) = setup(&dir);
        gate.evaluate(&record(0.80), &candidate).unwrap();
        let decision = gate.evaluate(&record(0.80), &candidate).unwrap();
        assert!(!decision.accepted);
        assert_relative_eq!(decision.improvement, 0.0);
    }

    #[test]
    fn test_missing_candidate_model_is_io_error() {
        let dir = TempDir::new().unwrap();
        let (gate, _) = setup(&dir);
        let err = gate
            .evaluate(&record(0.5), &dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
