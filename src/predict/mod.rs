//! Inference
//!
//! Loads the persisted model package once and serves per-applicant
//! predictions. A record goes through the same feature engineering and
//! fitted preprocessing as training data, then each target's winning
//! model predicts a code that is decoded back to its label.

use crate::data::ApplicantRecord;
use crate::features::engineer_features;
use crate::train::TrainedModelPackage;
use crate::{io, Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// A loaded model package ready to serve predictions
pub struct AdmissionClassifier {
    package: TrainedModelPackage,
}

impl AdmissionClassifier {
    /// Load the package from its JSON document. A missing or corrupt
    /// package is fatal here; there is nothing to predict with.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let package = io::load_json(path, "model package load")?;
        Ok(Self { package })
    }

    pub fn from_package(package: TrainedModelPackage) -> Self {
        Self { package }
    }

    /// Target columns this classifier predicts, in training order
    pub fn target_columns(&self) -> Vec<String> {
        self.package.preprocessing.target_map.target_columns()
    }

    /// Predict every target label for one applicant
    pub fn predict(&self, record: &ApplicantRecord) -> Result<BTreeMap<String, String>> {
        let engineered = engineer_features(&record.to_frame())?;
        let x = self.package.preprocessing.preprocessor.transform(&engineered)?;

        let order = self.target_columns();
        let mut codes = Vec::with_capacity(order.len());
        for target in &order {
            let model = self.package.models.get(target).ok_or_else(|| {
                Error::data(
                    "prediction",
                    format!("no trained model for target column '{target}'"),
                )
            })?;
            let predicted = model.predict(x.view());
            let code = predicted.first().copied().ok_or_else(|| {
                Error::data("prediction", "model produced no prediction for the record")
            })?;
            codes.push(code);
        }
        self.package.preprocessing.target_map.decode_prediction(&codes, &order)
    }
}
