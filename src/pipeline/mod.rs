//! Pipeline orchestration
//!
//! The three stages run strictly in sequence: transformation fits the
//! preprocessing on the training split and persists the transformed
//! blocks, training sweeps the model catalog over those blocks, and
//! evaluation gates promotion of the run's model package. Each stage
//! writes its artifacts before the next starts, so a failed run leaves
//! whatever it completed inspectable on disk.

use crate::config::{
    EvaluationConfig, ModelCatalog, SchemaConfig, TrainerConfig, TransformationConfig,
};
use crate::data::{read_csv_frame, validate_columns, Frame};
use crate::eval::{EvaluationDecision, MetricsRecord, ModelEvaluation};
use crate::features::{engineer_features, prune_dropped};
use crate::preprocess::{Preprocessor, PreprocessorBundle, TargetValueMap};
use crate::train::{ModelTrainer, TrainedModelPackage};
use crate::{io, Error, Result};
use ndarray::{concatenate, Array2, Axis};
use std::path::{Path, PathBuf};

/// Output of the transformation stage, both in memory and on disk
#[derive(Debug)]
pub struct TransformationArtifact {
    pub bundle: PreprocessorBundle,
    pub train: Array2<f64>,
    pub test: Array2<f64>,
    pub object_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

/// Fits preprocessing on the training split and encodes both splits
pub struct DataTransformation {
    schema: SchemaConfig,
    config: TransformationConfig,
}

impl DataTransformation {
    pub fn new(schema: SchemaConfig, config: TransformationConfig) -> Self {
        Self { schema, config }
    }

    /// Numeric model inputs: the schema's numerical columns plus the
    /// engineered ones, restricted to columns the frame actually has.
    /// Sorted so the feature layout never depends on schema file order.
    fn resolve_numeric(&self, frame: &Frame) -> Vec<String> {
        let mut names: Vec<String> = self
            .schema
            .numerical_columns
            .iter()
            .chain(&self.schema.engineered_columns)
            .filter(|name| frame.has_column(name))
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn resolve_categorical(&self, frame: &Frame) -> Vec<String> {
        self.schema
            .categorical_columns
            .iter()
            .filter(|name| {
                frame.has_column(name) && !self.schema.target_columns.contains(name)
            })
            .cloned()
            .collect()
    }

    pub fn run(&self, train_raw: &Frame, test_raw: &Frame) -> Result<TransformationArtifact> {
        let context = "transformation stage";
        if self.schema.target_columns.is_empty() {
            return Err(Error::config(context, "schema names no target columns"));
        }
        validate_columns(train_raw, &self.schema)?;
        validate_columns(test_raw, &self.schema)?;

        let train = prune_dropped(&engineer_features(train_raw)?, &self.schema);
        let test = prune_dropped(&engineer_features(test_raw)?, &self.schema);

        let (train_x, train_y) = train.split_targets(&self.schema.target_columns)?;
        let (test_x, test_y) = test.split_targets(&self.schema.target_columns)?;

        let numeric_columns = self.resolve_numeric(&train_x);
        let categorical_columns = self.resolve_categorical(&train_x);

        let preprocessor = Preprocessor::fit(&numeric_columns, &categorical_columns, &train_x)?;
        let x_train = preprocessor.transform(&train_x)?;
        let x_test = preprocessor.transform(&test_x)?;

        let (target_map, y_train) = TargetValueMap::fit(&train_y)?;
        // strict: a test-split label unseen in training fails the run
        let y_test = target_map.transform(&test_y)?;

        let train_block = concatenate(Axis(1), &[x_train.view(), y_train.view()])
            .map_err(|e| Error::data(context, format!("block assembly failed: {e}")))?;
        let test_block = concatenate(Axis(1), &[x_test.view(), y_test.view()])
            .map_err(|e| Error::data(context, format!("block assembly failed: {e}")))?;

        let bundle = PreprocessorBundle {
            feature_names: preprocessor.feature_names(),
            preprocessor,
            target_map,
            numeric_columns,
            categorical_columns,
        };

        io::save_json(&self.config.transformed_object_path, &bundle, context)?;
        io::save_array(&self.config.transformed_train_path, &train_block, context)?;
        io::save_array(&self.config.transformed_test_path, &test_block, context)?;

        Ok(TransformationArtifact {
            bundle,
            train: train_block,
            test: test_block,
            object_path: self.config.transformed_object_path.clone(),
            train_path: self.config.transformed_train_path.clone(),
            test_path: self.config.transformed_test_path.clone(),
        })
    }
}

/// Output of the trainer stage: the candidate package and its metrics
pub struct TrainerArtifact {
    /// The run's candidate package, whether or not it gets promoted
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    pub metrics: MetricsRecord,
}

/// Outcome of one end-to-end run
pub struct PipelineReport {
    pub trainer: TrainerArtifact,
    pub decision: EvaluationDecision,
}

/// Runs transformation, training, and evaluation in order
pub struct TrainingPipeline {
    schema: SchemaConfig,
    catalog: ModelCatalog,
    transformation: TransformationConfig,
    trainer: TrainerConfig,
    evaluation: EvaluationConfig,
}

impl TrainingPipeline {
    pub fn new(schema: SchemaConfig, catalog: ModelCatalog) -> Self {
        Self {
            schema,
            catalog,
            transformation: TransformationConfig::default(),
            trainer: TrainerConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }

    pub fn with_transformation_config(mut self, config: TransformationConfig) -> Self {
        self.transformation = config;
        self
    }

    pub fn with_trainer_config(mut self, config: TrainerConfig) -> Self {
        self.trainer = config;
        self
    }

    pub fn with_evaluation_config(mut self, config: EvaluationConfig) -> Self {
        self.evaluation = config;
        self
    }

    /// Run the full pipeline on pre-split train/test CSVs
    pub fn run(&self, train_csv: &Path, test_csv: &Path) -> Result<PipelineReport> {
        let context = "trainer stage";
        let train_frame = read_csv_frame(train_csv)?;
        let test_frame = read_csv_frame(test_csv)?;

        let transformation =
            DataTransformation::new(self.schema.clone(), self.transformation.clone());
        let transformed = transformation.run(&train_frame, &test_frame)?;

        let trainer = ModelTrainer::new(self.catalog.clone());
        let (package, metrics) =
            trainer.train(&transformed.train, &transformed.test, &transformed.bundle)?;
        io::save_json(&self.trainer.trained_model_path, &package, context)?;
        io::save_yaml(&self.trainer.metrics_path, &metrics, context)?;

        let gate = ModelEvaluation::new(&self.evaluation);
        let decision = gate.evaluate(&metrics, &self.trainer.trained_model_path)?;

        Ok(PipelineReport {
            trainer: TrainerArtifact {
                model_path: self.trainer.trained_model_path.clone(),
                metrics_path: self.trainer.metrics_path.clone(),
                metrics,
            },
            decision,
        })
    }

    /// The persisted candidate package from the last trainer run
    pub fn load_package(&self) -> Result<TrainedModelPackage> {
        io::load_json(&self.trainer.trained_model_path, "model package load")
    }
}
