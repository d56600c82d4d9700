//! Admissions-decision ML pipeline
//!
//! End-to-end tooling for the admissions models: CSV ingestion and domain
//! feature engineering, fit-once preprocessing, per-target model selection
//! over a declarative catalog with cross-validated grid search, a
//! threshold-gated promotion step for the best model, and single-record
//! inference from the persisted package.
//!
//! The stages compose through [`pipeline::TrainingPipeline`]:
//!
//! ```no_run
//! use matricular::config::{ModelCatalog, SchemaConfig};
//! use matricular::pipeline::TrainingPipeline;
//! use std::path::Path;
//!
//! # fn main() -> matricular::Result<()> {
//! let schema = SchemaConfig::from_yaml_file("config/schema.yaml")?;
//! let catalog = ModelCatalog::from_yaml_file("config/model.yaml")?;
//! let report = TrainingPipeline::new(schema, catalog)
//!     .run(Path::new("data/train.csv"), Path::new("data/test.csv"))?;
//! println!(
//!     "avg F1 {:.3}, promoted: {}",
//!     report.trainer.metrics.average_f1(),
//!     report.decision.accepted
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod features;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod preprocess;
pub mod train;

pub use error::{Error, Result};
