//! Pipeline error taxonomy
//!
//! A closed set of error kinds, one per failure class the pipeline can hit:
//! configuration documents, data contents, training, and artifact I/O. Every
//! variant carries enough context (stage, path, column) to diagnose a failed
//! run from the message alone.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed schema / model-catalog documents
    #[error("configuration error in {context}: {detail}")]
    Config { context: String, detail: String },

    /// Bad data contents: unseen labels, missing columns, type mismatches
    #[error("data error in {context}: {detail}")]
    Data { context: String, detail: String },

    /// Training failures: no candidates, no usable fit
    #[error("training error for target '{target}': {detail}")]
    Training { target: String, detail: String },

    /// Artifact read/write failures, wrapped with originating stage and path
    #[error("I/O error in {context} ({path:?}): {source}")]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Configuration error with stage context
    pub fn config(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Config {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Data error with stage context
    pub fn data(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Data {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Training error for a specific target column
    pub fn training(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Training {
            target: target.into(),
            detail: detail.into(),
        }
    }

    /// I/O error with stage context and the offending path
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config("schema load", "missing key 'target_columns'");
        let msg = format!("{err}");
        assert!(msg.contains("schema load"));
        assert!(msg.contains("target_columns"));
    }

    #[test]
    fn test_data_error_display() {
        let err = Error::data("target encoding", "unseen label 'waitlist' in column 'admission_decision'");
        assert!(format!("{err}").contains("unseen label"));
    }

    #[test]
    fn test_training_error_display() {
        let err = Error::training("scholarship_tier", "no model candidates configured");
        let msg = format!("{err}");
        assert!(msg.contains("scholarship_tier"));
        assert!(msg.contains("no model candidates"));
    }

    #[test]
    fn test_io_error_carries_path() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io("model load", "/tmp/model.json", inner);
        let msg = format!("{err}");
        assert!(msg.contains("model load"));
        assert!(msg.contains("/tmp/model.json"));
    }
}
