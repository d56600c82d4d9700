//! Applicant records and data ingestion
//!
//! The raw input surface of the pipeline: the [`ApplicantRecord`] struct for
//! single-record inference, CSV ingestion into a [`Frame`], and the column
//! presence check that gates transformation.

mod frame;

pub use frame::{Column, Frame};

use crate::config::SchemaConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One raw applicant record, as submitted by a form or API caller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub program_category: String,
    pub country: String,
    pub bit_program_applied: String,
    pub degree_language: String,
    pub previous_gpa: f64,
    pub math_physics_background_score: f64,
    pub research_alignment_score: f64,
    pub publication_count: f64,
    pub recommendation_strength: f64,
    pub interview_score: f64,
    pub english_test_type: String,
    pub english_score: f64,
    pub chinese_proficiency: String,
}

impl ApplicantRecord {
    /// Build a one-row frame from this record
    pub fn to_frame(&self) -> Frame {
        let mut f = Frame::new();
        let s = |v: &str| Column::Str(vec![Some(v.to_string())]);
        let n = |v: f64| Column::Float(vec![Some(v)]);
        // columns match the training CSV layout
        let _ = f.insert("program_category", s(&self.program_category));
        let _ = f.insert("country", s(&self.country));
        let _ = f.insert("bit_program_applied", s(&self.bit_program_applied));
        let _ = f.insert("degree_language", s(&self.degree_language));
        let _ = f.insert("previous_gpa", n(self.previous_gpa));
        let _ = f.insert(
            "math_physics_background_score",
            n(self.math_physics_background_score),
        );
        let _ = f.insert("research_alignment_score", n(self.research_alignment_score));
        let _ = f.insert("publication_count", n(self.publication_count));
        let _ = f.insert("recommendation_strength", n(self.recommendation_strength));
        let _ = f.insert("interview_score", n(self.interview_score));
        let _ = f.insert("english_test_type", s(&self.english_test_type));
        let _ = f.insert("english_score", n(self.english_score));
        let _ = f.insert("chinese_proficiency", s(&self.chinese_proficiency));
        f
    }
}

/// Read a CSV file into a frame, inferring float columns where every
/// non-empty cell parses as a number. Empty cells become missing values.
pub fn read_csv_frame(path: impl AsRef<Path>) -> Result<Frame> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::data("ingestion", format!("cannot open {}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::data("ingestion", format!("bad CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record =
            record.map_err(|e| Error::data("ingestion", format!("bad CSV row: {e}")))?;
        for (i, cell) in record.iter().enumerate() {
            let value = if cell.trim().is_empty() {
                None
            } else {
                Some(cell.to_string())
            };
            if let Some(col) = cells.get_mut(i) {
                col.push(value);
            }
        }
    }

    let mut frame = Frame::new();
    for (name, raw) in headers.into_iter().zip(cells) {
        let numeric = raw
            .iter()
            .flatten()
            .all(|v| v.trim().parse::<f64>().is_ok())
            && raw.iter().any(Option::is_some);
        let column = if numeric {
            Column::Float(
                raw.iter()
                    .map(|v| v.as_ref().and_then(|s| s.trim().parse::<f64>().ok()))
                    .collect(),
            )
        } else {
            Column::Str(raw)
        };
        frame.insert(name, column)?;
    }
    Ok(frame)
}

/// Verify every column the schema names is present in the frame.
/// A missing required column fails the run before any stage work happens.
pub fn validate_columns(frame: &Frame, schema: &SchemaConfig) -> Result<()> {
    let mut missing = Vec::new();
    for name in schema
        .numerical_columns
        .iter()
        .chain(&schema.categorical_columns)
        .chain(&schema.target_columns)
    {
        // engineered columns appear only after feature engineering
        if !frame.has_column(name) && !schema.engineered_columns.contains(name) {
            missing.push(name.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::data(
            "validation",
            format!("missing required columns: {}", missing.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record() -> ApplicantRecord {
        ApplicantRecord {
            program_category: "Undergraduate".into(),
            country: "Kenya".into(),
            bit_program_applied: "computer-science".into(),
            degree_language: "English-Taught".into(),
            previous_gpa: 3.4,
            math_physics_background_score: 8.0,
            research_alignment_score: 0.0,
            publication_count: 0.0,
            recommendation_strength: 7.0,
            interview_score: 80.0,
            english_test_type: "TOEFL".into(),
            english_score: 95.0,
            chinese_proficiency: "HSK2".into(),
        }
    }

    #[test]
    fn test_record_to_frame() {
        let f = record().to_frame();
        assert_eq!(f.n_rows(), 1);
        assert_eq!(f.n_cols(), 13);
        assert_eq!(f.column("previous_gpa").unwrap().float_at(0), Some(3.4));
        assert_eq!(
            f.column("english_test_type").unwrap().str_at(0),
            Some("TOEFL")
        );
    }

    #[test]
    fn test_read_csv_infers_types() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,score").unwrap();
        writeln!(file, "ada,3.5").unwrap();
        writeln!(file, "grace,").unwrap();
        let frame = read_csv_frame(file.path()).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.column("score").unwrap().float_at(0), Some(3.5));
        assert_eq!(frame.column("score").unwrap().float_at(1), None);
        assert_eq!(frame.column("name").unwrap().str_at(1), Some("grace"));
    }

    #[test]
    fn test_read_csv_mixed_column_stays_string() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "level").unwrap();
        writeln!(file, "4").unwrap();
        writeln!(file, "HSK5").unwrap();
        let frame = read_csv_frame(file.path()).unwrap();
        assert!(matches!(frame.column("level").unwrap(), Column::Str(_)));
    }

    #[test]
    fn test_validate_columns_missing() {
        let schema = SchemaConfig {
            numerical_columns: vec!["previous_gpa".into()],
            categorical_columns: vec!["country".into()],
            dropped_columns: vec![],
            engineered_columns: vec!["weighted_score".into()],
            target_columns: vec!["admission_decision".into()],
        };
        let frame = record().to_frame();
        let err = validate_columns(&frame, &schema).unwrap_err();
        assert!(format!("{err}").contains("admission_decision"));
    }

    #[test]
    fn test_validate_columns_engineered_not_required() {
        let schema = SchemaConfig {
            numerical_columns: vec!["previous_gpa".into(), "weighted_score".into()],
            categorical_columns: vec!["country".into()],
            dropped_columns: vec![],
            engineered_columns: vec!["weighted_score".into()],
            target_columns: vec![],
        };
        assert!(validate_columns(&record().to_frame(), &schema).is_ok());
    }
}
