//! Feature engineering
//!
//! Derives the model-facing features from a raw applicant frame:
//! standardized category strings, a log-transformed publication count, a
//! parsed HSK level, the binary language-requirement flag, and the
//! domain-weighted academic score. All derivations are pure functions of the
//! row; the input frame is never mutated.

use crate::config::SchemaConfig;
use crate::data::{Column, Frame};
use crate::{Error, Result};

/// Columns later stages standardize on; never pruned even when listed as dropped
pub const PROTECTED_COLUMNS: [&str; 3] =
    ["program_category", "degree_language", "english_test_type"];

/// Engineered column: 1 when the applicant meets the language requirement
pub const LANGUAGE_FLAG_COLUMN: &str = "language_requirement_passed";
/// Engineered column: weighted academic score per program category
pub const WEIGHTED_SCORE_COLUMN: &str = "weighted_score";

/// Lowercase, trim, and replace hyphens with underscores
pub fn standardize_string(value: &str) -> String {
    value.trim().to_lowercase().replace('-', "_")
}

fn standardized_column(column: &Column) -> Column {
    match column {
        Column::Str(values) => Column::Str(
            values
                .iter()
                .map(|v| v.as_deref().map(standardize_string))
                .collect(),
        ),
        Column::Float(values) => Column::Str(
            values
                .iter()
                .map(|v| v.map(|x| standardize_string(&x.to_string())))
                .collect(),
        ),
    }
}

/// Strip a leading "hsk" token and parse the remainder as a level.
/// Empty or unparseable input is a missing value, not zero — downstream
/// imputation owns that decision.
fn parse_chinese_level(value: &str) -> Option<f64> {
    let standardized = standardize_string(value);
    let stripped = standardized.strip_prefix("hsk").unwrap_or(&standardized);
    stripped.trim().parse::<f64>().ok()
}

struct RowView<'a> {
    frame: &'a Frame,
    row: usize,
}

impl RowView<'_> {
    fn str_or_empty(&self, name: &str) -> &str {
        self.frame
            .column(name)
            .and_then(|c| c.str_at(self.row))
            .unwrap_or("")
    }

    fn float_or_zero(&self, name: &str) -> f64 {
        self.frame
            .column(name)
            .and_then(|c| c.float_at(self.row))
            .unwrap_or(0.0)
    }
}

fn language_requirement_passed(row: &RowView<'_>) -> f64 {
    let degree_language = row.str_or_empty("degree_language");
    let english_type = row.str_or_empty("english_test_type");
    let english_score = row.float_or_zero("english_score");
    let chinese_level = row.float_or_zero("chinese_proficiency");

    match degree_language {
        "english_taught" => {
            let passed = (english_type == "duolingo" && english_score >= 90.0)
                || (english_type == "toefl" && english_score >= 90.0)
                || (english_type == "ielts" && english_score >= 6.5);
            if passed {
                1.0
            } else {
                0.0
            }
        }
        "chinese_taught" => {
            if chinese_level >= 4.0 {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

fn weighted_score(row: &RowView<'_>) -> f64 {
    let category = row.str_or_empty("program_category");
    let gpa = row.float_or_zero("previous_gpa");
    let math_phys = row.float_or_zero("math_physics_background_score");
    let research = row.float_or_zero("research_alignment_score");
    let publications = row.float_or_zero("publication_count").min(5.0);
    let recommendation = row.float_or_zero("recommendation_strength");
    let interview = row.float_or_zero("interview_score");

    match category {
        "undergraduate" => {
            0.40 * gpa + 0.30 * math_phys + 0.10 * recommendation + 0.20 * interview
        }
        "postgraduate" => {
            0.40 * gpa
                + 0.30 * research
                + 0.10 * publications
                + 0.10 * recommendation
                + 0.10 * interview
        }
        // chinese-language and dual-degree programs share this weighting
        _ => 0.50 * gpa + 0.20 * recommendation + 0.30 * interview,
    }
}

/// Derive engineered features from a raw frame.
///
/// Returns a new frame with standardized category strings, log1p-transformed
/// publication counts, the parsed HSK level, and the two engineered columns
/// appended. The input is untouched.
pub fn engineer_features(frame: &Frame) -> Result<Frame> {
    let mut out = frame.clone();

    for name in PROTECTED_COLUMNS {
        if let Some(column) = out.column(name) {
            let standardized = standardized_column(column);
            out.insert(name, standardized)?;
        }
    }

    if let Some(column) = out.column("publication_count") {
        let transformed = match column {
            Column::Float(values) => Column::Float(
                values
                    .iter()
                    .map(|v| v.map(|x| x.max(0.0).ln_1p()))
                    .collect(),
            ),
            Column::Str(_) => {
                return Err(Error::data(
                    "feature engineering",
                    "column 'publication_count' must be numeric",
                ))
            }
        };
        out.insert("publication_count", transformed)?;
    }

    if let Some(column) = out.column("chinese_proficiency") {
        if let Column::Str(values) = column {
            let parsed = Column::Float(
                values
                    .iter()
                    .map(|v| v.as_deref().and_then(parse_chinese_level))
                    .collect(),
            );
            out.insert("chinese_proficiency", parsed)?;
        }
    }

    let mut language_flags = Vec::with_capacity(out.n_rows());
    let mut scores = Vec::with_capacity(out.n_rows());
    for row in 0..out.n_rows() {
        let view = RowView { frame: &out, row };
        language_flags.push(Some(language_requirement_passed(&view)));
        scores.push(Some(weighted_score(&view)));
    }
    out.insert(LANGUAGE_FLAG_COLUMN, Column::Float(language_flags))?;
    out.insert(WEIGHTED_SCORE_COLUMN, Column::Float(scores))?;

    Ok(out)
}

/// Remove the schema's dropped columns, keeping targets and the protected
/// trio regardless of what the drop list says.
pub fn prune_dropped(frame: &Frame, schema: &SchemaConfig) -> Frame {
    let drop_list: Vec<String> = schema
        .dropped_columns
        .iter()
        .filter(|name| {
            !schema.target_columns.contains(name)
                && !PROTECTED_COLUMNS.contains(&name.as_str())
        })
        .cloned()
        .collect();
    frame.drop_columns(&drop_list)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::data::ApplicantRecord;
    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = ApplicantRecord> {
        (
            prop::sample::select(vec![
                "undergraduate",
                "Postgraduate",
                "chinese-language",
                "dual-degree",
            ]),
            prop::sample::select(vec!["English-Taught", "chinese_taught", "other"]),
            0.0f64..4.0,
            0.0f64..10.0,
            0.0f64..10.0,
            -2.0f64..50.0,
            0.0f64..10.0,
            0.0f64..100.0,
            prop::sample::select(vec!["toefl", "ielts", "duolingo", ""]),
            0.0f64..120.0,
            prop::sample::select(vec!["HSK1", "hsk5", "", "unknown"]),
        )
            .prop_map(
                |(cat, lang, gpa, math, research, pubs, rec, interview, test, eng, hsk)| {
                    ApplicantRecord {
                        program_category: cat.to_string(),
                        country: "kenya".into(),
                        bit_program_applied: "cs".into(),
                        degree_language: lang.to_string(),
                        previous_gpa: gpa,
                        math_physics_background_score: math,
                        research_alignment_score: research,
                        publication_count: pubs,
                        recommendation_strength: rec,
                        interview_score: interview,
                        english_test_type: test.to_string(),
                        english_score: eng,
                        chinese_proficiency: hsk.to_string(),
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_language_flag_is_binary_and_deterministic(record in arb_record()) {
            let raw = record.to_frame();
            let a = engineer_features(&raw).unwrap();
            let b = engineer_features(&raw).unwrap();
            let flag = a.column(LANGUAGE_FLAG_COLUMN).unwrap().float_at(0).unwrap();
            prop_assert!(flag == 0.0 || flag == 1.0);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_weighted_score_is_finite_and_bounded(record in arb_record()) {
            let frame = engineer_features(&record.to_frame()).unwrap();
            let score = frame.column(WEIGHTED_SCORE_COLUMN).unwrap().float_at(0).unwrap();
            prop_assert!(score.is_finite());
            // all weights sum to 1 over inputs bounded by 120
            prop_assert!((0.0..=120.0).contains(&score));
        }
    }
}
