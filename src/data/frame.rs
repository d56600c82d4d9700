//! Column-oriented table with per-cell missingness
//!
//! A deliberately small dataframe: two column types (float, string), columns
//! kept in insertion order, and copy-on-write operations — transformations
//! return a new frame rather than mutating in place.

use crate::{Error, Result};

/// A single column of data
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Numeric values; `None` marks a missing cell
    Float(Vec<Option<f64>>),
    /// String values; `None` marks a missing cell
    Str(Vec<Option<String>>),
}

impl Column {
    /// Number of rows in this column
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric value at `row`, if the column is numeric and the cell present
    pub fn float_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Float(v) => v.get(row).copied().flatten(),
            Column::Str(_) => None,
        }
    }

    /// String value at `row`, if the column is textual and the cell present
    pub fn str_at(&self, row: usize) -> Option<&str> {
        match self {
            Column::Str(v) => v.get(row).and_then(|c| c.as_deref()),
            Column::Float(_) => None,
        }
    }
}

/// An insertion-ordered collection of named columns of equal length
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Frame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Insert a column, replacing any existing column with the same name.
    /// The first inserted column fixes the row count.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(Error::data(
                "frame",
                format!(
                    "column '{}' has {} rows, frame has {}",
                    name,
                    column.len(),
                    self.n_rows
                ),
            ));
        }
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name, column));
        }
        Ok(())
    }

    /// New frame without the named columns; unknown names are ignored
    pub fn drop_columns(&self, names: &[String]) -> Frame {
        let mut out = Frame::new();
        for (name, col) in &self.columns {
            if !names.iter().any(|n| n == name) {
                // lengths already consistent
                let _ = out.insert(name.clone(), col.clone());
            }
        }
        out
    }

    /// New frame containing only the named columns, in the given order
    pub fn select(&self, names: &[String]) -> Result<Frame> {
        let mut out = Frame::new();
        for name in names {
            let col = self
                .column(name)
                .ok_or_else(|| Error::data("frame", format!("missing column '{name}'")))?;
            out.insert(name.clone(), col.clone())?;
        }
        Ok(out)
    }

    /// Split off the target columns: (features, targets)
    pub fn split_targets(&self, target_columns: &[String]) -> Result<(Frame, Frame)> {
        let targets = self.select(target_columns)?;
        let features = self.drop_columns(target_columns);
        Ok((features, targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let mut f = Frame::new();
        f.insert(
            "gpa",
            Column::Float(vec![Some(3.5), None, Some(2.8)]),
        )
        .unwrap();
        f.insert(
            "country",
            Column::Str(vec![
                Some("kenya".into()),
                Some("ghana".into()),
                None,
            ]),
        )
        .unwrap();
        f
    }

    #[test]
    fn test_insert_and_lookup() {
        let f = sample_frame();
        assert_eq!(f.n_rows(), 3);
        assert_eq!(f.n_cols(), 2);
        assert!(f.has_column("gpa"));
        assert_eq!(f.column("gpa").unwrap().float_at(0), Some(3.5));
        assert_eq!(f.column("gpa").unwrap().float_at(1), None);
        assert_eq!(f.column("country").unwrap().str_at(1), Some("ghana"));
        assert_eq!(f.column("country").unwrap().str_at(2), None);
    }

    #[test]
    fn test_insert_length_mismatch() {
        let mut f = sample_frame();
        let err = f.insert("bad", Column::Float(vec![Some(1.0)])).unwrap_err();
        assert!(matches!(err, Error::Data { .. }));
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut f = sample_frame();
        f.insert("gpa", Column::Float(vec![Some(4.0), Some(4.0), Some(4.0)]))
            .unwrap();
        assert_eq!(f.n_cols(), 2);
        assert_eq!(f.column("gpa").unwrap().float_at(1), Some(4.0));
    }

    #[test]
    fn test_drop_columns_is_copy_on_write() {
        let f = sample_frame();
        let dropped = f.drop_columns(&["country".to_string()]);
        assert_eq!(dropped.n_cols(), 1);
        // original untouched
        assert_eq!(f.n_cols(), 2);
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let f = sample_frame();
        let sel = f
            .select(&["country".to_string(), "gpa".to_string()])
            .unwrap();
        assert_eq!(sel.column_names(), vec!["country", "gpa"]);
    }

    #[test]
    fn test_select_missing_column_errors() {
        let f = sample_frame();
        assert!(f.select(&["unknown".to_string()]).is_err());
    }

    #[test]
    fn test_split_targets() {
        let f = sample_frame();
        let (features, targets) = f.split_targets(&["country".to_string()]).unwrap();
        assert_eq!(features.column_names(), vec!["gpa"]);
        assert_eq!(targets.column_names(), vec!["country"]);
    }

    #[test]
    fn test_cross_type_accessors_return_none() {
        let f = sample_frame();
        assert_eq!(f.column("country").unwrap().float_at(0), None);
        assert_eq!(f.column("gpa").unwrap().str_at(0), None);
    }
}
