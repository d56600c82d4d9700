//! Artifact persistence
//!
//! Narrow save/load helpers shared by every stage: JSON for serialized
//! objects (preprocessor bundle, trained model package), YAML for schema and
//! metrics documents, and a serde container for transformed feature arrays.
//! Writers create parent directories; `atomic_write` is the write-then-rename
//! primitive the promotion protocol builds on.

use crate::{Error, Result};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn ensure_parent(path: &Path, context: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(context, parent, e))?;
        }
    }
    Ok(())
}

/// Write bytes to `path` without ever exposing a half-written file: the
/// content goes to a sibling temp path first and is renamed into place.
pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8], context: &str) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path, context)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|e| Error::io(context, &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(context, path, e))?;
    Ok(())
}

/// Serialize a value to pretty JSON at `path`
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T, context: &str) -> Result<()> {
    let path = path.as_ref();
    let data = serde_json::to_string_pretty(value)
        .map_err(|e| Error::config(context, format!("JSON serialization failed: {e}")))?;
    atomic_write(path, data.as_bytes(), context)
}

/// Load a JSON-serialized value from `path`
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>, context: &str) -> Result<T> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|e| Error::io(context, path, e))?;
    serde_json::from_str(&data).map_err(|e| {
        Error::config(
            context,
            format!("JSON deserialization of {} failed: {e}", path.display()),
        )
    })
}

/// Serialize a value to YAML at `path`
pub fn save_yaml<T: Serialize>(path: impl AsRef<Path>, value: &T, context: &str) -> Result<()> {
    let path = path.as_ref();
    let data = serde_yaml::to_string(value)
        .map_err(|e| Error::config(context, format!("YAML serialization failed: {e}")))?;
    atomic_write(path, data.as_bytes(), context)
}

/// Load a YAML document from `path`
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>, context: &str) -> Result<T> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|e| Error::io(context, path, e))?;
    serde_yaml::from_str(&data).map_err(|e| {
        Error::config(
            context,
            format!("YAML parse of {} failed: {e}", path.display()),
        )
    })
}

/// Serde container for a persisted 2-D array
#[derive(Debug, Serialize, Deserialize)]
struct ArrayDocument {
    shape: (usize, usize),
    data: Vec<f64>,
}

/// Persist a transformed feature/target matrix
pub fn save_array(path: impl AsRef<Path>, array: &Array2<f64>, context: &str) -> Result<()> {
    let doc = ArrayDocument {
        shape: array.dim(),
        data: array.iter().copied().collect(),
    };
    save_json(path, &doc, context)
}

/// Load a persisted matrix written by [`save_array`]
pub fn load_array(path: impl AsRef<Path>, context: &str) -> Result<Array2<f64>> {
    let doc: ArrayDocument = load_json(path, context)?;
    Array2::from_shape_vec(doc.shape, doc.data).map_err(|e| {
        Error::data(
            context,
            format!("array document has inconsistent shape: {e}"),
        )
    })
}
