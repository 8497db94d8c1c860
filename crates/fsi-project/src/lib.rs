//! fsi-project: problem configuration format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate};

use std::path::Path;

use serde_json::Value;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Validation error in entry {index}: {source}")]
    BatchEntry {
        index: usize,
        source: ValidationError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a configuration file into an untyped tree.
///
/// `.yaml`/`.yml` files go through the YAML reader, everything else is JSON.
pub fn read_tree(path: &Path) -> ProjectResult<Value> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

pub fn load_json(path: &Path) -> ProjectResult<ProblemDescription> {
    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    Ok(validate(&raw)?)
}

pub fn load_yaml(path: &Path) -> ProjectResult<ProblemDescription> {
    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_yaml::from_str(&content)?;
    Ok(validate(&raw)?)
}

/// Load a single problem, choosing the reader from the file extension.
pub fn load_problem(path: &Path) -> ProjectResult<ProblemDescription> {
    let raw = read_tree(path)?;
    Ok(validate(&raw)?)
}

/// Load one problem or a list of problems from a single file.
///
/// Every entry must validate; the first failing entry is reported with its
/// index.
pub fn load_batch(path: &Path) -> ProjectResult<Vec<ProblemDescription>> {
    let raw = read_tree(path)?;
    parse_batch(&raw)
}

pub fn parse_batch(raw: &Value) -> ProjectResult<Vec<ProblemDescription>> {
    match raw {
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                validate(entry).map_err(|source| ProjectError::BatchEntry { index, source })
            })
            .collect(),
        single => Ok(vec![validate(single)?]),
    }
}
