//! fsi-results: result-file completion checks, pressure summaries and run manifests.

pub mod completion;
pub mod manifest;
pub mod pressure;
pub mod table;

pub use completion::{CompletionError, check_complete, is_complete, result_files};
pub use manifest::{MANIFEST_FILE, RunManifest, document_hash};
pub use pressure::{
    PressureTrace, SUMMARY_ALL_FILE, SummaryReport, import_pressure, pressure_diff_path,
    summarize_all, write_pressure_diff,
};
pub use table::read_table;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("No data for {prefix}: {reason}")]
    NoData { prefix: String, reason: String },
}

impl ResultsError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ResultsError {
        let path = path.into();
        move |source| ResultsError::Io { path, source }
    }
}
