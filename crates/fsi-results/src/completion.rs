//! Completion check: a run is complete when both pressure traces hold one
//! row per time step.

use std::path::PathBuf;

use fsi_project::{APEX_PRESSURE_FILE, INLET_PRESSURE_FILE, ProblemDescription};

use crate::table::count_rows;

#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error("Result file missing: {0}")]
    MissingFile(PathBuf),

    #[error("Result file {path} has {found} rows, expected {expected}")]
    RowCount {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The result files a finished run leaves in its run directory.
pub fn result_files(desc: &ProblemDescription) -> [PathBuf; 2] {
    let dir = desc.run_dir();
    [dir.join(APEX_PRESSURE_FILE), dir.join(INLET_PRESSURE_FILE)]
}

/// Check that every result file exists with the expected row count.
///
/// Read-only; repeated calls give the same answer while the files are
/// untouched.
pub fn check_complete(desc: &ProblemDescription) -> Result<(), CompletionError> {
    let expected = desc.time.step_count();
    for path in result_files(desc) {
        if !path.is_file() {
            return Err(CompletionError::MissingFile(path));
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) => return Err(CompletionError::Io { path, source }),
        };
        let found = count_rows(&content);
        if found != expected {
            return Err(CompletionError::RowCount {
                path,
                found,
                expected,
            });
        }
    }
    Ok(())
}

pub fn is_complete(desc: &ProblemDescription) -> bool {
    check_complete(desc).is_ok()
}
