//! Error types for the fsi-app service layer.

use std::path::PathBuf;

use crate::solver::SolverStage;

/// Unified error for the front end; backend errors are carried as text.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Model assembly failed: {0}")]
    Model(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Mesh error in {path}: {reason}")]
    Mesh { path: PathBuf, reason: String },

    #[error("Solver {stage} failed for {document}: {reason}")]
    Solver {
        stage: SolverStage,
        document: PathBuf,
        reason: String,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{failed} of {total} problems failed")]
    Batch { failed: usize, total: usize },

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<fsi_project::ProjectError> for AppError {
    fn from(err: fsi_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<fsi_project::ValidationError> for AppError {
    fn from(err: fsi_project::ValidationError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<fsi_model::ModelError> for AppError {
    fn from(err: fsi_model::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<fsi_results::ResultsError> for AppError {
    fn from(err: fsi_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<fsi_results::CompletionError> for AppError {
    fn from(err: fsi_results::CompletionError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl AppError {
    pub(crate) fn write(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> AppError {
        let path = path.into();
        move |source| AppError::Write { path, source }
    }
}
