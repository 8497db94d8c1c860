//! Single-problem execution: assemble, write, preprocess, solve.

use std::path::{Path, PathBuf};

use fsi_model::{Model, assemble, document};
use fsi_project::ProblemDescription;
use fsi_results::{RunManifest, is_complete};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::mesh::{MeshIo, remake_mesh};
use crate::solver::SolverRunner;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Re-run problems whose results are already complete.
    pub overwrite: bool,
    /// Directory holding the `fluid`/`solid` source meshes. When set, the
    /// mesh root is regenerated before the document is written.
    pub mesh_source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Results were complete and `overwrite` was off; nothing was touched.
    AlreadyComplete,
    Completed {
        document: PathBuf,
        manifest: PathBuf,
    },
}

/// Assemble a problem and render its solver input document.
pub fn build_document(desc: &ProblemDescription) -> AppResult<(Model, String)> {
    let model = assemble(desc)?;
    let text = document::render(&model);
    debug!(prefix = %desc.prefix, bytes = text.len(), "rendered document");
    Ok((model, text))
}

fn write_text(path: &Path, text: &str) -> AppResult<()> {
    std::fs::write(path, text).map_err(AppError::write(path))
}

/// Assemble a problem and write `<output>/<prefix>.P`.
///
/// Assembly errors surface before the file is created.
pub fn write_document(desc: &ProblemDescription) -> AppResult<PathBuf> {
    let (_, text) = build_document(desc)?;
    let path = desc.document_path();
    write_text(&path, &text)?;
    info!(prefix = %desc.prefix, path = %path.display(), "wrote solver input");
    Ok(path)
}

/// Run one problem end to end.
///
/// Complete results are left alone unless `opts.overwrite` is set. The model
/// is assembled before anything is written, so an inconsistent description
/// leaves the output directory untouched.
pub fn run(
    desc: &ProblemDescription,
    opts: &RunOptions,
    mesh_io: &dyn MeshIo,
    solver: &dyn SolverRunner,
) -> AppResult<RunOutcome> {
    if !opts.overwrite && is_complete(desc) {
        info!(prefix = %desc.prefix, "already complete, skipping");
        return Ok(RunOutcome::AlreadyComplete);
    }

    let (_, text) = build_document(desc)?;
    if let Some(source) = &opts.mesh_source {
        remake_mesh(source, &desc.mesh, mesh_io)?;
    }

    let run_dir = desc.run_dir();
    std::fs::create_dir_all(&run_dir).map_err(AppError::write(&run_dir))?;
    let document = desc.document_path();
    write_text(&document, &text)?;
    let manifest = RunManifest::new(desc, &text).save(desc)?;

    let cores = desc.options.cores;
    solver.run_preprocess(&document, cores, &desc.prep_log_path())?;
    solver.run_solve(&document, cores, &desc.solve_log_path())?;
    info!(prefix = %desc.prefix, "run complete");
    Ok(RunOutcome::Completed { document, manifest })
}
