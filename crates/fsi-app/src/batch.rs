//! Batch execution on a fixed-size worker pool.

use std::collections::BTreeSet;
use std::path::PathBuf;

use fsi_project::ProblemDescription;
use fsi_results::is_complete;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::mesh::{MeshIo, remake_mesh};
use crate::run_service::{RunOptions, RunOutcome, run};
use crate::solver::SolverRunner;

pub const DEFAULT_WORKERS: usize = 6;

/// Per-problem outcomes, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<(String, AppResult<RunOutcome>)>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &AppError)> + '_ {
        self.results
            .iter()
            .filter_map(|(prefix, r)| r.as_ref().err().map(|e| (prefix.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Run every problem on a pool of `workers` threads.
///
/// Meshes are regenerated once per distinct mesh root before the pool starts,
/// since problems commonly share one. A failing problem never stops its
/// siblings; failures are collected in the report.
pub fn run_batch(
    descs: &[ProblemDescription],
    opts: &RunOptions,
    workers: usize,
    mesh_io: &dyn MeshIo,
    solver: &dyn SolverRunner,
) -> AppResult<BatchReport> {
    let mut mesh_errors: Vec<(PathBuf, String)> = Vec::new();
    if let Some(source) = &opts.mesh_source {
        let mut seen = BTreeSet::new();
        let pending = descs
            .iter()
            .filter(|d| opts.overwrite || !is_complete(d));
        for desc in pending {
            if !seen.insert(desc.mesh.home.clone()) {
                continue;
            }
            if let Err(err) = remake_mesh(source, &desc.mesh, mesh_io) {
                warn!(home = %desc.mesh.home.display(), error = %err, "mesh regeneration failed");
                mesh_errors.push((desc.mesh.home.clone(), err.to_string()));
            }
        }
    }
    let per_problem = RunOptions {
        mesh_source: None,
        ..opts.clone()
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| AppError::Pool(e.to_string()))?;
    info!(problems = descs.len(), workers, "starting batch");

    let results = pool.install(|| {
        descs
            .par_iter()
            .map(|desc| {
                let failed_mesh = mesh_errors
                    .iter()
                    .find(|(home, _)| *home == desc.mesh.home);
                let outcome = match failed_mesh {
                    Some(_) if !opts.overwrite && is_complete(desc) => {
                        Ok(RunOutcome::AlreadyComplete)
                    }
                    Some((home, reason)) => Err(AppError::Mesh {
                        path: home.clone(),
                        reason: reason.clone(),
                    }),
                    None => run(desc, &per_problem, mesh_io, solver),
                };
                if let Err(err) = &outcome {
                    warn!(prefix = %desc.prefix, error = %err, "problem failed");
                }
                (desc.prefix.clone(), outcome)
            })
            .collect()
    });
    Ok(BatchReport { results })
}
