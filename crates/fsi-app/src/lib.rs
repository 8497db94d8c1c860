//! Service layer shared by the command-line front end.
//!
//! Wraps assembly, mesh regeneration, solver invocation and batch execution
//! behind collaborator traits so runs can be driven with fakes in tests.

pub mod batch;
pub mod error;
pub mod mesh;
pub mod run_service;
pub mod solver;

pub use batch::{BatchReport, DEFAULT_WORKERS, run_batch};
pub use error::{AppError, AppResult};
pub use mesh::{
    APEX_RADIUS, BoundaryFacet, CheartMeshIo, Mesh, MeshIo, create_apex_surface, remake_mesh,
};
pub use run_service::{RunOptions, RunOutcome, build_document, run, write_document};
pub use solver::{CheartRunner, SolverRunner, SolverStage};
