//! Solver collaborator: preprocessing and solving a written input document.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStage {
    Preprocess,
    Solve,
}

impl fmt::Display for SolverStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverStage::Preprocess => "preprocessing",
            SolverStage::Solve => "solve",
        })
    }
}

/// Runs the external solver on a document, logging to `log`.
pub trait SolverRunner: Send + Sync {
    fn run_preprocess(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()>;
    fn run_solve(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()>;
}

/// Launches the solver binary as a child process.
///
/// Preprocessing runs serially with `--prep`; solving goes through the MPI
/// launcher when more than one core is requested.
#[derive(Debug, Clone)]
pub struct CheartRunner {
    pub program: PathBuf,
    pub mpi_launcher: PathBuf,
}

impl Default for CheartRunner {
    fn default() -> Self {
        Self {
            program: PathBuf::from("cheartsolver.out"),
            mpi_launcher: PathBuf::from("mpiexec"),
        }
    }
}

impl CheartRunner {
    fn command(&self, document: &Path, cores: u32, stage: SolverStage) -> Command {
        let mut cmd = match stage {
            SolverStage::Solve if cores > 1 => {
                let mut cmd = Command::new(&self.mpi_launcher);
                cmd.arg("-n").arg(cores.to_string()).arg(&self.program);
                cmd
            }
            _ => Command::new(&self.program),
        };
        cmd.arg(document);
        if stage == SolverStage::Preprocess {
            cmd.arg("--prep");
        }
        cmd
    }

    fn launch(&self, document: &Path, cores: u32, log: &Path, stage: SolverStage) -> AppResult<()> {
        let failed = |reason: String| AppError::Solver {
            stage,
            document: document.to_path_buf(),
            reason,
        };
        let out = File::create(log).map_err(AppError::write(log))?;
        let err = out.try_clone()?;
        let mut cmd = self.command(document, cores, stage);
        cmd.stdout(Stdio::from(out)).stderr(Stdio::from(err));

        info!(%stage, document = %document.display(), cores, log = %log.display(), "launching solver");
        let status = cmd
            .status()
            .map_err(|e| failed(format!("cannot launch {}: {e}", self.program.display())))?;
        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("{status}, see {}", log.display())))
        }
    }
}

impl SolverRunner for CheartRunner {
    fn run_preprocess(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()> {
        self.launch(document, cores, log, SolverStage::Preprocess)
    }

    fn run_solve(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()> {
        self.launch(document, cores, log, SolverStage::Solve)
    }
}
