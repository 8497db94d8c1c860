use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fsi_app::{
    AppError, AppResult, BoundaryFacet, Mesh, MeshIo, RunOptions, RunOutcome, SolverRunner,
    SolverStage, run, run_batch, write_document,
};
use fsi_core::PatchRole;
use fsi_project::{ProblemDescription, validate};
use serde_json::json;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fsi_app_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn problem(out: &Path, prefix: &str) -> ProblemDescription {
    validate(&json!({
        "prefix": prefix,
        "output_dir": out.to_str().unwrap(),
        "time": {"start": 1, "end": 5, "step": 0.1},
        "loading": [{"type": "Ramp", "max_vel": 50.0, "duration": 0.5}],
        "material": {"type": "NeoHookean", "k": [30000]}
    }))
    .unwrap()
}

/// Pretends to solve by writing complete result tables.
#[derive(Default)]
struct FakeSolver {
    calls: Mutex<Vec<(SolverStage, PathBuf, u32, PathBuf)>>,
    fail_prefix: Option<String>,
}

impl FakeSolver {
    fn failing(prefix: &str) -> Self {
        Self {
            fail_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    fn stages(&self) -> Vec<SolverStage> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }
}

impl SolverRunner for FakeSolver {
    fn run_preprocess(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()> {
        self.calls.lock().unwrap().push((
            SolverStage::Preprocess,
            document.to_path_buf(),
            cores,
            log.to_path_buf(),
        ));
        Ok(())
    }

    fn run_solve(&self, document: &Path, cores: u32, log: &Path) -> AppResult<()> {
        self.calls.lock().unwrap().push((
            SolverStage::Solve,
            document.to_path_buf(),
            cores,
            log.to_path_buf(),
        ));
        let prefix = document.file_stem().unwrap().to_str().unwrap();
        if self.fail_prefix.as_deref() == Some(prefix) {
            return Err(AppError::Solver {
                stage: SolverStage::Solve,
                document: document.to_path_buf(),
                reason: "diverged".into(),
            });
        }
        let run_dir = document.with_extension("");
        let rows: String = (1..=5).map(|i| format!("{i} 1.0\n")).collect();
        std::fs::write(run_dir.join("apex_pressure-0.D"), &rows).unwrap();
        std::fs::write(run_dir.join("inlet_pressure-0.D"), &rows).unwrap();
        Ok(())
    }
}

/// Serves one fluid and one solid mesh and records saves.
#[derive(Default)]
struct FakeMeshIo {
    saved: Mutex<Vec<(PathBuf, Mesh)>>,
}

impl MeshIo for FakeMeshIo {
    fn load_mesh(&self, prefix: &Path) -> AppResult<Mesh> {
        let facet = |element, nodes: [usize; 2], label| BoundaryFacet {
            element,
            nodes: nodes.to_vec(),
            label,
        };
        Ok(Mesh {
            dim: 2,
            nodes: vec![
                vec![0.0, 0.0],
                vec![2.0, 0.0],
                vec![1.0, 3.0],
                vec![1.5, 2.0],
            ],
            elements: vec![vec![1, 2, 4], vec![1, 4, 3]],
            boundary: if prefix.ends_with("fluid") {
                vec![
                    facet(1, [1, 2], 1),
                    facet(1, [2, 4], 4),
                    facet(2, [4, 3], 4),
                    facet(2, [3, 1], 4),
                ]
            } else {
                vec![facet(1, [1, 2], 2)]
            },
        })
    }

    fn save_mesh(&self, mesh: &Mesh, prefix: &Path) -> AppResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push((prefix.to_path_buf(), mesh.clone()));
        Ok(())
    }
}

#[test]
fn run_writes_document_then_solves() {
    let out = scratch("run");
    let desc = problem(&out, "neohookean_30");
    let solver = FakeSolver::default();
    let outcome = run(&desc, &RunOptions::default(), &FakeMeshIo::default(), &solver).unwrap();

    let RunOutcome::Completed { document, manifest } = outcome else {
        panic!("run should complete");
    };
    assert_eq!(document, out.join("neohookean_30.P"));
    assert_eq!(manifest, out.join("neohookean_30").join("manifest.json"));
    let text = std::fs::read_to_string(&document).unwrap();
    assert!(text.contains("!SetOutputPath="));

    let calls = solver.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, SolverStage::Preprocess);
    assert_eq!(calls[0].2, 4);
    assert_eq!(calls[0].3, out.join("neohookean_30_prep.log"));
    assert_eq!(calls[1].0, SolverStage::Solve);
    assert_eq!(calls[1].3, out.join("neohookean_30.log"));
}

#[test]
fn complete_run_is_skipped_unless_overwrite() {
    let out = scratch("skip");
    let desc = problem(&out, "run_1");
    let mesh = FakeMeshIo::default();
    let first = FakeSolver::default();
    run(&desc, &RunOptions::default(), &mesh, &first).unwrap();

    let second = FakeSolver::default();
    let outcome = run(&desc, &RunOptions::default(), &mesh, &second).unwrap();
    assert_eq!(outcome, RunOutcome::AlreadyComplete);
    assert!(second.stages().is_empty());

    let opts = RunOptions {
        overwrite: true,
        ..RunOptions::default()
    };
    run(&desc, &opts, &mesh, &second).unwrap();
    assert_eq!(second.stages(), [SolverStage::Preprocess, SolverStage::Solve]);
}

#[test]
fn inconsistent_problem_writes_nothing() {
    let out = scratch("inconsistent");
    let mut desc = problem(&out, "run_1");
    desc.mesh.fluid_patches.remove(PatchRole::Inlet);
    let solver = FakeSolver::default();
    let err = run(&desc, &RunOptions::default(), &FakeMeshIo::default(), &solver).unwrap_err();
    assert!(matches!(err, AppError::Model(_)));
    assert!(solver.stages().is_empty());
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    assert!(write_document(&desc).is_err());
    assert!(!desc.document_path().exists());
}

#[test]
fn mesh_regeneration_adds_apex_patch() {
    let out = scratch("remesh");
    let desc = problem(&out, "run_1");
    let mesh = FakeMeshIo::default();
    let opts = RunOptions {
        overwrite: false,
        mesh_source: Some(out.join("source")),
    };
    run(&desc, &opts, &mesh, &FakeSolver::default()).unwrap();

    let saved = mesh.saved.lock().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].0, out.join("mesh").join("fluid_lin"));
    assert_eq!(saved[1].0, out.join("mesh").join("solid_lin"));
    assert!(saved[0].1.has_patch(5));
    assert!(out.join("mesh").is_dir());
}

#[test]
fn batch_reports_each_problem() {
    let out = scratch("batch");
    let descs: Vec<ProblemDescription> = ["nh_10", "nh_20", "nh_30"]
        .iter()
        .map(|p| problem(&out, p))
        .collect();
    let solver = FakeSolver::failing("nh_20");
    let mesh = FakeMeshIo::default();
    let opts = RunOptions {
        overwrite: false,
        mesh_source: Some(out.join("source")),
    };
    let report = run_batch(&descs, &opts, 2, &mesh, &solver).unwrap();

    let prefixes: Vec<&str> = report.results.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(prefixes, ["nh_10", "nh_20", "nh_30"]);
    let failures: Vec<&str> = report.failures().map(|(p, _)| p).collect();
    assert_eq!(failures, ["nh_20"]);
    assert!(!report.is_success());
    assert!(matches!(report.results[0].1, Ok(RunOutcome::Completed { .. })));
    assert!(matches!(report.results[2].1, Ok(RunOutcome::Completed { .. })));
    assert_eq!(mesh.saved.lock().unwrap().len(), 2);
}
