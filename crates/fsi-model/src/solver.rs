//! Solver plan: matrices, subgroups and the top-level solver group.

use fsi_project::{AssemblyOptions, TimeDef};

use crate::physics::{COUPLING, FLUID, MatrixKey, SOLID, SubProblem};

pub const MAIN_MATRIX: &str = "MainMatrix";
pub const MESH_MOTION_MATRIX: &str = "ALEMatrix";
pub const MAIN_GROUP: &str = "Main";
pub const TIME_SCHEME: &str = "Time";
pub const DIRECT_SOLVER: &str = "SOLVER_MUMPS";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeScheme {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverMatrix {
    pub name: String,
    pub solver: &'static str,
    pub problems: Vec<String>,
    pub settings: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgroupMethod {
    SeqFpLinesearch,
    SeqFp,
}

impl SubgroupMethod {
    pub fn label(self) -> &'static str {
        match self {
            SubgroupMethod::SeqFpLinesearch => "seq_fp_linesearch",
            SubgroupMethod::SeqFp => "seq_fp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubgroupMember {
    Matrix(String),
    Problem(String),
}

impl SubgroupMember {
    pub fn name(&self) -> &str {
        match self {
            SubgroupMember::Matrix(n) | SubgroupMember::Problem(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSubgroup {
    pub method: SubgroupMethod,
    pub members: Vec<SubgroupMember>,
    pub scale_first_residual: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverGroup {
    pub name: String,
    pub time: TimeScheme,
    pub subgroups: Vec<SolverSubgroup>,
    pub subiterations: u32,
    pub l2_tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverPlan {
    pub matrices: Vec<SolverMatrix>,
    pub group: SolverGroup,
}

impl SolverPlan {
    pub fn matrix(&self, name: &str) -> Option<&SolverMatrix> {
        self.matrices.iter().find(|m| m.name == name)
    }
}

fn matrix(name: &str, problems: Vec<String>) -> SolverMatrix {
    SolverMatrix {
        name: name.to_string(),
        solver: DIRECT_SOLVER,
        problems,
        settings: vec![(
            "SolverMatrixCalculation".to_string(),
            "EVALUATE_EVERY_BUILD".to_string(),
        )],
    }
}

// Fluid first, then solid, then the coupling block.
fn main_rank(name: &str) -> usize {
    [FLUID, SOLID, COUPLING]
        .iter()
        .position(|n| *n == name)
        .unwrap_or(usize::MAX)
}

/// Group the sub-problems into matrices and subgroups.
///
/// `MainMatrix` and `ALEMatrix` get a subgroup each; every standalone
/// problem gets its own `seq_fp` subgroup, in problem order.
pub fn build_solver_plan(
    problems: &[SubProblem],
    time: &TimeDef,
    opts: &AssemblyOptions,
) -> SolverPlan {
    let names_for = |key: MatrixKey| -> Vec<String> {
        problems
            .iter()
            .filter(|p| p.matrix_key() == key)
            .map(|p| p.name().to_string())
            .collect()
    };

    let mut main = names_for(MatrixKey::Main);
    main.sort_by_key(|n| main_rank(n));
    let matrices = vec![
        matrix(MAIN_MATRIX, main),
        matrix(MESH_MOTION_MATRIX, names_for(MatrixKey::MeshMotion)),
    ];

    let mut subgroups = vec![
        SolverSubgroup {
            method: SubgroupMethod::SeqFpLinesearch,
            members: vec![SubgroupMember::Matrix(MAIN_MATRIX.to_string())],
            scale_first_residual: Some(opts.scale_first_residual),
        },
        SolverSubgroup {
            method: SubgroupMethod::SeqFp,
            members: vec![SubgroupMember::Matrix(MESH_MOTION_MATRIX.to_string())],
            scale_first_residual: None,
        },
    ];
    subgroups.extend(names_for(MatrixKey::Standalone).into_iter().map(|name| SolverSubgroup {
        method: SubgroupMethod::SeqFp,
        members: vec![SubgroupMember::Problem(name)],
        scale_first_residual: None,
    }));

    SolverPlan {
        matrices,
        group: SolverGroup {
            name: MAIN_GROUP.to_string(),
            time: TimeScheme {
                name: TIME_SCHEME.to_string(),
                start: time.start,
                end: time.end,
                step: time.step,
            },
            subgroups,
            subiterations: opts.subiterations,
            l2_tolerance: opts.l2_tolerance,
        },
    }
}
