//! Model assembly: composes topology, fields, curves and sub-problems.

use std::collections::BTreeMap;
use std::path::PathBuf;

use fsi_core::Domain;
use fsi_project::{BoundaryPatches, ProblemDescription, TimeDef};
use tracing::debug;

use crate::bc::build_bc_patches;
use crate::curve::{
    BoundaryCurve, SegmentWindow, compile_inlet_velocity, compile_space_curve, compile_time_curve,
};
use crate::error::ModelResult;
use crate::fields::{FieldOptions, FieldVariable, fluid_fields, solid_fields};
use crate::physics::{
    SubProblem, coupling_problem, fluid_problem, mesh_motion_problem, pressure_problems,
    solid_problem,
};
use crate::solver::{SolverPlan, build_solver_plan};
use crate::topology::{ProblemTopology, Topology, build_topology};
use crate::validate::validate_model;

/// A fully assembled, referentially consistent model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub prefix: String,
    pub time: TimeDef,
    pub topology: ProblemTopology,
    pub variables: Vec<FieldVariable>,
    /// Declaration order; dependencies precede dependents.
    pub curves: Vec<BoundaryCurve>,
    pub windows: Vec<SegmentWindow>,
    pub problems: Vec<SubProblem>,
    pub plan: SolverPlan,
    /// Boundary-patch labels the model was built against.
    pub patches: BTreeMap<Domain, BoundaryPatches>,
    /// Directory the solver writes results into.
    pub output_path: PathBuf,
}

impl Model {
    pub fn variable(&self, name: &str) -> Option<&FieldVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn curve(&self, name: &str) -> Option<&BoundaryCurve> {
        self.curves.iter().find(|c| c.name == name)
    }

    pub fn problem(&self, name: &str) -> Option<&SubProblem> {
        self.problems.iter().find(|p| p.name() == name)
    }

    pub fn topology(&self, name: &str) -> Option<&Topology> {
        self.topology.find(name)
    }
}

/// Compile a validated problem description into a model.
///
/// Pure: no file is read or written. Any construction invariant violation
/// aborts with a [`ModelError`](crate::ModelError).
pub fn assemble(desc: &ProblemDescription) -> ModelResult<Model> {
    let top = build_topology(&desc.mesh)?;
    let field_opts = FieldOptions::from(&desc.options);
    let svars = solid_fields(&top, field_opts);
    let fvars = fluid_fields(&top, field_opts);

    let time_curve = compile_time_curve(&desc.loading.time)?;
    let space_curve = compile_space_curve(&desc.loading.space, &fvars.xt)?;
    let inlet_velocity = compile_inlet_velocity(&time_curve.curve, &space_curve)?;
    debug!(
        prefix = %desc.prefix,
        segments = time_curve.windows.len(),
        duration = time_curve.total_duration(),
        "compiled inlet loading"
    );

    let bcs = build_bc_patches(&desc.mesh, &svars, &fvars, &inlet_velocity)?;
    let opts = &desc.options;
    let solid = solid_problem(&desc.material, &svars, bcs.solid, opts);
    let fluid = fluid_problem(&top, &fvars, bcs.fluid, opts);
    let (ale, ale_vars) = mesh_motion_problem(&top, &fvars, bcs.mesh_motion, opts, field_opts);
    let (coupling, coupling_vars) = coupling_problem(&top, &svars, &fvars, opts, field_opts);
    let ([apex, inlet], pressure_vars) = pressure_problems(&top, &fvars, field_opts);

    let problems = vec![
        SubProblem::Solid(solid),
        SubProblem::Fluid(fluid),
        SubProblem::MeshMotion(ale),
        SubProblem::Coupling(coupling),
        SubProblem::Norm(apex),
        SubProblem::Norm(inlet),
    ];
    let plan = build_solver_plan(&problems, &desc.time, opts);

    let mut variables: Vec<FieldVariable> = svars.all().into_iter().cloned().collect();
    variables.extend(fvars.all().into_iter().cloned());
    variables.extend(ale_vars);
    variables.extend(coupling_vars);
    variables.extend(pressure_vars);

    let mut curves = time_curve.parts;
    curves.push(time_curve.curve);
    curves.push(space_curve);
    curves.push(inlet_velocity);

    let patches = Domain::ALL
        .into_iter()
        .map(|d| (d, desc.mesh.patches(d).clone()))
        .collect();

    let model = Model {
        prefix: desc.prefix.clone(),
        time: desc.time,
        topology: top,
        variables,
        curves,
        windows: time_curve.windows,
        problems,
        plan,
        patches,
        output_path: desc.run_dir(),
    };
    validate_model(&model)?;
    debug!(
        prefix = %model.prefix,
        variables = model.variables.len(),
        curves = model.curves.len(),
        problems = model.problems.len(),
        "assembled model"
    );
    Ok(model)
}
