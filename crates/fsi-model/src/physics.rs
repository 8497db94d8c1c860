//! Sub-problems of the coupled system.
//!
//! Each constructor wires field variables (by name) into one physics block.
//! Constructors that introduce auxiliary variables return them alongside the
//! problem so the assembler can register them with the model.

use fsi_project::{
    APEX_PRESSURE_FILE, AssemblyOptions, ExportFrequency, INLET_PRESSURE_FILE, MaterialDescription,
};

use crate::bc::{BcPatch, BcValue};
use crate::fields::{FieldOptions, FieldVariable, FluidVariables, SolidVariables};
use crate::topology::ProblemTopology;

pub const SOLID: &str = "Solid";
pub const FLUID: &str = "Fluid";
pub const MESH_MOTION: &str = "ALE";
pub const COUPLING: &str = "InterfaceCoupling";
pub const APEX_PRESSURE: &str = "P_ApexPressure";
pub const INLET_PRESSURE: &str = "P_InletPressure";

/// Which solver matrix a sub-problem is assembled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatrixKey {
    /// Monolithic fluid + solid + coupling system.
    Main,
    MeshMotion,
    /// Solved on its own, outside any matrix.
    Standalone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidProblem {
    pub space: String,
    pub displacement: String,
    pub velocity: String,
    pub pressure: String,
    pub law: &'static str,
    pub coefficients: Vec<f64>,
    pub density: f64,
    /// Nearly-incompressible stabilization weight, when enabled.
    pub stabilization: Option<f64>,
    pub bcs: Vec<BcPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidProblem {
    pub space: String,
    pub velocity: String,
    pub pressure: String,
    pub domain_velocity: String,
    pub viscosity: f64,
    pub density: f64,
    pub root_topology: String,
    pub flags: Vec<&'static str>,
    pub bcs: Vec<BcPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshMotionProblem {
    /// Reference fluid coordinates.
    pub space: String,
    pub domain_velocity: String,
    /// Moving fluid coordinates this problem updates.
    pub ale_space: String,
    pub quality: String,
    pub stiffness: String,
    pub penalty: f64,
    pub root_topology: String,
    pub flags: Vec<&'static str>,
    pub bcs: Vec<BcPatch>,
}

/// `coefficient * variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingTerm {
    pub variable: String,
    pub coefficient: f64,
}

impl CouplingTerm {
    pub fn new(variable: &FieldVariable, coefficient: f64) -> Self {
        Self {
            variable: variable.name.clone(),
            coefficient,
        }
    }
}

/// Velocity continuity across the fluid–solid interface via a Lagrange multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingProblem {
    pub space: String,
    pub root_topology: String,
    pub multiplier: String,
    /// Terms of the constraint the multiplier enforces.
    pub constraint: Vec<CouplingTerm>,
    /// Multiplier contributions to each coupled variable's equation.
    pub terms: Vec<(String, CouplingTerm)>,
    pub bcs: Vec<BcPatch>,
}

/// Boundary integral of a variable, exported as a time series.
#[derive(Debug, Clone, PartialEq)]
pub struct NormProblem {
    pub name: &'static str,
    pub space: String,
    pub variable: String,
    pub norm: u8,
    pub scale_by_measure: bool,
    pub export_file: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubProblem {
    Solid(SolidProblem),
    Fluid(FluidProblem),
    MeshMotion(MeshMotionProblem),
    Coupling(CouplingProblem),
    Norm(NormProblem),
}

impl SubProblem {
    pub fn name(&self) -> &str {
        match self {
            SubProblem::Solid(_) => SOLID,
            SubProblem::Fluid(_) => FLUID,
            SubProblem::MeshMotion(_) => MESH_MOTION,
            SubProblem::Coupling(_) => COUPLING,
            SubProblem::Norm(p) => p.name,
        }
    }

    pub fn matrix_key(&self) -> MatrixKey {
        match self {
            SubProblem::Solid(_) | SubProblem::Fluid(_) | SubProblem::Coupling(_) => {
                MatrixKey::Main
            }
            SubProblem::MeshMotion(_) => MatrixKey::MeshMotion,
            SubProblem::Norm(_) => MatrixKey::Standalone,
        }
    }

    /// Every field variable the problem reads or writes, BC targets included.
    pub fn variables(&self) -> Vec<&str> {
        let names: Vec<&String> = match self {
            SubProblem::Solid(p) => vec![&p.space, &p.displacement, &p.velocity, &p.pressure],
            SubProblem::Fluid(p) => vec![&p.space, &p.velocity, &p.pressure, &p.domain_velocity],
            SubProblem::MeshMotion(p) => vec![
                &p.space,
                &p.domain_velocity,
                &p.ale_space,
                &p.quality,
                &p.stiffness,
            ],
            SubProblem::Coupling(p) => {
                let mut v = vec![&p.space, &p.multiplier];
                v.extend(p.constraint.iter().map(|t| &t.variable));
                for (target, term) in &p.terms {
                    v.push(target);
                    v.push(&term.variable);
                }
                v
            }
            SubProblem::Norm(p) => vec![&p.space, &p.variable],
        };
        let mut out: Vec<&str> = names.into_iter().map(String::as_str).collect();
        for bc in self.bcs() {
            out.push(&bc.variable);
            if let BcValue::Variable(name) = &bc.value {
                out.push(name);
            }
        }
        out
    }

    pub fn bcs(&self) -> &[BcPatch] {
        match self {
            SubProblem::Solid(p) => p.bcs.as_slice(),
            SubProblem::Fluid(p) => p.bcs.as_slice(),
            SubProblem::MeshMotion(p) => p.bcs.as_slice(),
            SubProblem::Coupling(p) => p.bcs.as_slice(),
            SubProblem::Norm(_) => &[],
        }
    }

    pub fn root_topology(&self) -> Option<&str> {
        match self {
            SubProblem::Fluid(p) => Some(p.root_topology.as_str()),
            SubProblem::MeshMotion(p) => Some(p.root_topology.as_str()),
            SubProblem::Coupling(p) => Some(p.root_topology.as_str()),
            SubProblem::Solid(_) | SubProblem::Norm(_) => None,
        }
    }
}

pub fn solid_problem(
    material: &MaterialDescription,
    svars: &SolidVariables,
    bcs: Vec<BcPatch>,
    opts: &AssemblyOptions,
) -> SolidProblem {
    let stabilize = opts
        .stabilization
        .applies(svars.u.order.degree(), svars.p.order.degree());
    SolidProblem {
        space: svars.x.name.clone(),
        displacement: svars.u.name.clone(),
        velocity: svars.v.name.clone(),
        pressure: svars.p.name.clone(),
        law: material.law(),
        coefficients: material.coefficients(),
        density: opts.solid_density,
        stabilization: stabilize.then_some(opts.stabilization_weight),
        bcs,
    }
}

pub fn fluid_problem(
    top: &ProblemTopology,
    fvars: &FluidVariables,
    bcs: Vec<BcPatch>,
    opts: &AssemblyOptions,
) -> FluidProblem {
    FluidProblem {
        space: fvars.xt.name.clone(),
        velocity: fvars.v.name.clone(),
        pressure: fvars.p.name.clone(),
        domain_velocity: fvars.w.name.clone(),
        viscosity: opts.viscosity,
        density: opts.fluid_density,
        root_topology: top.fluid2.name.clone(),
        flags: vec!["True-Navier-Poisson"],
        bcs,
    }
}

/// Mesh-motion problem plus its element quality and stiffness scalars.
pub fn mesh_motion_problem(
    top: &ProblemTopology,
    fvars: &FluidVariables,
    bcs: Vec<BcPatch>,
    opts: &AssemblyOptions,
    field_opts: FieldOptions,
) -> (MeshMotionProblem, Vec<FieldVariable>) {
    let quality = FieldVariable::new("ALEquality", &top.fluid0, 1, field_opts);
    let stiffness = FieldVariable::new("ALEstiffness", &top.fluid0, 1, field_opts);
    let problem = MeshMotionProblem {
        space: fvars.x0.name.clone(),
        domain_velocity: fvars.w.name.clone(),
        ale_space: fvars.xt.name.clone(),
        quality: quality.name.clone(),
        stiffness: stiffness.name.clone(),
        penalty: opts.ale_penalty,
        root_topology: top.fluid2.name.clone(),
        flags: vec!["Radius-ratio-metric"],
        bcs,
    };
    (problem, vec![quality, stiffness])
}

/// Interface coupling problem plus its multiplier and interface coordinates.
///
/// The multiplier is pinned to zero on `opts.lm_pinned_patch` of the
/// interface topology.
pub fn coupling_problem(
    top: &ProblemTopology,
    svars: &SolidVariables,
    fvars: &FluidVariables,
    opts: &AssemblyOptions,
    field_opts: FieldOptions,
) -> (CouplingProblem, Vec<FieldVariable>) {
    let lm = FieldVariable::new("IfLM", &top.bnd, 2, field_opts);
    let space = FieldVariable::mesh_coordinates("IfX", &top.bnd, 2, field_opts);
    let problem = CouplingProblem {
        space: space.name.clone(),
        root_topology: top.bnd.name.clone(),
        multiplier: lm.name.clone(),
        constraint: vec![CouplingTerm::new(&fvars.v, 1.0), CouplingTerm::new(&svars.v, -1.0)],
        terms: vec![
            (fvars.v.name.clone(), CouplingTerm::new(&lm, 1.0)),
            (svars.v.name.clone(), CouplingTerm::new(&lm, -1.0)),
        ],
        bcs: vec![BcPatch {
            patch: opts.lm_pinned_patch,
            variable: lm.name.clone(),
            value: BcValue::zeros(lm.components),
        }],
    };
    (problem, vec![lm, space])
}

/// Apex and inlet pressure measurements plus their boundary coordinate fields.
pub fn pressure_problems(
    top: &ProblemTopology,
    fvars: &FluidVariables,
    field_opts: FieldOptions,
) -> ([NormProblem; 2], Vec<FieldVariable>) {
    let coords_opts = FieldOptions {
        freq: ExportFrequency::EveryStep,
        ..field_opts
    };
    let apex_x = FieldVariable::mesh_coordinates("ApexX", &top.apex, 2, coords_opts);
    let inlet_x = FieldVariable::mesh_coordinates("InletX", &top.inlet, 2, coords_opts);
    let norm = |name, space: &FieldVariable, export_file| NormProblem {
        name,
        space: space.name.clone(),
        variable: fvars.p.name.clone(),
        norm: 1,
        scale_by_measure: true,
        export_file,
    };
    let problems = [
        norm(APEX_PRESSURE, &apex_x, APEX_PRESSURE_FILE),
        norm(INLET_PRESSURE, &inlet_x, INLET_PRESSURE_FILE),
    ];
    (problems, vec![apex_x, inlet_x])
}
