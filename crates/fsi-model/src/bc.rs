//! Dirichlet boundary-condition patches.

use fsi_core::{Domain, PatchRole};
use fsi_project::MeshDescription;

use crate::curve::BoundaryCurve;
use crate::error::{ModelError, ModelResult};
use crate::fields::{FieldVariable, FluidVariables, SolidVariables};

/// Prescribed value of a boundary condition.
#[derive(Debug, Clone, PartialEq)]
pub enum BcValue {
    /// One constant per component.
    Constant(Vec<f64>),
    Curve(String),
    /// Another field variable's value on the same patch.
    Variable(String),
}

impl BcValue {
    pub fn zeros(components: u8) -> Self {
        BcValue::Constant(vec![0.0; usize::from(components)])
    }
}

/// A Dirichlet condition on one labelled boundary patch.
#[derive(Debug, Clone, PartialEq)]
pub struct BcPatch {
    pub patch: u32,
    pub variable: String,
    pub value: BcValue,
}

impl BcPatch {
    pub fn kind(&self) -> &'static str {
        "dirichlet"
    }
}

/// Boundary conditions grouped by the sub-problem that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct BcPatches {
    pub solid: Vec<BcPatch>,
    pub fluid: Vec<BcPatch>,
    pub mesh_motion: Vec<BcPatch>,
}

fn patch(mesh: &MeshDescription, context: &str, domain: Domain, role: PatchRole) -> ModelResult<u32> {
    mesh.patch(domain, role).ok_or_else(|| ModelError::MissingPatch {
        context: context.to_string(),
        domain,
        role,
    })
}

fn zero(patch: u32, var: &FieldVariable) -> BcPatch {
    BcPatch {
        patch,
        variable: var.name.clone(),
        value: BcValue::zeros(var.components),
    }
}

/// Build the boundary conditions of every sub-problem.
///
/// - solid inlet: velocity held at zero
/// - fluid inlet: velocity follows `inlet_velocity`
/// - mesh motion: zero at the fluid inlet, equal to the fluid velocity on the
///   fluid–solid interface
pub fn build_bc_patches(
    mesh: &MeshDescription,
    svars: &SolidVariables,
    fvars: &FluidVariables,
    inlet_velocity: &BoundaryCurve,
) -> ModelResult<BcPatches> {
    let solid_inlet = patch(mesh, "solid inlet velocity", Domain::Solid, PatchRole::Inlet)?;
    let fluid_inlet = patch(mesh, "fluid inlet velocity", Domain::Fluid, PatchRole::Inlet)?;
    let ale_inlet = patch(mesh, "mesh motion at inlet", Domain::Fluid, PatchRole::Inlet)?;
    let ale_iface = patch(
        mesh,
        "mesh motion at fluid-solid interface",
        Domain::Fluid,
        PatchRole::Interface,
    )?;

    Ok(BcPatches {
        solid: vec![zero(solid_inlet, &svars.v)],
        fluid: vec![BcPatch {
            patch: fluid_inlet,
            variable: fvars.v.name.clone(),
            value: BcValue::Curve(inlet_velocity.name.clone()),
        }],
        mesh_motion: vec![
            zero(ale_inlet, &fvars.w),
            BcPatch {
                patch: ale_iface,
                variable: fvars.w.name.clone(),
                value: BcValue::Variable(fvars.v.name.clone()),
            },
        ],
    })
}
