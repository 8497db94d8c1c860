//! fsi-model: compiles a validated problem description into a coupled
//! fluid–structure model.
//!
//! Provides:
//! - Topology hierarchy and interface set ([`topology`])
//! - Field variables bound to topologies ([`fields`])
//! - Symbolic boundary curves ([`expr`], [`curve`])
//! - Boundary conditions, sub-problems and the solver plan ([`bc`], [`physics`], [`solver`])
//! - Model assembly, integrity checks and document export ([`assemble`], [`document`])
//!
//! # Example
//!
//! ```
//! use fsi_project::validate;
//! use serde_json::json;
//!
//! let problem = validate(&json!({
//!     "prefix": "neohookean_30",
//!     "time": {"start": 1, "end": 1000, "step": 0.001},
//!     "loading": [{"type": "Sine", "max_vel": 200.0, "period": 0.5, "cycles": 2}],
//!     "material": {"type": "NeoHookean", "k": [30000]}
//! }))
//! .unwrap();
//!
//! let model = fsi_model::assemble(&problem).unwrap();
//! assert_eq!(model.problems.len(), 6);
//! let text = fsi_model::document::render(&model);
//! assert!(text.contains("!DefSolverGroup={Main|Time"));
//! ```

pub mod assemble;
pub mod bc;
pub mod curve;
pub mod document;
pub mod error;
pub mod expr;
pub mod fields;
pub mod physics;
pub mod solver;
pub mod topology;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use assemble::{Model, assemble};
pub use bc::{BcPatch, BcPatches, BcValue, build_bc_patches};
pub use curve::{
    BoundaryCurve, SegmentWindow, TimeCurve, compile_inlet_velocity, compile_space_curve,
    compile_time_curve, dependency_order, segment_windows,
};
pub use document::PatchLabelError;
pub use error::{ModelError, ModelResult};
pub use expr::Expr;
pub use fields::{
    DataFormat, FieldOptions, FieldVariable, FluidVariables, SolidVariables, fluid_fields,
    solid_fields,
};
pub use physics::{MatrixKey, SubProblem};
pub use solver::{SolverPlan, build_solver_plan};
pub use topology::{
    Basis, Interface, InterfaceKey, InterfaceSet, ProblemTopology, Topology, build_topology,
};
