//! Typed problem description produced by the validator.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use fsi_core::{Domain, ElementKind, OrderLevel, PatchRole};
use serde::Serialize;

/// Names of the two result tables every completed run produces.
pub const APEX_PRESSURE_FILE: &str = "apex_pressure-0.D";
pub const INLET_PRESSURE_FILE: &str = "inlet_pressure-0.D";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProblemDescription {
    pub prefix: String,
    pub output_dir: PathBuf,
    pub time: TimeDef,
    pub mesh: MeshDescription,
    pub loading: LoadingDescription,
    pub material: MaterialDescription,
    pub options: AssemblyOptions,
}

impl ProblemDescription {
    /// Directory the solver writes this problem's results into.
    pub fn run_dir(&self) -> PathBuf {
        self.output_dir.join(&self.prefix)
    }

    /// Location of the generated solver input document.
    pub fn document_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.P", self.prefix))
    }

    pub fn prep_log_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_prep.log", self.prefix))
    }

    pub fn solve_log_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.log", self.prefix))
    }
}

/// Time-stepping parameters: integer step indices and a real step size.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TimeDef {
    pub start: i64,
    pub end: i64,
    pub step: f64,
}

impl TimeDef {
    /// Number of steps the solver takes, and the number of rows each result
    /// table holds once a run is complete.
    pub fn step_count(&self) -> usize {
        self.end
            .checked_sub(self.start)
            .and_then(|span| span.checked_add(1))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Physical time of every step index in `start..=end`.
    pub fn time_axis(&self) -> Vec<f64> {
        (self.start..=self.end)
            .map(|i| i as f64 * self.step)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MeshFileDef {
    pub name: String,
    pub elem: ElementKind,
}

/// Boundary-patch labels of one domain mesh, keyed by role.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BoundaryPatches(BTreeMap<PatchRole, u32>);

impl BoundaryPatches {
    pub fn new(apex: u32, inlet: u32, interface: u32) -> Self {
        Self(BTreeMap::from([
            (PatchRole::Apex, apex),
            (PatchRole::Inlet, inlet),
            (PatchRole::Interface, interface),
        ]))
    }

    pub fn get(&self, role: PatchRole) -> Option<u32> {
        self.0.get(&role).copied()
    }

    pub fn insert(&mut self, role: PatchRole, id: u32) -> Option<u32> {
        self.0.insert(role, id)
    }

    pub fn remove(&mut self, role: PatchRole) -> Option<u32> {
        self.0.remove(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatchRole, u32)> + '_ {
        self.0.iter().map(|(role, id)| (*role, *id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PatchRole, u32)> for BoundaryPatches {
    fn from_iter<I: IntoIterator<Item = (PatchRole, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Mesh files per order level and boundary-patch labels for both domains.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeshDescription {
    pub home: PathBuf,
    pub solid: BTreeMap<OrderLevel, MeshFileDef>,
    pub fluid: BTreeMap<OrderLevel, MeshFileDef>,
    pub solid_patches: BoundaryPatches,
    pub fluid_patches: BoundaryPatches,
}

impl MeshDescription {
    /// The ventricle layout the bundled meshes are generated with.
    pub fn standard(home: impl Into<PathBuf>) -> Self {
        let tri = |name: &str| MeshFileDef {
            name: name.to_string(),
            elem: ElementKind::Triangle,
        };
        Self {
            home: home.into(),
            solid: BTreeMap::from([
                (OrderLevel::Lin, tri("solid_lin")),
                (OrderLevel::Quad, tri("solid_quad")),
            ]),
            fluid: BTreeMap::from([
                (OrderLevel::Const, tri("fluid_const")),
                (OrderLevel::Lin, tri("fluid_lin")),
                (OrderLevel::Quad, tri("fluid_quad")),
            ]),
            solid_patches: BoundaryPatches::new(5, 2, 4),
            fluid_patches: BoundaryPatches::new(5, 1, 4),
        }
    }

    /// Order levels the model builder needs for each domain.
    pub fn required_orders(domain: Domain) -> &'static [OrderLevel] {
        match domain {
            Domain::Solid => &[OrderLevel::Lin, OrderLevel::Quad],
            Domain::Fluid => &[OrderLevel::Const, OrderLevel::Lin, OrderLevel::Quad],
        }
    }

    pub fn meshes(&self, domain: Domain) -> &BTreeMap<OrderLevel, MeshFileDef> {
        match domain {
            Domain::Solid => &self.solid,
            Domain::Fluid => &self.fluid,
        }
    }

    pub fn patches(&self, domain: Domain) -> &BoundaryPatches {
        match domain {
            Domain::Solid => &self.solid_patches,
            Domain::Fluid => &self.fluid_patches,
        }
    }

    pub fn patches_mut(&mut self, domain: Domain) -> &mut BoundaryPatches {
        match domain {
            Domain::Solid => &mut self.solid_patches,
            Domain::Fluid => &mut self.fluid_patches,
        }
    }

    pub fn patch(&self, domain: Domain, role: PatchRole) -> Option<u32> {
        self.patches(domain).get(role)
    }

    pub fn mesh_path(&self, file: &MeshFileDef) -> PathBuf {
        self.home.join(&file.name)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

/// One time-bounded contribution to the inlet time curve.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum CurveSegment {
    Sine {
        max_vel: f64,
        period: f64,
        cycles: u32,
    },
    Hold {
        duration: f64,
    },
    Ramp {
        max_vel: f64,
        duration: f64,
    },
}

impl CurveSegment {
    /// Length of the time slice this segment occupies.
    pub fn duration(&self) -> f64 {
        match *self {
            CurveSegment::Sine { period, cycles, .. } => period * f64::from(cycles),
            CurveSegment::Hold { duration } => duration,
            CurveSegment::Ramp { duration, .. } => duration,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CurveSegment::Sine { .. } => "Sine",
            CurveSegment::Hold { .. } => "Hold",
            CurveSegment::Ramp { .. } => "Ramp",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum SpaceProfile {
    #[serde(rename = "parabolic")]
    ParabolicJet { width: f64 },
}

impl SpaceProfile {
    pub const DEFAULT_JET_WIDTH: f64 = 15.0;
}

impl Default for SpaceProfile {
    fn default() -> Self {
        SpaceProfile::ParabolicJet {
            width: Self::DEFAULT_JET_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadingDescription {
    pub time: Vec<CurveSegment>,
    pub space: SpaceProfile,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum MaterialDescription {
    NeoHookean { k: f64 },
    #[serde(rename = "isotropic-exponential")]
    IsotropicExponential { k: f64, b: f64 },
}

impl MaterialDescription {
    /// Constitutive law name as the solver spells it.
    pub fn law(&self) -> &'static str {
        match self {
            MaterialDescription::NeoHookean { .. } => "NeoHookean",
            MaterialDescription::IsotropicExponential { .. } => "isotropic-exponential",
        }
    }

    pub fn coefficients(&self) -> Vec<f64> {
        match *self {
            MaterialDescription::NeoHookean { k } => vec![k],
            MaterialDescription::IsotropicExponential { k, b } => vec![k, b],
        }
    }
}

/// How often a variable is written to disk.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(into = "i64")]
pub enum ExportFrequency {
    /// Every step, no down-sampling (`-1`).
    #[default]
    EveryStep,
    /// Every Nth step.
    Every(NonZeroU32),
}

impl ExportFrequency {
    pub fn value(self) -> i64 {
        match self {
            ExportFrequency::EveryStep => -1,
            ExportFrequency::Every(n) => i64::from(n.get()),
        }
    }

    /// Accepts `-1` or a positive step count.
    pub fn from_value(value: i64) -> Option<Self> {
        if value == -1 {
            return Some(ExportFrequency::EveryStep);
        }
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(ExportFrequency::Every)
    }
}

impl From<ExportFrequency> for i64 {
    fn from(freq: ExportFrequency) -> Self {
        freq.value()
    }
}

/// When the solid problem gets nearly-incompressible stabilization.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StabilizationPolicy {
    /// Stabilize when displacement and pressure share a polynomial order.
    #[default]
    OrdersEqual,
    Always,
    Never,
}

impl StabilizationPolicy {
    pub fn applies(self, displacement_order: u8, pressure_order: u8) -> bool {
        match self {
            StabilizationPolicy::OrdersEqual => displacement_order == pressure_order,
            StabilizationPolicy::Always => true,
            StabilizationPolicy::Never => false,
        }
    }
}

/// Physical constants and solver settings that are not part of the loading
/// or material definition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssemblyOptions {
    pub viscosity: f64,
    pub fluid_density: f64,
    pub solid_density: f64,
    pub ale_penalty: f64,
    pub stabilization: StabilizationPolicy,
    pub stabilization_weight: f64,
    pub export_frequency: ExportFrequency,
    pub binary_output: bool,
    /// Sub-boundary of the interface topology where the multiplier is pinned.
    pub lm_pinned_patch: u32,
    pub subiterations: u32,
    pub l2_tolerance: f64,
    pub scale_first_residual: f64,
    pub cores: u32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            viscosity: 4.0e-3,
            fluid_density: 1.0e-3,
            solid_density: 1.0e-3,
            ale_penalty: 1.0,
            stabilization: StabilizationPolicy::OrdersEqual,
            stabilization_weight: 100.0,
            export_frequency: ExportFrequency::EveryStep,
            binary_output: false,
            lm_pinned_patch: 1,
            subiterations: 12,
            l2_tolerance: 1.0e-8,
            scale_first_residual: 1000.0,
            cores: 4,
        }
    }
}
