//! Field variables attached to topologies.

use std::path::PathBuf;

use fsi_core::OrderLevel;
use fsi_project::{AssemblyOptions, ExportFrequency};

use crate::topology::{ProblemTopology, Topology};

/// On-disk encoding of exported variable data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataFormat {
    #[default]
    Text,
    Binary,
}

impl DataFormat {
    pub fn tag(self) -> &'static str {
        match self {
            DataFormat::Text => "TXT",
            DataFormat::Binary => "BINARY",
        }
    }
}

/// Export settings shared by every variable the factory creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub freq: ExportFrequency,
    pub format: DataFormat,
}

impl From<&AssemblyOptions> for FieldOptions {
    fn from(opts: &AssemblyOptions) -> Self {
        Self {
            freq: opts.export_frequency,
            format: if opts.binary_output {
                DataFormat::Binary
            } else {
                DataFormat::Text
            },
        }
    }
}

/// A named field over a topology.
///
/// `order` always equals the order of `topology`; the factory copies it at
/// construction so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVariable {
    pub name: String,
    pub topology: String,
    pub order: OrderLevel,
    pub components: u8,
    /// Initial data file, for fields that are the mesh coordinates.
    pub mesh_data: Option<PathBuf>,
    pub freq: ExportFrequency,
    pub format: DataFormat,
}

impl FieldVariable {
    pub fn new(name: impl Into<String>, top: &Topology, components: u8, opts: FieldOptions) -> Self {
        Self {
            name: name.into(),
            topology: top.name.clone(),
            order: top.order,
            components,
            mesh_data: None,
            freq: opts.freq,
            format: opts.format,
        }
    }

    /// Coordinate field initialised from the topology's own mesh.
    pub fn mesh_coordinates(
        name: impl Into<String>,
        top: &Topology,
        components: u8,
        opts: FieldOptions,
    ) -> Self {
        let mut var = Self::new(name, top, components, opts);
        var.mesh_data = Some(top.mesh.clone());
        var
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidVariables {
    /// Reference coordinates.
    pub x: FieldVariable,
    pub v: FieldVariable,
    /// Displacement.
    pub u: FieldVariable,
    pub p: FieldVariable,
}

impl SolidVariables {
    pub fn all(&self) -> [&FieldVariable; 4] {
        [&self.x, &self.v, &self.u, &self.p]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidVariables {
    /// Current (moving) coordinates.
    pub xt: FieldVariable,
    /// Reference coordinates.
    pub x0: FieldVariable,
    pub v: FieldVariable,
    pub p: FieldVariable,
    /// Domain (mesh) velocity.
    pub w: FieldVariable,
}

impl FluidVariables {
    pub fn all(&self) -> [&FieldVariable; 5] {
        [&self.xt, &self.x0, &self.v, &self.p, &self.w]
    }
}

pub fn solid_fields(top: &ProblemTopology, opts: FieldOptions) -> SolidVariables {
    SolidVariables {
        x: FieldVariable::mesh_coordinates("SolidX", &top.solid2, 2, opts),
        v: FieldVariable::new("SolidV", &top.solid2, 2, opts),
        u: FieldVariable::new("SolidU", &top.solid2, 2, opts),
        p: FieldVariable::new("SolidP", &top.solid1, 1, opts),
    }
}

pub fn fluid_fields(top: &ProblemTopology, opts: FieldOptions) -> FluidVariables {
    FluidVariables {
        xt: FieldVariable::mesh_coordinates("FluidXt", &top.fluid1, 2, opts),
        x0: FieldVariable::mesh_coordinates("FluidX0", &top.fluid1, 2, opts),
        v: FieldVariable::new("FluidV", &top.fluid2, 2, opts),
        p: FieldVariable::new("FluidP", &top.fluid1, 1, opts),
        w: FieldVariable::new("FluidW", &top.fluid1, 2, opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::build_topology;
    use fsi_project::MeshDescription;
    use std::num::NonZeroU32;

    #[test]
    fn solid_fields_live_on_expected_topologies() {
        let top = build_topology(&MeshDescription::standard("mesh")).unwrap();
        let vars = solid_fields(&top, FieldOptions::default());
        assert_eq!(vars.x.topology, "TPSolidquad");
        assert_eq!(vars.x.mesh_data, Some(PathBuf::from("mesh/solid_quad")));
        assert_eq!(vars.u.order, OrderLevel::Quad);
        assert_eq!(vars.p.topology, "TPSolidlin");
        assert_eq!(vars.p.components, 1);
        assert!(vars.v.mesh_data.is_none());
    }

    #[test]
    fn fluid_fields_live_on_expected_topologies() {
        let top = build_topology(&MeshDescription::standard("mesh")).unwrap();
        let vars = fluid_fields(&top, FieldOptions::default());
        assert_eq!(vars.xt.topology, "TPFluidlin");
        assert_eq!(vars.x0.mesh_data, vars.xt.mesh_data);
        assert_eq!(vars.v.topology, "TPFluidquad");
        assert_eq!(vars.p.components, 1);
        assert_eq!(vars.w.order, OrderLevel::Lin);
    }

    #[test]
    fn options_carry_through() {
        let opts = AssemblyOptions {
            binary_output: true,
            export_frequency: ExportFrequency::Every(NonZeroU32::new(10).unwrap()),
            ..AssemblyOptions::default()
        };
        let field_opts = FieldOptions::from(&opts);
        assert_eq!(field_opts.format.tag(), "BINARY");
        assert_eq!(field_opts.freq.value(), 10);
        assert_eq!(FieldOptions::default().freq.value(), -1);
    }
}
