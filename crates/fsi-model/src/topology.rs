//! Discretization spaces and the interfaces between them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use fsi_core::{Domain, ElementKind, OrderLevel, PatchRole};
use fsi_project::MeshDescription;

use crate::error::{ModelError, ModelResult};

/// Gauss–Legendre quadrature with a fixed number of points, shared by every basis.
pub const QUADRATURE_RULE: &str = "GL";
pub const QUADRATURE_POINTS: u8 = 6;

/// Element basis: element kind × nodal Lagrange order × quadrature rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    pub name: String,
    pub elem: ElementKind,
    pub order: OrderLevel,
    pub quadrature_points: u8,
}

impl Basis {
    pub fn nodal(name: impl Into<String>, elem: ElementKind, order: OrderLevel) -> Self {
        Self {
            name: name.into(),
            elem,
            order,
            quadrature_points: QUADRATURE_POINTS,
        }
    }

    /// Lower-dimensional basis of the same order on this basis' boundary facets.
    pub fn boundary(&self, name: impl Into<String>) -> ModelResult<Basis> {
        let elem = self
            .elem
            .boundary()
            .ok_or(ModelError::NoBoundaryElement { elem: self.elem })?;
        Ok(Basis::nodal(name, elem, self.order))
    }

    /// Interpolation tag as written in the solver document, e.g. `NL2`.
    pub fn interpolation(&self) -> String {
        format!("NL{}", self.order.degree())
    }

    pub fn quadrature(&self) -> String {
        format!("{}{}", QUADRATURE_RULE, self.quadrature_points)
    }
}

/// Restriction of a topology to a labelled boundary patch of a parent topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryNesting {
    pub parent: String,
    pub patch: u32,
}

/// A named discretization space over one mesh file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub name: String,
    pub basis: String,
    pub order: OrderLevel,
    pub mesh: PathBuf,
    /// Element-local data only; no nodal continuity.
    pub discontinuous: bool,
    pub in_boundary: Option<BoundaryNesting>,
}

impl Topology {
    fn new(name: impl Into<String>, basis: &Basis, mesh: PathBuf) -> Self {
        Self {
            name: name.into(),
            basis: basis.name.clone(),
            order: basis.order,
            mesh,
            discontinuous: false,
            in_boundary: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceKind {
    OneToOne,
    ManyToOne,
}

impl InterfaceKind {
    pub fn label(self) -> &'static str {
        match self {
            InterfaceKind::OneToOne => "OneToOne",
            InterfaceKind::ManyToOne => "ManyToOne",
        }
    }
}

/// Relation between topologies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interface {
    /// The same body discretized at several orders.
    OneToOne { topologies: Vec<String> },
    /// Lower-dimensional boundary topologies mapped into a master topology.
    ManyToOne {
        members: Vec<String>,
        master: String,
        file: PathBuf,
        nest_in_boundary: u32,
    },
}

impl Interface {
    pub fn kind(&self) -> InterfaceKind {
        match self {
            Interface::OneToOne { .. } => InterfaceKind::OneToOne,
            Interface::ManyToOne { .. } => InterfaceKind::ManyToOne,
        }
    }

    /// Structural identity: kind, master and constituent topology names.
    pub fn key(&self) -> InterfaceKey {
        match self {
            Interface::OneToOne { topologies } => InterfaceKey {
                kind: InterfaceKind::OneToOne,
                master: None,
                members: topologies.clone(),
            },
            Interface::ManyToOne {
                members, master, ..
            } => InterfaceKey {
                kind: InterfaceKind::ManyToOne,
                master: Some(master.clone()),
                members: members.clone(),
            },
        }
    }

    /// Every topology name the interface mentions.
    pub fn topology_names(&self) -> Vec<&str> {
        match self {
            Interface::OneToOne { topologies } => topologies.iter().map(String::as_str).collect(),
            Interface::ManyToOne {
                members, master, ..
            } => members
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(master.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceKey {
    pub kind: InterfaceKind,
    pub master: Option<String>,
    pub members: Vec<String>,
}

/// Interfaces deduplicated by [`InterfaceKey`], kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSet {
    keys: BTreeSet<InterfaceKey>,
    items: Vec<Interface>,
}

impl InterfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an interface; returns `false` if an equivalent one is already present.
    pub fn insert(&mut self, interface: Interface) -> bool {
        if !self.keys.insert(interface.key()) {
            return false;
        }
        self.items.push(interface);
        true
    }

    pub fn contains(&self, key: &InterfaceKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The topology hierarchy of one problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemTopology {
    pub bases: Vec<Basis>,
    pub solid1: Topology,
    pub solid2: Topology,
    pub fluid0: Topology,
    pub fluid1: Topology,
    pub fluid2: Topology,
    /// Fluid–solid interface.
    pub bnd: Topology,
    pub inlet: Topology,
    pub apex: Topology,
    pub interfaces: InterfaceSet,
}

impl ProblemTopology {
    pub fn topologies(&self) -> [&Topology; 8] {
        [
            &self.solid1,
            &self.solid2,
            &self.fluid0,
            &self.fluid1,
            &self.fluid2,
            &self.bnd,
            &self.inlet,
            &self.apex,
        ]
    }

    pub fn find(&self, name: &str) -> Option<&Topology> {
        self.topologies().into_iter().find(|t| t.name == name)
    }

    pub fn basis(&self, name: &str) -> Option<&Basis> {
        self.bases.iter().find(|b| b.name == name)
    }
}

fn title(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

pub fn topology_name(domain: Domain, order: OrderLevel) -> String {
    format!("TP{}{}", domain.name_prefix(), order.label())
}

fn basis_name(domain: Domain, order: OrderLevel) -> String {
    format!("{}{}Basis", domain.name_prefix(), title(order.label()))
}

/// Interface map file for a boundary role, e.g. `<home>/iface-fluid.IN`.
pub fn interface_file(mesh: &MeshDescription, role: &str) -> PathBuf {
    mesh.home.join(format!("iface-{role}.IN"))
}

fn require_patch(
    mesh: &MeshDescription,
    domain: Domain,
    role: PatchRole,
    context: &str,
) -> ModelResult<u32> {
    mesh.patch(domain, role)
        .ok_or_else(|| ModelError::MissingPatch {
            context: context.to_string(),
            domain,
            role,
        })
}

struct DomainSpaces {
    domain: Domain,
    bases: Vec<(OrderLevel, Basis)>,
    tops: BTreeMap<OrderLevel, Topology>,
}

impl DomainSpaces {
    fn build(mesh: &MeshDescription, domain: Domain) -> ModelResult<Self> {
        let mut bases = Vec::new();
        let mut tops = BTreeMap::new();
        for &order in MeshDescription::required_orders(domain) {
            let file = mesh
                .meshes(domain)
                .get(&order)
                .ok_or(ModelError::MissingOrder { domain, order })?;
            let basis = Basis::nodal(basis_name(domain, order), file.elem, order);
            let top = Topology::new(topology_name(domain, order), &basis, mesh.mesh_path(file));
            bases.push((order, basis));
            tops.insert(order, top);
        }
        Ok(Self {
            domain,
            bases,
            tops,
        })
    }

    fn take(&mut self, order: OrderLevel) -> ModelResult<Topology> {
        self.tops.remove(&order).ok_or(ModelError::MissingOrder {
            domain: self.domain,
            order,
        })
    }

    fn basis(&self, order: OrderLevel) -> Option<&Basis> {
        self.bases.iter().find(|(o, _)| *o == order).map(|(_, b)| b)
    }
}

/// Build the topology hierarchy and interface set for a mesh description.
pub fn build_topology(mesh: &MeshDescription) -> ModelResult<ProblemTopology> {
    let mut solid = DomainSpaces::build(mesh, Domain::Solid)?;
    let mut fluid = DomainSpaces::build(mesh, Domain::Fluid)?;

    let solid_interface = require_patch(mesh, Domain::Solid, PatchRole::Interface, "TPBnd")?;
    let fluid_interface = require_patch(mesh, Domain::Fluid, PatchRole::Interface, "iface-fluid")?;
    let fluid_inlet = require_patch(mesh, Domain::Fluid, PatchRole::Inlet, "TPInlet")?;
    let fluid_apex = require_patch(mesh, Domain::Fluid, PatchRole::Apex, "TPApex")?;

    // One boundary basis, shared by every boundary-restricted topology.
    let bnd_basis = solid
        .basis(OrderLevel::Quad)
        .ok_or(ModelError::MissingOrder {
            domain: Domain::Solid,
            order: OrderLevel::Quad,
        })?
        .boundary("BndBasis")?;

    let solid1 = solid.take(OrderLevel::Lin)?;
    let solid2 = solid.take(OrderLevel::Quad)?;
    let mut fluid0 = fluid.take(OrderLevel::Const)?;
    let fluid1 = fluid.take(OrderLevel::Lin)?;
    let fluid2 = fluid.take(OrderLevel::Quad)?;
    fluid0.discontinuous = true;

    let restricted = |name: &str, parent: &Topology, patch: u32| {
        let mut top = Topology::new(name, &bnd_basis, mesh.home.join(name_to_file(name)));
        top.in_boundary = Some(BoundaryNesting {
            parent: parent.name.clone(),
            patch,
        });
        top
    };
    let bnd = restricted("TPBnd", &solid1, solid_interface);
    let inlet = restricted("TPInlet", &fluid1, fluid_inlet);
    let apex = restricted("TPApex", &fluid1, fluid_apex);

    let mut interfaces = InterfaceSet::new();
    interfaces.insert(Interface::OneToOne {
        topologies: vec![solid1.name.clone(), solid2.name.clone()],
    });
    interfaces.insert(Interface::OneToOne {
        topologies: vec![fluid0.name.clone(), fluid1.name.clone(), fluid2.name.clone()],
    });
    let nested = |member: &Topology, master: &Topology, role: &str, patch: u32| {
        Interface::ManyToOne {
            members: vec![member.name.clone()],
            master: master.name.clone(),
            file: interface_file(mesh, role),
            nest_in_boundary: patch,
        }
    };
    interfaces.insert(nested(&bnd, &fluid2, "fluid", fluid_interface));
    interfaces.insert(nested(&bnd, &solid2, "solid", solid_interface));
    interfaces.insert(nested(&inlet, &fluid2, "inlet", fluid_inlet));
    interfaces.insert(nested(&apex, &fluid2, "apex", fluid_apex));

    let mut bases: Vec<Basis> = solid.bases.into_iter().map(|(_, b)| b).collect();
    bases.extend(fluid.bases.into_iter().map(|(_, b)| b));
    bases.push(bnd_basis);

    let top = ProblemTopology {
        bases,
        solid1,
        solid2,
        fluid0,
        fluid1,
        fluid2,
        bnd,
        inlet,
        apex,
        interfaces,
    };
    verify_nesting(&top, mesh)?;
    Ok(top)
}

fn name_to_file(name: &str) -> String {
    name.trim_start_matches("TP").to_ascii_lowercase()
}

/// Check every boundary nesting id against the mesh description.
///
/// Boundary-restricted topologies and nested interfaces must carry exactly
/// the patch id the mesh description assigns to their role.
pub fn verify_nesting(top: &ProblemTopology, mesh: &MeshDescription) -> ModelResult<()> {
    let expect = |what: &str,
                  nesting: Option<u32>,
                  domain: Domain,
                  role: PatchRole|
     -> ModelResult<()> {
        let expected = require_patch(mesh, domain, role, what)?;
        match nesting {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(ModelError::NestMismatch {
                what: what.to_string(),
                expected,
                actual,
            }),
            None => Err(ModelError::DanglingReference {
                from: what.to_string(),
                what: "boundary nesting",
                name: role.to_string(),
            }),
        }
    };

    let nesting = |t: &Topology| t.in_boundary.as_ref().map(|n| n.patch);
    expect(&top.bnd.name, nesting(&top.bnd), Domain::Solid, PatchRole::Interface)?;
    expect(&top.inlet.name, nesting(&top.inlet), Domain::Fluid, PatchRole::Inlet)?;
    expect(&top.apex.name, nesting(&top.apex), Domain::Fluid, PatchRole::Apex)?;

    for interface in top.interfaces.iter() {
        let Interface::ManyToOne {
            members,
            master,
            nest_in_boundary,
            ..
        } = interface
        else {
            continue;
        };
        let label = format!("interface {} -> {}", members.join(","), master);
        let role = if members.iter().any(|m| *m == top.inlet.name) {
            PatchRole::Inlet
        } else if members.iter().any(|m| *m == top.apex.name) {
            PatchRole::Apex
        } else {
            PatchRole::Interface
        };
        let domain = if *master == top.solid2.name || *master == top.solid1.name {
            Domain::Solid
        } else {
            Domain::Fluid
        };
        expect(&label, Some(*nest_in_boundary), domain, role)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> MeshDescription {
        MeshDescription::standard("mesh")
    }

    #[test]
    fn builds_all_topologies() {
        let top = build_topology(&mesh()).unwrap();
        let names: Vec<&str> = top.topologies().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "TPSolidlin",
                "TPSolidquad",
                "TPFluidconst",
                "TPFluidlin",
                "TPFluidquad",
                "TPBnd",
                "TPInlet",
                "TPApex"
            ]
        );
        assert!(top.fluid0.discontinuous);
        assert!(!top.fluid1.discontinuous);
        assert_eq!(top.solid2.mesh, PathBuf::from("mesh/solid_quad"));
    }

    #[test]
    fn boundary_topologies_share_one_basis() {
        let top = build_topology(&mesh()).unwrap();
        assert_eq!(top.bnd.basis, "BndBasis");
        assert_eq!(top.inlet.basis, top.bnd.basis);
        assert_eq!(top.apex.basis, top.bnd.basis);
        let basis = top.basis("BndBasis").unwrap();
        assert_eq!(basis.elem, ElementKind::Line);
        assert_eq!(basis.order, OrderLevel::Quad);
        assert_eq!(basis.quadrature(), "GL6");
    }

    #[test]
    fn nesting_follows_patch_ids() {
        let top = build_topology(&mesh()).unwrap();
        let bnd = top.bnd.in_boundary.as_ref().unwrap();
        assert_eq!(bnd.parent, "TPSolidlin");
        assert_eq!(bnd.patch, 4);
        assert_eq!(top.inlet.in_boundary.as_ref().unwrap().patch, 1);
        assert_eq!(top.apex.in_boundary.as_ref().unwrap().patch, 5);
    }

    #[test]
    fn interface_set_contents() {
        let top = build_topology(&mesh()).unwrap();
        assert_eq!(top.interfaces.len(), 6);
        let files: Vec<PathBuf> = top
            .interfaces
            .iter()
            .filter_map(|i| match i {
                Interface::ManyToOne { file, .. } => Some(file.clone()),
                Interface::OneToOne { .. } => None,
            })
            .collect();
        assert_eq!(
            files,
            [
                PathBuf::from("mesh/iface-fluid.IN"),
                PathBuf::from("mesh/iface-solid.IN"),
                PathBuf::from("mesh/iface-inlet.IN"),
                PathBuf::from("mesh/iface-apex.IN"),
            ]
        );
    }

    #[test]
    fn interface_set_deduplicates_by_structure() {
        let mut set = InterfaceSet::new();
        let a = Interface::OneToOne {
            topologies: vec!["A".into(), "B".into()],
        };
        assert!(set.insert(a.clone()));
        assert!(!set.insert(a));
        assert!(set.insert(Interface::OneToOne {
            topologies: vec!["B".into(), "A".into()],
        }));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn missing_order_is_reported() {
        let mut mesh = mesh();
        mesh.fluid.remove(&OrderLevel::Const);
        assert_eq!(
            build_topology(&mesh).unwrap_err(),
            ModelError::MissingOrder {
                domain: Domain::Fluid,
                order: OrderLevel::Const
            }
        );
    }

    #[test]
    fn missing_patch_is_reported() {
        let mut mesh = mesh();
        mesh.fluid_patches.remove(PatchRole::Apex);
        let err = build_topology(&mesh).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingPatch {
                domain: Domain::Fluid,
                role: PatchRole::Apex,
                ..
            }
        ));
    }

    #[test]
    fn nest_mismatch_is_detected() {
        let mesh = mesh();
        let mut top = build_topology(&mesh).unwrap();
        if let Some(nesting) = top.inlet.in_boundary.as_mut() {
            nesting.patch = 9;
        }
        assert_eq!(
            verify_nesting(&top, &mesh).unwrap_err(),
            ModelError::NestMismatch {
                what: "TPInlet".to_string(),
                expected: 1,
                actual: 9
            }
        );
    }

    #[test]
    fn point_elements_have_no_boundary() {
        let basis = Basis::nodal("P", ElementKind::Point, OrderLevel::Quad);
        assert_eq!(
            basis.boundary("B").unwrap_err(),
            ModelError::NoBoundaryElement {
                elem: ElementKind::Point
            }
        );
    }
}
