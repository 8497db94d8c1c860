//! Mesh collaborator: plain-text CHeart meshes and apex-patch regeneration.
//!
//! A mesh named `<prefix>` lives in three files:
//! - `<prefix>_FE.X`: `nodes dim` header, then one coordinate row per node
//! - `<prefix>_FE.T`: `elements nodes` header, then 1-based node ids per element
//! - `<prefix>_FE.B`: `facets` header, then `element node.. label` per facet

use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use fsi_core::{Domain, OrderLevel, PatchRole};
use fsi_project::MeshDescription;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Half-width of the box around the apex node that selects the apex patch.
pub const APEX_RADIUS: f64 = 2.5;

/// Source mesh names inside a mesh source directory.
const SOURCE_FLUID: &str = "fluid";
const SOURCE_SOLID: &str = "solid";

/// One labelled boundary facet. Ids are 1-based, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFacet {
    pub element: usize,
    pub nodes: Vec<usize>,
    pub label: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub dim: usize,
    pub nodes: Vec<Vec<f64>>,
    pub elements: Vec<Vec<usize>>,
    pub boundary: Vec<BoundaryFacet>,
}

impl Mesh {
    pub fn patch(&self, label: u32) -> impl Iterator<Item = &BoundaryFacet> + '_ {
        self.boundary.iter().filter(move |f| f.label == label)
    }

    pub fn has_patch(&self, label: u32) -> bool {
        self.patch(label).next().is_some()
    }

    fn node(&self, id: usize) -> Option<&[f64]> {
        id.checked_sub(1)
            .and_then(|i| self.nodes.get(i))
            .map(Vec::as_slice)
    }
}

/// Loads and saves meshes by path prefix.
pub trait MeshIo: Send + Sync {
    fn load_mesh(&self, prefix: &Path) -> AppResult<Mesh>;
    fn save_mesh(&self, mesh: &Mesh, prefix: &Path) -> AppResult<()>;
}

/// The whitespace text format the solver reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheartMeshIo;

fn mesh_file(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("_FE.{ext}"));
    PathBuf::from(name)
}

fn mesh_error(path: &Path, reason: impl Into<String>) -> AppError {
    AppError::Mesh {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Header plus body rows of one mesh file.
fn read_rows(path: &Path) -> AppResult<(Vec<String>, Vec<Vec<String>>)> {
    let content = std::fs::read_to_string(path).map_err(|e| mesh_error(path, e.to_string()))?;
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| l.split_whitespace().map(str::to_string).collect::<Vec<_>>());
    let header = lines.next().ok_or_else(|| mesh_error(path, "empty file"))?;
    Ok((header, lines.collect()))
}

fn parse<T: std::str::FromStr>(path: &Path, cell: &str) -> AppResult<T> {
    cell.parse()
        .map_err(|_| mesh_error(path, format!("cannot parse '{cell}'")))
}

fn header_count(path: &Path, header: &[String], at: usize) -> AppResult<usize> {
    let cell = header
        .get(at)
        .ok_or_else(|| mesh_error(path, "header too short"))?;
    parse(path, cell)
}

impl MeshIo for CheartMeshIo {
    fn load_mesh(&self, prefix: &Path) -> AppResult<Mesh> {
        let x_path = mesh_file(prefix, "X");
        let (header, rows) = read_rows(&x_path)?;
        let n_nodes = header_count(&x_path, &header, 0)?;
        let dim = header_count(&x_path, &header, 1)?;
        if rows.len() != n_nodes {
            return Err(mesh_error(
                &x_path,
                format!("header declares {n_nodes} nodes, found {}", rows.len()),
            ));
        }
        let nodes = rows
            .iter()
            .map(|row| -> AppResult<Vec<f64>> {
                if row.len() != dim {
                    return Err(mesh_error(&x_path, format!("node row has {} values", row.len())));
                }
                row.iter().map(|c| parse(&x_path, c)).collect()
            })
            .collect::<AppResult<Vec<Vec<f64>>>>()?;

        let t_path = mesh_file(prefix, "T");
        let (header, rows) = read_rows(&t_path)?;
        let n_elements = header_count(&t_path, &header, 0)?;
        if rows.len() != n_elements {
            return Err(mesh_error(
                &t_path,
                format!("header declares {n_elements} elements, found {}", rows.len()),
            ));
        }
        let elements = rows
            .iter()
            .map(|row| -> AppResult<Vec<usize>> {
                row.iter().map(|c| parse(&t_path, c)).collect()
            })
            .collect::<AppResult<Vec<Vec<usize>>>>()?;

        let b_path = mesh_file(prefix, "B");
        let (header, rows) = read_rows(&b_path)?;
        let n_facets = header_count(&b_path, &header, 0)?;
        if rows.len() != n_facets {
            return Err(mesh_error(
                &b_path,
                format!("header declares {n_facets} facets, found {}", rows.len()),
            ));
        }
        let boundary = rows
            .iter()
            .map(|row| -> AppResult<BoundaryFacet> {
                let (label, rest) = row
                    .split_last()
                    .ok_or_else(|| mesh_error(&b_path, "empty facet row"))?;
                let (element, nodes) = rest
                    .split_first()
                    .ok_or_else(|| mesh_error(&b_path, "facet row without element"))?;
                Ok(BoundaryFacet {
                    element: parse(&b_path, element)?,
                    nodes: nodes
                        .iter()
                        .map(|c| parse(&b_path, c))
                        .collect::<AppResult<_>>()?,
                    label: parse(&b_path, label)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        debug!(
            prefix = %prefix.display(),
            nodes = nodes.len(),
            elements = elements.len(),
            facets = boundary.len(),
            "loaded mesh"
        );
        Ok(Mesh {
            dim,
            nodes,
            elements,
            boundary,
        })
    }

    fn save_mesh(&self, mesh: &Mesh, prefix: &Path) -> AppResult<()> {
        let mut x = format!("{} {}\n", mesh.nodes.len(), mesh.dim);
        for node in &mesh.nodes {
            let row: Vec<String> = node.iter().map(|v| format!("{v:.16e}")).collect();
            let _ = writeln!(x, "{}", row.join(" "));
        }

        let mut t = format!("{} {}\n", mesh.elements.len(), mesh.nodes.len());
        for elem in &mesh.elements {
            let row: Vec<String> = elem.iter().map(usize::to_string).collect();
            let _ = writeln!(t, "{}", row.join(" "));
        }

        let mut b = format!("{}\n", mesh.boundary.len());
        for facet in &mesh.boundary {
            let _ = write!(b, "{}", facet.element);
            for node in &facet.nodes {
                let _ = write!(b, " {node}");
            }
            let _ = writeln!(b, " {}", facet.label);
        }

        for (ext, text) in [("X", x), ("T", t), ("B", b)] {
            let path = mesh_file(prefix, ext);
            std::fs::write(&path, text).map_err(AppError::write(&path))?;
        }
        Ok(())
    }
}

/// Add a patch `label` made of the facets of patch `in_surf` that lie
/// within `radius` of the apex (the node with the largest y coordinate).
///
/// The selected facets keep their `in_surf` copy; the new patch is appended.
pub fn create_apex_surface(mesh: &Mesh, in_surf: u32, label: u32, radius: f64) -> Option<Mesh> {
    let apex = mesh
        .nodes
        .iter()
        .filter(|n| n.len() >= 2)
        .max_by(|a, b| a[1].total_cmp(&b[1]))?;
    let (ax, ay) = (apex[0], apex[1]);
    let inside = |id: &usize| {
        mesh.node(*id)
            .is_some_and(|p| (p[0] - ax).abs() <= radius && (p[1] - ay).abs() <= radius)
    };

    let selected: Vec<BoundaryFacet> = mesh
        .patch(in_surf)
        .filter(|f| f.nodes.iter().all(inside))
        .map(|f| BoundaryFacet {
            label,
            ..f.clone()
        })
        .collect();
    if selected.is_empty() {
        return None;
    }
    let mut out = mesh.clone();
    out.boundary.extend(selected);
    Some(out)
}

fn linear_mesh<'a>(
    desc: &'a MeshDescription,
    domain: Domain,
) -> AppResult<&'a fsi_project::MeshFileDef> {
    desc.meshes(domain).get(&OrderLevel::Lin).ok_or_else(|| {
        mesh_error(
            desc.home(),
            format!("no {} mesh for order {}", domain.label(), OrderLevel::Lin.label()),
        )
    })
}

/// Regenerate the linear meshes under the mesh root from `source`.
///
/// The fluid mesh gains its apex patch; the solid mesh is copied through.
pub fn remake_mesh(source: &Path, desc: &MeshDescription, io: &dyn MeshIo) -> AppResult<()> {
    let fluid = io.load_mesh(&source.join(SOURCE_FLUID))?;
    let solid = io.load_mesh(&source.join(SOURCE_SOLID))?;
    std::fs::create_dir_all(desc.home()).map_err(AppError::write(desc.home()))?;

    let patch = |role| {
        desc.patch(Domain::Fluid, role).ok_or_else(|| {
            mesh_error(desc.home(), format!("fluid mesh has no {} patch id", role))
        })
    };
    let interface = patch(PatchRole::Interface)?;
    let apex = patch(PatchRole::Apex)?;
    if !fluid.has_patch(interface) {
        return Err(mesh_error(
            &source.join(SOURCE_FLUID),
            format!("interface patch {interface} is empty"),
        ));
    }
    let fluid = create_apex_surface(&fluid, interface, apex, APEX_RADIUS).ok_or_else(|| {
        mesh_error(
            &source.join(SOURCE_FLUID),
            format!("no facets of patch {interface} near the apex"),
        )
    })?;

    let fluid_path = desc.mesh_path(linear_mesh(desc, Domain::Fluid)?);
    let solid_path = desc.mesh_path(linear_mesh(desc, Domain::Solid)?);
    io.save_mesh(&fluid, &fluid_path)?;
    io.save_mesh(&solid, &solid_path)?;
    info!(
        home = %desc.home().display(),
        apex_facets = fluid.patch(apex).count(),
        "regenerated meshes"
    );
    Ok(())
}
