//! Solver input document export.
//!
//! [`render`] is deterministic: the same model always produces the same text.
//! The header carries the boundary-patch labels the model was built against
//! as comment lines, so [`read_patch_labels`] can recover them from a
//! generated file.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::Path;

use fsi_core::{Domain, PatchRole};
use fsi_project::{BoundaryPatches, ExportFrequency};

use crate::assemble::Model;
use crate::bc::{BcPatch, BcValue};
use crate::curve::{BoundaryCurve, dependency_order};
use crate::fields::DataFormat;
use crate::physics::SubProblem;
use crate::solver::SolverSubgroup;
use crate::topology::Interface;

const PATCH_LABEL: &str = "% patch-label";

/// A `% patch-label` header line that does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLabelError {
    pub line: usize,
    pub text: String,
}

impl fmt::Display for PatchLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed patch label on line {}: '{}'", self.line, self.text)
    }
}

impl std::error::Error for PatchLabelError {}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n% ----  {}  {}", title, "-".repeat(60 - title.len().min(56)));
}

fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().collect::<Vec<_>>().join("|")
}

fn render_bc(bc: &BcPatch) -> String {
    let value = match &bc.value {
        BcValue::Constant(values) => values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("  "),
        BcValue::Curve(name) | BcValue::Variable(name) => name.clone(),
    };
    format!("    {}  {}  {}  {}", bc.patch, bc.variable, bc.kind(), value)
}

fn render_subgroup(out: &mut String, group: &str, sg: &SolverSubgroup) {
    let mut fields = vec![group.to_string(), sg.method.label().to_string()];
    fields.extend(sg.members.iter().map(|m| m.name().to_string()));
    if let Some(scale) = sg.scale_first_residual {
        fields.push(format!("ScaleFirstResidual[{}]", scale));
    }
    let _ = writeln!(out, "!DefSolverSubGroup={{{}}}", fields.join("|"));
}

fn use_var(out: &mut String, role: &str, var: &str) {
    let _ = writeln!(out, "  !UseVariablePointer={{{}|{}}}", role, var);
}

fn render_problem(out: &mut String, problem: &SubProblem) {
    match problem {
        SubProblem::Solid(p) => {
            let _ = writeln!(out, "!DefProblem={{{}|TRANSIENT_HYPERELASTIC}}", problem.name());
            use_var(out, "Space", &p.space);
            use_var(out, "Displacement", &p.displacement);
            use_var(out, "Velocity", &p.velocity);
            use_var(out, "Pressure", &p.pressure);
            let _ = writeln!(out, "  !ConstitutiveLaw={{{}}}", p.law);
            let coefficients: Vec<String> = p.coefficients.iter().map(|c| c.to_string()).collect();
            let _ = writeln!(out, "    {}", coefficients.join("  "));
            let _ = writeln!(out, "  !SetProblemOption={{Density|{}}}", p.density);
            if let Some(weight) = p.stabilization {
                let _ = writeln!(out, "  !Nearly-incompressible={{{}}}", weight);
            }
        }
        SubProblem::Fluid(p) => {
            let _ = writeln!(
                out,
                "!DefProblem={{{}|TRANSIENT_ALE_NAVIER_STOKES_FLOW}}",
                problem.name()
            );
            use_var(out, "Space", &p.space);
            use_var(out, "Velocity", &p.velocity);
            use_var(out, "Pressure", &p.pressure);
            use_var(out, "DomainVelocity", &p.domain_velocity);
            let _ = writeln!(out, "  !Viscosity={{{}}}", p.viscosity);
            let _ = writeln!(out, "  !Density={{{}}}", p.density);
            let _ = writeln!(out, "  !SetRootTopology={{{}}}", p.root_topology);
            for flag in &p.flags {
                let _ = writeln!(out, "  !SetProblemFlag={{{}}}", flag);
            }
        }
        SubProblem::MeshMotion(p) => {
            let _ = writeln!(
                out,
                "!DefProblem={{{}|ALE_ELEMENT_DEPENDENT_STIFFNESS}}",
                problem.name()
            );
            use_var(out, "Space", &p.space);
            use_var(out, "DomainVelocity", &p.domain_velocity);
            use_var(out, "ALESpace", &p.ale_space);
            use_var(out, "ElementQuality", &p.quality);
            use_var(out, "ElementStiffness", &p.stiffness);
            let _ = writeln!(out, "  !Penalty={{{}}}", p.penalty);
            let _ = writeln!(out, "  !SetRootTopology={{{}}}", p.root_topology);
            for flag in &p.flags {
                let _ = writeln!(out, "  !SetProblemFlag={{{}}}", flag);
            }
        }
        SubProblem::Coupling(p) => {
            let _ = writeln!(out, "!DefProblem={{{}|FS_COUPLING_PROBLEM}}", problem.name());
            use_var(out, "Space", &p.space);
            let constraint: Vec<String> = p
                .constraint
                .iter()
                .map(|t| format!("{}[{}]", t.variable, t.coefficient))
                .collect();
            let _ = writeln!(out, "  !Addterms={{{}|{}}}", p.multiplier, constraint.join("|"));
            for (target, term) in &p.terms {
                let _ = writeln!(
                    out,
                    "  !Addterms={{{}|{}[{}]}}",
                    target, term.variable, term.coefficient
                );
            }
            let _ = writeln!(out, "  !SetRootTopology={{{}}}", p.root_topology);
        }
        SubProblem::Norm(p) => {
            let _ = writeln!(out, "!DefProblem={{{}|norm_calculation}}", problem.name());
            use_var(out, "Space", &p.space);
            use_var(out, "Term1", &p.variable);
            let _ = writeln!(out, "  !SetNorm={{{}}}", p.norm);
            let _ = writeln!(out, "  !Output-filename={{{}}}", p.export_file);
            if p.scale_by_measure {
                let _ = writeln!(out, "  !ScaleByMeasure");
            }
        }
    }
    if !problem.bcs().is_empty() {
        let _ = writeln!(out, "  !Boundary-patch-definitions");
        for bc in problem.bcs() {
            let _ = writeln!(out, "{}", render_bc(bc));
        }
    }
    out.push('\n');
}

fn render_curve(out: &mut String, curve: &BoundaryCurve) {
    let _ = writeln!(out, "!DefExpression={{{}}}", curve.name);
    for component in &curve.components {
        let _ = writeln!(out, "  {}", component);
    }
    out.push('\n');
}

/// Render the model as a solver input document.
pub fn render(model: &Model) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "% Solver input for {}", model.prefix);
    for (domain, patches) in &model.patches {
        for (role, id) in patches.iter() {
            let _ = writeln!(out, "{} {} {} {}", PATCH_LABEL, domain, role, id);
        }
    }

    let plan = &model.plan;
    let group = &plan.group;
    section(&mut out, "Solver Groups");
    let mut header = vec![group.name.as_str(), group.time.name.as_str()];
    header.extend(
        group
            .subgroups
            .iter()
            .flat_map(|sg| sg.members.iter().map(|m| m.name())),
    );
    let _ = writeln!(out, "!DefSolverGroup={{{}}}", join(header));
    for sg in &group.subgroups {
        render_subgroup(&mut out, &group.name, sg);
    }
    let _ = writeln!(out, "!SetSolverGroup={{{}|SUBITERATION|{}}}", group.name, group.subiterations);
    let _ = writeln!(out, "!SetSolverGroup={{{}|L2TOL|{:e}}}", group.name, group.l2_tolerance);

    section(&mut out, "Solver Matrices");
    for matrix in &plan.matrices {
        let mut fields = vec![matrix.name.as_str(), matrix.solver];
        fields.extend(matrix.problems.iter().map(String::as_str));
        let _ = writeln!(out, "!DefSolverMatrix={{{}}}", join(fields));
        for (key, value) in &matrix.settings {
            let _ = writeln!(out, "!SetSolverMatrix={{{}|{}|{}}}", matrix.name, key, value);
        }
    }

    section(&mut out, "Time Scheme");
    let _ = writeln!(out, "!DefTimeStepScheme={{{}}}", group.time.name);
    let _ = writeln!(out, "  {}  {}  {}", group.time.start, group.time.end, group.time.step);

    let top = &model.topology;
    section(&mut out, "Bases");
    for basis in &top.bases {
        let _ = writeln!(
            out,
            "!UseBasis={{{}|{}|{}|{}}}",
            basis.name,
            basis.elem.tag(),
            basis.interpolation(),
            basis.quadrature()
        );
    }

    section(&mut out, "Topologies");
    for t in top.topologies() {
        let _ = writeln!(out, "!DefTopology={{{}|{}|{}}}", t.name, t.mesh.display(), t.basis);
    }
    for t in top.topologies() {
        if t.discontinuous {
            let _ = writeln!(out, "!SetTopology={{{}|MakeDiscontinuous}}", t.name);
        }
        if let Some(nesting) = &t.in_boundary {
            let _ = writeln!(
                out,
                "!SetTopology={{{}|CreateInBoundary|[{};{}]}}",
                t.name, nesting.parent, nesting.patch
            );
        }
    }

    section(&mut out, "Interfaces");
    for interface in top.interfaces.iter() {
        match interface {
            Interface::OneToOne { topologies } => {
                let mut fields = vec![interface.kind().label()];
                fields.extend(topologies.iter().map(String::as_str));
                let _ = writeln!(out, "!DefInterface={{{}}}", join(fields));
            }
            Interface::ManyToOne {
                members,
                master,
                file,
                nest_in_boundary,
            } => {
                let _ = writeln!(
                    out,
                    "!DefInterface={{{}|{}|{}|{}-InBoundary|{}}}",
                    interface.kind().label(),
                    file.display(),
                    members.join("|"),
                    master,
                    nest_in_boundary
                );
            }
        }
    }

    section(&mut out, "Variables");
    for var in &model.variables {
        match &var.mesh_data {
            Some(data) => {
                let _ = writeln!(
                    out,
                    "!DefVariablePointer={{{}|{}|{}|{}}}",
                    var.name,
                    var.topology,
                    data.display(),
                    var.components
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "!DefVariablePointer={{{}|{}|{}}}",
                    var.name, var.topology, var.components
                );
            }
        }
    }
    for var in &model.variables {
        if var.freq != ExportFrequency::EveryStep {
            let _ = writeln!(
                out,
                "!SetVariablePointer={{{}|TIMESTEP_EXPORT_FREQ|{}}}",
                var.name,
                var.freq.value()
            );
        }
        if var.format == DataFormat::Binary {
            let _ = writeln!(out, "!SetVariablePointer={{{}|{}}}", var.name, var.format.tag());
        }
    }

    section(&mut out, "Expressions");
    let ordered = dependency_order(&model.curves)
        .unwrap_or_else(|_| model.curves.iter().collect());
    for curve in ordered {
        render_curve(&mut out, curve);
    }

    section(&mut out, "Problems");
    for problem in &model.problems {
        render_problem(&mut out, problem);
    }

    let _ = writeln!(out, "!SetOutputPath={{{}/}}", model.output_path.display());
    out
}

/// Recover the boundary-patch labels from a rendered document header.
pub fn read_patch_labels(
    text: &str,
) -> Result<BTreeMap<Domain, BoundaryPatches>, PatchLabelError> {
    let mut labels: BTreeMap<Domain, BoundaryPatches> = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        let Some(rest) = line.strip_prefix(PATCH_LABEL) else {
            continue;
        };
        let malformed = || PatchLabelError {
            line: idx + 1,
            text: line.to_string(),
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let [domain, role, id] = fields.as_slice() else {
            return Err(malformed());
        };
        let domain: Domain = domain.parse().map_err(|_| malformed())?;
        let role: PatchRole = role.parse().map_err(|_| malformed())?;
        let id: u32 = id.parse().map_err(|_| malformed())?;
        labels.entry(domain).or_default().insert(role, id);
    }
    Ok(labels)
}

/// Render and write the document to `path`.
pub fn write(model: &Model, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, render(model))
}
