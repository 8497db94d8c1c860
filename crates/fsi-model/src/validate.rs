//! Referential integrity of an assembled model.

use std::collections::BTreeSet;

use crate::assemble::Model;
use crate::bc::BcValue;
use crate::curve::dependency_order;
use crate::error::{ModelError, ModelResult};
use crate::solver::SubgroupMember;
use crate::topology::Interface;

fn unique<'a>(
    what: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> ModelResult<BTreeSet<&'a str>> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ModelError::DuplicateName {
                what,
                name: name.to_string(),
            });
        }
    }
    Ok(seen)
}

fn require(
    known: &BTreeSet<&str>,
    from: impl FnOnce() -> String,
    what: &'static str,
    name: &str,
) -> ModelResult<()> {
    if known.contains(name) {
        Ok(())
    } else {
        Err(ModelError::DanglingReference {
            from: from(),
            what,
            name: name.to_string(),
        })
    }
}

/// Check that every name the model mentions resolves to exactly one object.
pub(crate) fn validate_model(model: &Model) -> ModelResult<()> {
    let top = &model.topology;
    let bases = unique("basis", top.bases.iter().map(|b| b.name.as_str()))?;
    let topologies = unique("topology", top.topologies().map(|t| t.name.as_str()))?;
    let variables = unique("variable", model.variables.iter().map(|v| v.name.as_str()))?;
    let curves = unique("curve", model.curves.iter().map(|c| c.name.as_str()))?;
    let problems = unique("problem", model.problems.iter().map(|p| p.name()))?;
    let matrices = unique("matrix", model.plan.matrices.iter().map(|m| m.name.as_str()))?;

    for t in top.topologies() {
        let from = || format!("topology {}", t.name);
        require(&bases, from, "basis", &t.basis)?;
        if let Some(nesting) = &t.in_boundary {
            require(&topologies, from, "topology", &nesting.parent)?;
        }
    }
    for interface in top.interfaces.iter() {
        let from = || format!("{} interface", interface.kind().label());
        for name in interface.topology_names() {
            require(&topologies, from, "topology", name)?;
        }
        if let Interface::ManyToOne { members, .. } = interface {
            for member in members {
                let nested = top.find(member).and_then(|t| t.in_boundary.as_ref());
                if nested.is_none() {
                    return Err(ModelError::DanglingReference {
                        from: from(),
                        what: "boundary nesting",
                        name: member.clone(),
                    });
                }
            }
        }
    }

    for var in &model.variables {
        let from = || format!("variable {}", var.name);
        require(&topologies, from, "topology", &var.topology)?;
        if top.find(&var.topology).is_some_and(|t| t.order != var.order) {
            return Err(ModelError::OrderMismatch {
                variable: var.name.clone(),
                topology: var.topology.clone(),
            });
        }
    }

    for curve in &model.curves {
        curve.check_deps()?;
        for var in curve.components.iter().flat_map(|c| c.variable_refs()) {
            require(&variables, || format!("curve {}", curve.name), "variable", &var)?;
        }
    }
    dependency_order(&model.curves)?;

    for problem in &model.problems {
        let from = || format!("problem {}", problem.name());
        for var in problem.variables() {
            require(&variables, from, "variable", var)?;
        }
        if let Some(root) = problem.root_topology() {
            require(&topologies, from, "topology", root)?;
        }
        for bc in problem.bcs() {
            if let BcValue::Curve(name) = &bc.value {
                require(&curves, from, "curve", name)?;
            }
        }
    }

    for matrix in &model.plan.matrices {
        for name in &matrix.problems {
            require(&problems, || format!("matrix {}", matrix.name), "problem", name)?;
        }
    }
    for subgroup in &model.plan.group.subgroups {
        for member in &subgroup.members {
            let from = || format!("{} subgroup", subgroup.method.label());
            match member {
                SubgroupMember::Matrix(name) => require(&matrices, from, "matrix", name)?,
                SubgroupMember::Problem(name) => require(&problems, from, "problem", name)?,
            }
        }
    }
    Ok(())
}
