//! Boundary-curve compiler: loading segments to symbolic expressions.

use std::collections::HashMap;
use std::f64::consts::PI;

use fsi_project::{CurveSegment, SpaceProfile};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{ModelError, ModelResult};
use crate::expr::{EvalEnv, Expr};
use crate::fields::FieldVariable;

pub const TIME_CURVE: &str = "inlet_time_curve";
pub const SPACE_CURVE: &str = "inlet_space_curve";
pub const INLET_VELOCITY: &str = "inlet_flow_vel";

pub fn segment_curve_name(index: usize) -> String {
    format!("bcpart_{index}")
}

/// A named, possibly vector-valued expression with explicit curve dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCurve {
    pub name: String,
    pub components: Vec<Expr>,
    /// Names of the curves the components read, in declaration order.
    pub deps: Vec<String>,
}

impl BoundaryCurve {
    /// A curve that reads no other curve.
    pub fn new(name: impl Into<String>, components: Vec<Expr>) -> ModelResult<Self> {
        Self::composite(name, components, &[])
    }

    /// A curve over other curves; every curve the components read must be in `deps`.
    pub fn composite(
        name: impl Into<String>,
        components: Vec<Expr>,
        deps: &[&BoundaryCurve],
    ) -> ModelResult<Self> {
        let curve = Self {
            name: name.into(),
            components,
            deps: deps.iter().map(|d| d.name.clone()).collect(),
        };
        curve.check_deps()?;
        Ok(curve)
    }

    /// Every curve read by a component is declared, and the curve does not read itself.
    pub fn check_deps(&self) -> ModelResult<()> {
        for name in self.components.iter().flat_map(Expr::curve_refs) {
            if name == self.name {
                return Err(ModelError::DependencyCycle { curve: name });
            }
            if !self.deps.contains(&name) {
                return Err(ModelError::DanglingReference {
                    from: format!("curve {}", self.name),
                    what: "curve",
                    name,
                });
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, env: &EvalEnv) -> Option<Vec<f64>> {
        self.components.iter().map(|c| c.evaluate(env)).collect()
    }
}

/// Order curves so that every curve comes after the curves it depends on.
///
/// # Errors
///
/// A dependency naming a curve outside `curves`, or a dependency cycle.
pub fn dependency_order(curves: &[BoundaryCurve]) -> ModelResult<Vec<&BoundaryCurve>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: HashMap<&str, NodeIndex> = curves
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), graph.add_node(i)))
        .collect();
    for curve in curves {
        let target = nodes[curve.name.as_str()];
        for dep in &curve.deps {
            let source = nodes
                .get(dep.as_str())
                .ok_or_else(|| ModelError::DanglingReference {
                    from: format!("curve {}", curve.name),
                    what: "curve",
                    name: dep.clone(),
                })?;
            graph.add_edge(*source, target, ());
        }
    }
    let order = toposort(&graph, None).map_err(|cycle| ModelError::DependencyCycle {
        curve: curves[graph[cycle.node_id()]].name.clone(),
    })?;
    Ok(order.into_iter().map(|n| &curves[graph[n]]).collect())
}

/// Time slice a loading segment occupies: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub index: usize,
    pub kind: &'static str,
    pub start: f64,
    pub end: f64,
}

impl SegmentWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Lay the segments out back to back, starting at `t = 0`.
pub fn segment_windows(segments: &[CurveSegment]) -> Vec<SegmentWindow> {
    let mut start = 0.0;
    segments
        .iter()
        .enumerate()
        .map(|(index, seg)| {
            let end = start + seg.duration();
            let window = SegmentWindow {
                index,
                kind: seg.kind(),
                start,
                end,
            };
            start = end;
            window
        })
        .collect()
}

/// The compiled inlet time curve and the pieces it sums.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeCurve {
    pub curve: BoundaryCurve,
    /// One curve per non-hold segment.
    pub parts: Vec<BoundaryCurve>,
    pub windows: Vec<SegmentWindow>,
}

impl TimeCurve {
    pub fn total_duration(&self) -> f64 {
        self.windows.last().map_or(0.0, |w| w.end)
    }

    pub fn active_windows(&self, t: f64) -> impl Iterator<Item = &SegmentWindow> {
        self.windows.iter().filter(move |w| w.contains(t))
    }

    /// Scalar value at time `t`.
    pub fn value_at(&self, t: f64) -> Option<f64> {
        let mut env = EvalEnv::at(t);
        for part in &self.parts {
            let v = part.evaluate(&env)?;
            env = env.with_curve(&part.name, v.first().copied()?);
        }
        self.curve.evaluate(&env)?.first().copied()
    }
}

fn shifted_time(start: f64) -> Expr {
    if start == 0.0 {
        Expr::time()
    } else {
        Expr::time() - Expr::num(start)
    }
}

fn gate(window: &SegmentWindow) -> Expr {
    Expr::time().ge(Expr::num(window.start)) * Expr::time().lt(Expr::num(window.end))
}

fn segment_expr(segment: &CurveSegment, window: &SegmentWindow) -> Option<Expr> {
    match *segment {
        CurveSegment::Sine {
            max_vel, period, ..
        } => {
            let phase = || (Expr::num(PI / period) * Expr::time()).sin();
            Some(Expr::num(max_vel) * phase() * phase() * gate(window))
        }
        CurveSegment::Hold { .. } => None,
        CurveSegment::Ramp { max_vel, duration } => {
            let fraction = (shifted_time(window.start) / Expr::num(duration))
                .min(Expr::num(1.0))
                .max(Expr::num(0.0));
            Some(Expr::num(max_vel) * fraction * gate(window))
        }
    }
}

/// Compile the loading segments into `inlet_time_curve`.
///
/// Segment `i` contributes `bcpart_i`, gated to its own window; hold segments
/// contribute nothing but still advance the running start time.
pub fn compile_time_curve(segments: &[CurveSegment]) -> ModelResult<TimeCurve> {
    if segments.is_empty() {
        return Err(ModelError::EmptyLoading);
    }
    let windows = segment_windows(segments);
    let parts = segments
        .iter()
        .zip(&windows)
        .filter_map(|(seg, window)| {
            segment_expr(seg, window)
                .map(|e| BoundaryCurve::new(segment_curve_name(window.index), vec![e]))
        })
        .collect::<ModelResult<Vec<_>>>()?;
    let sum = Expr::Sum(parts.iter().map(|p| Expr::curve(p.name.clone())).collect());
    let deps: Vec<&BoundaryCurve> = parts.iter().collect();
    let curve = BoundaryCurve::composite(TIME_CURVE, vec![sum], &deps)?;
    Ok(TimeCurve {
        curve,
        parts,
        windows,
    })
}

/// Spatial profile across the inlet, as a function of the moving fluid coordinates.
pub fn compile_space_curve(
    profile: &SpaceProfile,
    coords: &FieldVariable,
) -> ModelResult<BoundaryCurve> {
    match *profile {
        SpaceProfile::ParabolicJet { width } => {
            let r = Expr::coord(coords.name.clone(), 1) / Expr::num(width);
            let jet = (Expr::num(1.0) - r.pow(Expr::num(2.0))).max(Expr::num(0.0));
            BoundaryCurve::new(SPACE_CURVE, vec![jet])
        }
    }
}

/// Inlet velocity vector `[0, time * space]`.
pub fn compile_inlet_velocity(
    time: &BoundaryCurve,
    space: &BoundaryCurve,
) -> ModelResult<BoundaryCurve> {
    let axial = Expr::curve(time.name.clone()) * Expr::curve(space.name.clone());
    BoundaryCurve::composite(INLET_VELOCITY, vec![Expr::num(0.0), axial], &[time, space])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(max_vel: f64, period: f64, cycles: u32) -> CurveSegment {
        CurveSegment::Sine {
            max_vel,
            period,
            cycles,
        }
    }

    #[test]
    fn empty_loading_is_rejected() {
        assert_eq!(compile_time_curve(&[]).unwrap_err(), ModelError::EmptyLoading);
    }

    #[test]
    fn single_sine_renders() {
        let curve = compile_time_curve(&[sine(400.0, 1.0, 1)]).unwrap();
        assert_eq!(curve.parts.len(), 1);
        assert_eq!(curve.parts[0].name, "bcpart_0");
        let expected = format!("400*sin({}*t)*sin({}*t)*(t >= 0)*(t < 1)", PI, PI);
        assert_eq!(curve.parts[0].components[0].to_string(), expected);
        assert_eq!(curve.curve.components[0].to_string(), "bcpart_0");
        assert_eq!(curve.curve.deps, ["bcpart_0"]);
    }

    #[test]
    fn sine_phase_follows_absolute_time() {
        let segs = [CurveSegment::Hold { duration: 0.25 }, sine(10.0, 1.0, 1)];
        let curve = compile_time_curve(&segs).unwrap();
        let part = curve.parts[0].components[0].to_string();
        assert!(part.starts_with(&format!("10*sin({PI}*t)")), "{part}");
        // sin^2(0.75 pi) = 0.5
        assert!((curve.value_at(0.75).unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(curve.value_at(0.2), Some(0.0));
    }

    #[test]
    fn hold_advances_time_without_a_part() {
        let segs = [
            sine(200.0, 0.5, 1),
            CurveSegment::Hold { duration: 0.25 },
            CurveSegment::Ramp {
                max_vel: 10.0,
                duration: 0.25,
            },
        ];
        let curve = compile_time_curve(&segs).unwrap();
        let names: Vec<&str> = curve.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["bcpart_0", "bcpart_2"]);
        assert_eq!(curve.windows[2].start, 0.75);
        assert_eq!(curve.total_duration(), 1.0);
        assert_eq!(
            curve.curve.components[0].to_string(),
            "bcpart_0 + bcpart_2"
        );
        let ramp = curve.parts[1].components[0].to_string();
        assert!(ramp.contains("(t - 0.75)/0.25"), "{ramp}");
    }

    #[test]
    fn curve_values_follow_windows() {
        let segs = [
            sine(100.0, 1.0, 1),
            CurveSegment::Hold { duration: 1.0 },
            CurveSegment::Ramp {
                max_vel: 4.0,
                duration: 2.0,
            },
        ];
        let curve = compile_time_curve(&segs).unwrap();
        let at = |t: f64| curve.value_at(t).unwrap();
        assert!((at(0.5) - 100.0).abs() < 1e-9);
        assert_eq!(at(1.5), 0.0);
        assert!((at(3.0) - 2.0).abs() < 1e-12);
        assert_eq!(at(4.0), 0.0);
        assert_eq!(curve.active_windows(2.0).count(), 1);
    }

    #[test]
    fn inlet_velocity_depends_on_both_curves() {
        let time = compile_time_curve(&[sine(1.0, 1.0, 1)]).unwrap();
        let top = crate::topology::build_topology(&fsi_project::MeshDescription::standard("m"))
            .unwrap();
        let fvars = crate::fields::fluid_fields(&top, Default::default());
        let space = compile_space_curve(&SpaceProfile::default(), &fvars.xt).unwrap();
        assert_eq!(
            space.components[0].to_string(),
            "max(1 - (FluidXt.1/15)^2, 0)"
        );
        let vel = compile_inlet_velocity(&time.curve, &space).unwrap();
        assert_eq!(vel.deps, [TIME_CURVE, SPACE_CURVE]);
        assert_eq!(vel.components.len(), 2);
        assert_eq!(
            vel.components[1].to_string(),
            "inlet_time_curve*inlet_space_curve"
        );
    }

    #[test]
    fn dependency_order_puts_parts_first() {
        let time = compile_time_curve(&[sine(1.0, 1.0, 1), sine(2.0, 1.0, 1)]).unwrap();
        let mut curves = vec![time.curve.clone()];
        curves.extend(time.parts.iter().cloned());
        let order: Vec<&str> = dependency_order(&curves)
            .unwrap()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(order.last(), Some(&TIME_CURVE));
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn dependency_cycle_is_detected() {
        let a = BoundaryCurve {
            name: "a".into(),
            components: vec![Expr::curve("b")],
            deps: vec!["b".into()],
        };
        let b = BoundaryCurve {
            name: "b".into(),
            components: vec![Expr::curve("a")],
            deps: vec!["a".into()],
        };
        let err = dependency_order(&[a, b]).unwrap_err();
        assert!(matches!(err, ModelError::DependencyCycle { .. }));
    }

    #[test]
    fn undeclared_dependency_is_rejected() {
        let err = BoundaryCurve::new("c", vec![Expr::curve("other")]).unwrap_err();
        assert!(matches!(err, ModelError::DanglingReference { .. }));
        let err = BoundaryCurve::new("c", vec![Expr::curve("c")]).unwrap_err();
        assert_eq!(err, ModelError::DependencyCycle { curve: "c".into() });
    }
}
