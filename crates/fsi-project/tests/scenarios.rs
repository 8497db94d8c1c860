use fsi_core::{Domain, ElementKind, OrderLevel, PatchRole};
use fsi_project::*;
use proptest::prelude::*;
use serde_json::{Value, json};

fn scenario_one() -> Value {
    json!({
        "prefix": "neohookean_30",
        "time": {"start": 1, "end": 1000, "step": 0.001},
        "loading": {
            "time": [{"type": "Sine", "max_vel": 200.0, "period": 0.5, "cycles": 2}],
            "space": {"type": "parabolic", "width": 15.0}
        },
        "material": {"type": "NeoHookean", "k": [30000]}
    })
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn scenario_one_validates() {
    let problem = validate(&scenario_one()).unwrap();
    assert_eq!(problem.prefix, "neohookean_30");
    assert_eq!(
        problem.loading.time,
        vec![CurveSegment::Sine {
            max_vel: 200.0,
            period: 0.5,
            cycles: 2
        }]
    );
    assert_eq!(problem.loading.space, SpaceProfile::ParabolicJet { width: 15.0 });
}

#[test]
fn scenario_three_arity_error() {
    let mut raw = scenario_one();
    raw["material"] = json!({"type": "isotropic-exponential", "k": [5000]});
    let err = validate(&raw).unwrap_err();
    assert!(matches!(err, ValidationError::Arity { expected: 2, found: 1, .. }));
    assert!(err.to_string().starts_with("material.k for isotropic-exponential"));
}

#[test]
fn explicit_mesh_section() {
    let home = temp_dir("fsi_project_explicit_mesh");
    let mut raw = scenario_one();
    raw["output_dir"] = json!(home.to_str().unwrap());
    raw["mesh"] = json!({
        "home": home.to_str().unwrap(),
        "solid": {
            "1": {"name": "s1", "elem": "TRIANGLE_ELEMENT"},
            "2": {"name": "s2", "elem": "TRIANGLE_ELEMENT"}
        },
        "fluid": {
            "0": {"name": "f0", "elem": "QUADRILATERAL_ELEMENT"},
            "1": {"name": "f1", "elem": "QUADRILATERAL_ELEMENT"},
            "2": {"name": "f2", "elem": "QUADRILATERAL_ELEMENT"}
        },
        "solid_bcpatch": {"apex": 5, "inlet": 2, "interface": 4},
        "fluid_bcpatch": {"apex": 7, "inlet": 1, "interface": 3}
    });
    let problem = validate(&raw).unwrap();
    assert_eq!(problem.mesh.home, home);
    assert_eq!(problem.mesh.fluid[&OrderLevel::Const].elem, ElementKind::Quadrilateral);
    assert_eq!(problem.mesh.patch(Domain::Fluid, PatchRole::Apex), Some(7));
    assert_eq!(problem.mesh.patch(Domain::Solid, PatchRole::Interface), Some(4));

    let mut missing_order = raw.clone();
    missing_order["mesh"]["fluid"].as_object_mut().unwrap().remove("0");
    assert_eq!(
        validate(&missing_order).unwrap_err().to_string(),
        "mesh.fluid is missing order level 0"
    );

    let mut bad_elem = raw.clone();
    bad_elem["mesh"]["solid"]["1"]["elem"] = json!("PRISM_ELEMENT");
    assert_eq!(
        validate(&bad_elem).unwrap_err().to_string(),
        "mesh.solid.1.elem must be a supported element type"
    );

    let mut bad_key = raw.clone();
    bad_key["mesh"]["solid"]["7"] = json!({"name": "s7", "elem": "TRIANGLE_ELEMENT"});
    assert_eq!(
        validate(&bad_key).unwrap_err().to_string(),
        "mesh.solid.7 is not an order level (expected 0, 1 or 2)"
    );

    let mut bad_patch = raw.clone();
    bad_patch["mesh"]["fluid_bcpatch"]["outlet"] = json!(9);
    assert_eq!(
        validate(&bad_patch).unwrap_err().to_string(),
        "mesh.fluid_bcpatch.outlet is not a recognized key"
    );

    let mut missing_patch = raw;
    missing_patch["mesh"]["solid_bcpatch"]
        .as_object_mut()
        .unwrap()
        .remove("inlet");
    assert_eq!(
        validate(&missing_patch).unwrap_err().to_string(),
        "mesh.solid_bcpatch.inlet is missing"
    );
}

#[test]
fn prefixes_share_output_dir_without_collision() {
    let mut a = scenario_one();
    a["prefix"] = json!("neohookean_10");
    let mut b = scenario_one();
    b["prefix"] = json!("neohookean_20");
    let a = validate(&a).unwrap();
    let b = validate(&b).unwrap();
    assert_eq!(a.output_dir, b.output_dir);
    assert_ne!(a.run_dir(), b.run_dir());
    assert!(!a.run_dir().starts_with(b.run_dir()));
    assert!(!b.run_dir().starts_with(a.run_dir()));
    assert_ne!(a.document_path(), b.document_path());
}

fn segment_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0.0f64..500.0, 0.01f64..2.0, 1u32..5).prop_map(|(v, p, c)| {
            json!({"type": "Sine", "max_vel": v, "period": p, "cycles": c})
        }),
        (0.01f64..2.0).prop_map(|d| json!({"type": "Hold", "duration": d})),
        (0.0f64..500.0, 0.01f64..2.0)
            .prop_map(|(v, d)| json!({"type": "Ramp", "max_vel": v, "duration": d})),
    ]
}

proptest! {
    #[test]
    fn validation_is_deterministic(
        segments in prop::collection::vec(segment_strategy(), 1..6),
        k in 1.0f64..1.0e5,
    ) {
        let mut raw = scenario_one();
        raw["loading"]["time"] = Value::Array(segments);
        raw["material"] = json!({"type": "NeoHookean", "k": [k]});
        let first = validate(&raw).unwrap();
        let second = validate(&raw).unwrap();
        prop_assert_eq!(first, second);
    }
}
