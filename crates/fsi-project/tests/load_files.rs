use fsi_project::*;
use std::path::PathBuf;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const SINGLE_JSON: &str = r#"{
    "prefix": "pulse-2-neo_5kPa",
    "time": {"start": 1, "end": 1000, "step": 0.001},
    "loading": {
        "time": [
            {"type": "Sine", "max_vel": 400, "period": 0.25, "cycles": 2},
            {"type": "Hold", "duration": 0.5}
        ],
        "space": "parabolic"
    },
    "material": {"type": "NeoHookean", "k": [5000]}
}"#;

#[test]
fn load_json_file() {
    let dir = temp_dir("fsi_project_load_json");
    let path = dir.join("problem.json");
    std::fs::write(&path, SINGLE_JSON).unwrap();

    let problem = load_json(&path).unwrap();
    assert_eq!(problem.prefix, "pulse-2-neo_5kPa");
    assert_eq!(problem.loading.time.len(), 2);

    let same = load_problem(&path).unwrap();
    assert_eq!(problem, same);
}

#[test]
fn load_yaml_file() {
    let dir = temp_dir("fsi_project_load_yaml");
    let path = dir.join("problem.yaml");
    let yaml = r#"
prefix: exponential-3_5kPa
time:
  start: 1
  end: 200
  step: 0.005
loading:
  - type: Ramp
    max_vel: 100.0
    duration: 0.2
material:
  type: isotropic-exponential
  k: [5000, 3.0]
"#;
    std::fs::write(&path, yaml).unwrap();

    let problem = load_yaml(&path).unwrap();
    assert_eq!(
        problem.material,
        MaterialDescription::IsotropicExponential { k: 5000.0, b: 3.0 }
    );
    assert_eq!(problem.time.step_count(), 200);
    assert_eq!(load_problem(&path).unwrap(), problem);
}

#[test]
fn batch_reports_failing_entry() {
    let dir = temp_dir("fsi_project_batch");
    let path = dir.join("batch.json");
    let good: serde_json::Value = serde_json::from_str(SINGLE_JSON).unwrap();
    let mut bad = good.clone();
    bad["time"]["step"] = serde_json::json!("x");
    std::fs::write(
        &path,
        serde_json::to_string(&serde_json::json!([good.clone(), bad])).unwrap(),
    )
    .unwrap();

    match load_batch(&path) {
        Err(ProjectError::BatchEntry { index, source }) => {
            assert_eq!(index, 1);
            assert_eq!(source.to_string(), "time.step is not a float");
        }
        other => panic!("expected batch entry error, got {other:?}"),
    }

    std::fs::write(&path, serde_json::to_string(&good).unwrap()).unwrap();
    assert_eq!(load_batch(&path).unwrap().len(), 1);
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = temp_dir("fsi_project_malformed");
    let path = dir.join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_json(&path), Err(ProjectError::Json(_))));
}
