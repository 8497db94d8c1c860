use std::path::{Path, PathBuf};

use fsi_project::{ProblemDescription, validate};
use fsi_results::{
    CompletionError, ResultsError, RunManifest, check_complete, document_hash, import_pressure,
    is_complete, read_table, summarize_all, write_pressure_diff,
};
use serde_json::json;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fsi_results_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn problem(out: &Path, prefix: &str) -> ProblemDescription {
    validate(&json!({
        "prefix": prefix,
        "output_dir": out.to_str().unwrap(),
        "time": {"start": 1, "end": 4, "step": 0.5},
        "loading": {"time": [{"type": "Hold", "duration": 1.0}]},
        "material": {"type": "NeoHookean", "k": [30000]}
    }))
    .unwrap()
}

fn write_trace(desc: &ProblemDescription, file: &str, values: &[f64]) {
    let dir = desc.run_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let text: String = values
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {v}\n", i + 1))
        .collect();
    std::fs::write(dir.join(file), text).unwrap();
}

fn finish(desc: &ProblemDescription, apex: &[f64], inlet: &[f64]) {
    write_trace(desc, "apex_pressure-0.D", apex);
    write_trace(desc, "inlet_pressure-0.D", inlet);
}

#[test]
fn missing_files_are_incomplete() {
    let out = scratch("missing");
    let desc = problem(&out, "run_1");
    assert!(matches!(
        check_complete(&desc),
        Err(CompletionError::MissingFile(_))
    ));
    write_trace(&desc, "apex_pressure-0.D", &[1.0, 2.0, 3.0, 4.0]);
    assert!(!is_complete(&desc));
}

#[test]
fn short_trace_is_incomplete() {
    let out = scratch("short");
    let desc = problem(&out, "run_1");
    finish(&desc, &[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0]);
    let Err(CompletionError::RowCount {
        found, expected, ..
    }) = check_complete(&desc)
    else {
        panic!("row count mismatch expected");
    };
    assert_eq!((found, expected), (2, 4));
}

#[test]
fn completion_check_is_idempotent() {
    let out = scratch("idempotent");
    let desc = problem(&out, "run_1");
    finish(&desc, &[1.0, 2.0, 3.0, 4.0], &[0.5; 4]);
    let before = std::fs::read_to_string(desc.run_dir().join("apex_pressure-0.D")).unwrap();
    assert!(is_complete(&desc));
    assert!(is_complete(&desc));
    let after = std::fs::read_to_string(desc.run_dir().join("apex_pressure-0.D")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn pressure_difference_is_written() {
    let out = scratch("diff");
    let desc = problem(&out, "run_1");
    finish(&desc, &[10.0, 20.0, 30.0, 40.0], &[1.0, 2.0, 3.0, 4.0]);

    let trace = import_pressure(&desc).unwrap();
    assert_eq!(trace.time, [0.5, 1.0, 1.5, 2.0]);
    assert_eq!(trace.difference(), [9.0, 18.0, 27.0, 36.0]);

    let path = write_pressure_diff(&desc).unwrap();
    assert_eq!(path, out.join("run_1-pressure_diff.D"));
    let rows = read_table(&path).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], [2.0, 40.0, 4.0, 36.0]);
}

#[test]
fn summary_reports_runs_without_data() {
    let out = scratch("summary");
    let done_a = problem(&out, "neohookean_30");
    let done_b = problem(&out, "neohookean_60");
    let missing = problem(&out, "neohookean_90");
    finish(&done_a, &[2.0; 4], &[1.0; 4]);
    finish(&done_b, &[5.0; 4], &[1.0; 4]);

    let report = summarize_all(&[done_a, missing, done_b]);
    assert_eq!(report.labels, ["30", "60"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "neohookean_90");
    assert!(matches!(report.failures[0].1, ResultsError::Io { .. }));

    let path = report.written.unwrap();
    assert_eq!(path, out.join("pressure_diff_all.D"));
    let rows = read_table(&path).unwrap();
    assert_eq!(rows[0], [0.5, 1.0, 4.0]);
}

#[test]
fn summary_of_nothing_writes_nothing() {
    let out = scratch("nothing");
    let report = summarize_all(&[problem(&out, "run_1")]);
    assert!(report.written.is_none());
    assert_eq!(report.failures.len(), 1);
    assert!(!out.join("pressure_diff_all.D").exists());
}

#[test]
fn manifest_round_trip() {
    let out = scratch("manifest");
    let desc = problem(&out, "run_1");
    std::fs::create_dir_all(desc.run_dir()).unwrap();
    let manifest = RunManifest::new(&desc, "document");
    assert_eq!(manifest.steps, 4);
    assert_eq!(manifest.document_sha256, document_hash("document"));
    assert!(chrono::DateTime::parse_from_rfc3339(&manifest.timestamp).is_ok());

    let path = manifest.save(&desc).unwrap();
    assert_eq!(path, desc.run_dir().join("manifest.json"));
    let loaded = RunManifest::load(&path).unwrap();
    assert_eq!(loaded, manifest);
    assert!(loaded.matches("document"));
}
