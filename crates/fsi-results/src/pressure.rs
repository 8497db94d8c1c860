//! Apex/inlet pressure traces and their summaries.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use fsi_project::ProblemDescription;
use tracing::{info, warn};

use crate::completion::result_files;
use crate::table::{column, read_rows};
use crate::{ResultsError, ResultsResult};

pub const SUMMARY_ALL_FILE: &str = "pressure_diff_all.D";

/// Pressure at the apex and inlet of one run, sampled on its time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureTrace {
    pub prefix: String,
    pub time: Vec<f64>,
    pub apex: Vec<f64>,
    pub inlet: Vec<f64>,
}

impl PressureTrace {
    pub fn difference(&self) -> Vec<f64> {
        self.apex
            .iter()
            .zip(&self.inlet)
            .map(|(a, i)| a - i)
            .collect()
    }

    /// Short label for aggregate tables: the prefix after its last `_`.
    pub fn label(&self) -> &str {
        self.prefix.rsplit('_').next().unwrap_or(&self.prefix)
    }
}

/// Import both traces of a run. The pressure is the second column of each
/// result file; time comes from the problem's step definition.
pub fn import_pressure(desc: &ProblemDescription) -> ResultsResult<PressureTrace> {
    let [apex_path, inlet_path] = result_files(desc);
    let apex = second_column(&apex_path)?;
    let inlet = second_column(&inlet_path)?;
    let time = desc.time.time_axis();
    for (path, len) in [(&apex_path, apex.len()), (&inlet_path, inlet.len())] {
        if len != time.len() {
            return Err(ResultsError::NoData {
                prefix: desc.prefix.clone(),
                reason: format!(
                    "{} has {len} rows for {} time steps",
                    path.display(),
                    time.len()
                ),
            });
        }
    }
    Ok(PressureTrace {
        prefix: desc.prefix.clone(),
        time,
        apex,
        inlet,
    })
}

fn second_column(path: &Path) -> ResultsResult<Vec<f64>> {
    let rows = read_rows(path)?;
    column(path, &rows, 1)
}

fn format_rows<'a>(time: &[f64], columns: impl IntoIterator<Item = &'a [f64]> + Clone) -> String {
    let mut out = String::new();
    for (i, t) in time.iter().enumerate() {
        let _ = write!(out, "{t:.9e}");
        for col in columns.clone() {
            let _ = write!(out, " {:.9e}", col[i]);
        }
        out.push('\n');
    }
    out
}

/// Path of the per-run summary table.
pub fn pressure_diff_path(desc: &ProblemDescription) -> PathBuf {
    desc.output_dir.join(format!("{}-pressure_diff.D", desc.prefix))
}

/// Write `time apex inlet apex-inlet` rows for one run.
pub fn write_pressure_diff(desc: &ProblemDescription) -> ResultsResult<PathBuf> {
    let trace = import_pressure(desc)?;
    let diff = trace.difference();
    let path = pressure_diff_path(desc);
    let text = format_rows(
        &trace.time,
        [trace.apex.as_slice(), trace.inlet.as_slice(), diff.as_slice()],
    );
    std::fs::write(&path, text).map_err(ResultsError::io(&path))?;
    info!(prefix = %desc.prefix, path = %path.display(), "wrote pressure summary");
    Ok(path)
}

/// Outcome of summarizing several runs together.
#[derive(Debug, Default)]
pub struct SummaryReport {
    /// The aggregate table, when at least one run had data.
    pub written: Option<PathBuf>,
    /// Labels of the runs in the aggregate, in column order.
    pub labels: Vec<String>,
    pub failures: Vec<(String, ResultsError)>,
}

/// Write `pressure_diff_all.D` into the first problem's output directory:
/// the time axis followed by one apex-inlet column per run with data.
///
/// A run without data is reported and skipped. Runs whose time axis differs
/// from the first usable run are reported as well.
pub fn summarize_all(descs: &[ProblemDescription]) -> SummaryReport {
    let mut report = SummaryReport::default();
    let Some(first) = descs.first() else {
        return report;
    };

    let mut time: Option<Vec<f64>> = None;
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for desc in descs {
        let trace = match import_pressure(desc) {
            Ok(trace) => trace,
            Err(err) => {
                warn!(prefix = %desc.prefix, error = %err, "no pressure data");
                report.failures.push((desc.prefix.clone(), err));
                continue;
            }
        };
        match &time {
            Some(axis) if axis != &trace.time => {
                let err = ResultsError::NoData {
                    prefix: desc.prefix.clone(),
                    reason: "time axis differs from the other runs".to_string(),
                };
                warn!(prefix = %desc.prefix, error = %err, "skipping run");
                report.failures.push((desc.prefix.clone(), err));
                continue;
            }
            Some(_) => {}
            None => time = Some(trace.time.clone()),
        }
        report.labels.push(trace.label().to_string());
        columns.push(trace.difference());
    }

    let Some(time) = time else {
        return report;
    };
    let path = first.output_dir.join(SUMMARY_ALL_FILE);
    let text = format_rows(&time, columns.iter().map(Vec::as_slice));
    match std::fs::write(&path, text) {
        Ok(()) => {
            info!(runs = columns.len(), path = %path.display(), "wrote pressure summary");
            report.written = Some(path);
        }
        Err(source) => {
            report
                .failures
                .push((first.prefix.clone(), ResultsError::Io { path, source }));
        }
    }
    report
}
