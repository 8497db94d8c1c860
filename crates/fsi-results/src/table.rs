//! Whitespace-separated numeric tables, as the solver writes them.

use std::path::Path;

use crate::{ResultsError, ResultsResult};

/// One non-blank row and the 1-based file line it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub line: usize,
    pub values: Vec<f64>,
}

/// Read every non-blank row of a whitespace table.
///
/// Rows may differ in width; callers pick the columns they need.
pub fn read_table(path: &Path) -> ResultsResult<Vec<Vec<f64>>> {
    Ok(read_rows(path)?.into_iter().map(|r| r.values).collect())
}

pub(crate) fn read_rows(path: &Path) -> ResultsResult<Vec<Row>> {
    let content = std::fs::read_to_string(path).map_err(ResultsError::io(path))?;
    parse_rows(&content).map_err(|(line, reason)| ResultsError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    })
}

pub(crate) fn parse_rows(content: &str) -> Result<Vec<Row>, (usize, String)> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let values = trimmed
            .split_whitespace()
            .map(|cell| {
                cell.parse::<f64>()
                    .map_err(|_| (idx + 1, format!("'{cell}' is not a number")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(Row {
            line: idx + 1,
            values,
        });
    }
    Ok(rows)
}

/// Count the non-blank rows without parsing them.
pub(crate) fn count_rows(content: &str) -> usize {
    content.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Extract one column, failing on the first row that is too short.
pub(crate) fn column(path: &Path, rows: &[Row], col: usize) -> ResultsResult<Vec<f64>> {
    rows.iter()
        .map(|row| {
            row.values
                .get(col)
                .copied()
                .ok_or_else(|| ResultsError::Parse {
                    path: path.to_path_buf(),
                    line: row.line,
                    reason: format!(
                        "expected at least {} columns, found {}",
                        col + 1,
                        row.values.len()
                    ),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(rows: &[Row]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| r.values.clone()).collect()
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = parse_rows("1 2.5\n\n  2   -3e2 \n").unwrap();
        assert_eq!(values(&rows), vec![vec![1.0, 2.5], vec![2.0, -300.0]]);
        assert_eq!(rows[1].line, 3);
        assert_eq!(count_rows("1 2\n\n3 4\n   \n"), 2);
    }

    #[test]
    fn bad_cell_reports_line() {
        let (line, reason) = parse_rows("1 2\n3 nan?\n").unwrap_err();
        assert_eq!(line, 2);
        assert!(reason.contains("nan?"));
    }

    #[test]
    fn short_row_reports_file_line() {
        let rows = parse_rows("1 2\n\n\n3\n").unwrap();
        let err = column(Path::new("p.D"), &rows, 1).unwrap_err();
        assert!(matches!(err, ResultsError::Parse { line: 4, .. }));
    }
}
