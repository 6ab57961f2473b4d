//! CSV ingest.
//!
//! Turns a numeric CSV with one header row into a design matrix plus target.
//!
//! - one column (chosen by index, negative counts from the end) is the target;
//!   every other column is a candidate feature, in file order
//! - rows with the wrong field count or a non-numeric cell are skipped and
//!   reported, the rest is kept
//! - no scaling or centering happens here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;
use tracing::warn;

use crate::error::AppError;

/// Dataset loaded from CSV.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `rows x (columns - 1)` feature matrix.
    pub x: DMatrix<f64>,
    pub y: Vec<f64>,
    /// Header names for all file columns, target included.
    pub names: Vec<String>,
    /// Index of the target among the file columns.
    pub target_col: usize,
    pub row_errors: Vec<RowError>,
}

/// A skipped CSV row.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

impl Dataset {
    pub fn rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.x.ncols()
    }

    /// Header name of feature column `i` of `x`.
    pub fn feature_name(&self, i: usize) -> &str {
        let file_col = if i < self.target_col { i } else { i + 1 };
        self.names.get(file_col).map(String::as_str).unwrap_or("?")
    }

    pub fn feature_names(&self) -> Vec<String> {
        (0..self.num_features())
            .map(|i| self.feature_name(i).to_string())
            .collect()
    }

    pub fn target_name(&self) -> &str {
        &self.names[self.target_col]
    }

    /// Feature column of `x` with header `name`, if any.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        let file_col = self.names.iter().position(|n| n == name)?;
        match file_col.cmp(&self.target_col) {
            std::cmp::Ordering::Less => Some(file_col),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(file_col - 1),
        }
    }
}

/// Load a dataset from `path`; `target` may be negative to count from the last column.
pub fn load_dataset(path: &Path, target: isize) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open CSV '{}': {e}", path.display())))?;
    parse_dataset(file, target)
}

pub fn parse_dataset<R: Read>(input: R, target: isize) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names: Vec<String> = headers
        .iter()
        // Some tools prefix the first header with a UTF-8 BOM.
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let num_cols = names.len();
    if num_cols < 2 {
        return Err(AppError::config(format!(
            "CSV needs a target and at least one feature column, found {num_cols} column(s)."
        )));
    }
    let target_col = resolve_target(target, num_cols)?;

    let mut values: Vec<f64> = Vec::new();
    let mut y = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, num_cols));
        match parsed {
            Ok(row) => {
                for (col, v) in row.into_iter().enumerate() {
                    if col == target_col {
                        y.push(v);
                    } else {
                        values.push(v);
                    }
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(
            skipped = row_errors.len(),
            first_line = row_errors[0].line,
            first_error = %row_errors[0].message,
            "skipped malformed CSV rows"
        );
    }
    if y.is_empty() {
        return Err(AppError::data("CSV contains no valid data rows."));
    }

    let x = DMatrix::from_row_slice(y.len(), num_cols - 1, &values);
    Ok(Dataset {
        x,
        y,
        names,
        target_col,
        row_errors,
    })
}

fn resolve_target(target: isize, num_cols: usize) -> Result<usize, AppError> {
    let cols = num_cols as isize;
    let resolved = if target < 0 { target + cols } else { target };
    if !(0..cols).contains(&resolved) {
        return Err(AppError::config(format!(
            "Target column {target} is out of range for {num_cols} columns."
        )));
    }
    Ok(resolved as usize)
}

fn parse_row(record: &StringRecord, num_cols: usize) -> Result<Vec<f64>, String> {
    if record.len() != num_cols {
        return Err(format!("expected {num_cols} fields, found {}", record.len()));
    }
    record
        .iter()
        .enumerate()
        .map(|(col, cell)| match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(format!("column {}: '{cell}' is not a finite number", col + 1)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "a,b,target,c\n1,2,10,3\n4,5,20,6\n7,8,30,9\n";

    #[test]
    fn splits_target_from_features() {
        let data = parse_dataset(SAMPLE.as_bytes(), 2).unwrap();
        assert_eq!(data.rows(), 3);
        assert_eq!(data.num_features(), 3);
        assert_eq!(data.y, vec![10.0, 20.0, 30.0]);
        assert_eq!(data.x[(1, 0)], 4.0);
        assert_eq!(data.x[(1, 2)], 6.0);
        assert_eq!(data.feature_names(), vec!["a", "b", "c"]);
        assert_eq!(data.target_name(), "target");
        assert_eq!(data.feature_index("c"), Some(2));
        assert_eq!(data.feature_index("target"), None);
    }

    #[test]
    fn negative_target_counts_from_the_end() {
        let data = parse_dataset(SAMPLE.as_bytes(), -1).unwrap();
        assert_eq!(data.target_col, 3);
        assert_eq!(data.y, vec![3.0, 6.0, 9.0]);
        assert_eq!(data.feature_name(2), "target");
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "x1,x2,y\n1,2,3\n1,oops,3\n4,5\n 7 , 8 , 9 \n";
        let data = parse_dataset(csv.as_bytes(), -1).unwrap();
        assert_eq!(data.rows(), 2);
        assert_eq!(data.y, vec![3.0, 9.0]);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn rejects_out_of_range_target() {
        let err = parse_dataset(SAMPLE.as_bytes(), 4).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(parse_dataset(SAMPLE.as_bytes(), -5).is_err());
    }

    #[test]
    fn header_only_is_a_data_error() {
        let err = parse_dataset("a,b\n".as_bytes(), 0).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }
}
