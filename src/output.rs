/*
Run output on disk.

    <log_dir>/log.txt        "<iteration> <best energy, 4 decimals>" per report
    <log_dir>/positions.txt  best positions, one particle per line, %1.6e
    <log_dir>/summary.json   MinimizationReport, written once at the end

The log file is opened (truncated) when the RunLog is created and closed when
it is dropped.
 */

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::constants::{LOG_FILE, POSITIONS_FILE, SUMMARY_FILE};
use crate::error::{MinimizeError, Result};
use crate::minimization::MinimizationReport;

pub struct RunLog {
    dir: PathBuf,
    log: BufWriter<File>,
}

impl RunLog {
    /// Create `dir` (and parents) if missing and open a fresh log.txt inside it.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| MinimizeError::io(&dir, source))?;

        let log_path = dir.join(LOG_FILE);
        let file = File::create(&log_path).map_err(|source| MinimizeError::io(&log_path, source))?;
        log::debug!("logging to {}", dir.display());

        Ok(RunLog {
            dir,
            log: BufWriter::new(file),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one progress line and overwrite the positions snapshot.
    pub fn record(&mut self, iteration: usize, best_energy: f64, best_positions: &Array2<f64>) -> Result<()> {
        let log_path = self.dir.join(LOG_FILE);
        writeln!(self.log, "{} {:5.4}", iteration, best_energy)
            .and_then(|_| self.log.flush())
            .map_err(|source| MinimizeError::io(&log_path, source))?;

        write_positions(self.dir.join(POSITIONS_FILE), best_positions)
    }

    pub fn write_summary(&self, report: &MinimizationReport) -> Result<()> {
        let path = self.dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(report)
            .map_err(|err| MinimizeError::io(&path, err.into()))?;
        fs::write(&path, json).map_err(|source| MinimizeError::io(&path, source))
    }
}

/// C-style `%1.6e`: six digits after the point and an exponent of at least two
/// digits with an explicit sign, e.g. `-1.234568e-01`.
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}

pub fn format_positions(positions: &Array2<f64>) -> String {
    let mut out = String::new();
    for row in positions.outer_iter() {
        let line: Vec<String> = row.iter().map(|&x| format_scientific(x)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn write_positions(path: impl AsRef<Path>, positions: &Array2<f64>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_positions(positions)).map_err(|source| MinimizeError::io(path, source))
}

/// Read a positions file back into an N x D matrix. Every non-empty line must
/// carry the same number of values.
pub fn read_positions(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| MinimizeError::io(path, source))?;

    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = None;
    for (line_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || MinimizeError::InvalidPositions {
            path: path_str.clone(),
            line: line_idx + 1,
        };

        let row = line
            .split_whitespace()
            .map(|token| token.parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|_| malformed())?;

        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => return Err(malformed()),
            Some(_) => {}
        }
        values.extend(row);
        rows += 1;
    }

    Array2::from_shape_vec((rows, cols.unwrap_or(0)), values).map_err(|_| MinimizeError::InvalidPositions {
        path: path_str,
        line: rows,
    })
}
