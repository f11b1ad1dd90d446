//! Solver results reader.
//!
//! The solver exports one CSV row per (variable, symbol) with one column per
//! decision date:
//!
//! ```text
//! Variable,Activo,2024-01-31,2024-02-29
//! x,SPY,60.0,62.5
//! x,TLT,40.0,39.0
//! W,,100.0,101.5
//! ```
//!
//! `x` (positions), `y` (buys) and `z` (sells) pivot into date x symbol
//! tables; `W` becomes the planned-capital series.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rustc_hash::FxHashMap;

use portfolio_prep::{Frame, Series};

use crate::error::{Error, Result};

/// Accepted names of the symbol column.
const SYMBOL_COLUMNS: [&str; 3] = ["Activo", "Symbol", "Asset"];
const TABLE_VARIABLES: [&str; 3] = ["x", "y", "z"];

/// Pivoted solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResults {
    /// Capital held per symbol after each decision.
    pub x: Frame,
    /// Capital bought.
    pub y: Frame,
    /// Capital sold.
    pub z: Frame,
    /// Planned total capital.
    pub w: Series,
}

impl SolverResults {
    /// Read and pivot a results CSV. Structural problems are
    /// [`Error::MalformedFile`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text).map_err(|reason| Error::malformed(path, reason))
    }

    /// Decision dates, from the position table.
    pub fn decision_dates(&self) -> &[NaiveDate] {
        self.x.dates()
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let headers = reader.headers().map_err(|e| e.to_string())?.clone();

        let var_col = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("Variable"))
            .ok_or("missing 'Variable' column")?;
        let sym_col = headers
            .iter()
            .position(|h| SYMBOL_COLUMNS.iter().any(|c| h.eq_ignore_ascii_case(c)))
            .ok_or_else(|| format!("missing symbol column (one of {})", SYMBOL_COLUMNS.join(", ")))?;
        let date_cols = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != var_col && *i != sym_col)
            .map(|(i, h)| {
                parse_date(h)
                    .map(|d| (i, d))
                    .ok_or_else(|| format!("column '{h}' is not a date"))
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;
        if date_cols.is_empty() {
            return Err("no date columns".into());
        }

        let mut observations: FxHashMap<&str, Vec<(NaiveDate, String, f64)>> = FxHashMap::default();
        let mut w = Series::new();
        for (n, record) in reader.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            let line = record.position().map_or(n as u64 + 2, |p| p.line());
            let variable = record.get(var_col).unwrap_or_default();
            let symbol = record.get(sym_col).unwrap_or_default();
            let table = TABLE_VARIABLES.iter().copied().find(|v| *v == variable);
            if table.is_none() && variable != "W" {
                debug!("line {line}: skipping variable '{variable}'");
                continue;
            }
            for &(col, date) in &date_cols {
                let cell = record.get(col).unwrap_or_default();
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell
                    .parse()
                    .map_err(|_| format!("line {line}: '{cell}' is not a number"))?;
                match table {
                    Some(name) => {
                        if symbol.is_empty() {
                            return Err(format!("line {line}: '{name}' row without a symbol"));
                        }
                        observations
                            .entry(name)
                            .or_default()
                            .push((date, symbol.to_uppercase(), value));
                    }
                    None => w.insert(date, value),
                }
            }
        }
        if w.is_empty() {
            return Err("no 'W' row".into());
        }

        let mut frame = |name: &str| {
            observations
                .remove(name)
                .map(Frame::from_observations)
                .unwrap_or_else(Frame::empty)
        };
        Ok(Self {
            x: frame("x"),
            y: frame("y"),
            z: frame("z"),
            w,
        })
    }
}

fn parse_date(header: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(header, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(header, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
