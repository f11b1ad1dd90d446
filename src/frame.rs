//! Date-indexed tables of `f64` values, one column per symbol.
//!
//! A [`Frame`] is the value passed between pipeline stages: prices,
//! period returns, compounded returns and solver decision variables all use
//! it. Missing values are stored as `NaN` and read back as `None` through
//! [`Frame::get`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::error::{PrepError, Result};

/// Dates x symbols table. Dates are strictly ascending, symbols unique.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    /// Column-major: `columns[symbol][date]`.
    columns: Vec<Vec<f64>>,
}

/// Closing prices as returned by a price source.
pub type PriceTable = Frame;

/// Simple period-over-period returns.
pub type ReturnTable = Frame;

impl Frame {
    /// Build a frame, checking the axis invariants.
    pub fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PrepError::InvalidParameter(format!(
                "dates must be strictly ascending ({} then {})",
                w[0], w[1]
            )));
        }
        let mut seen = FxHashSet::default();
        for s in &symbols {
            if !seen.insert(s.as_str()) {
                return Err(PrepError::InvalidParameter(format!("duplicate symbol '{s}'")));
            }
        }
        if columns.len() != symbols.len() {
            return Err(PrepError::shape("frame columns", symbols.len(), columns.len()));
        }
        for col in &columns {
            if col.len() != dates.len() {
                return Err(PrepError::shape("frame column length", dates.len(), col.len()));
            }
        }
        Ok(Self {
            dates,
            symbols,
            columns,
        })
    }

    /// Empty frame with no dates and no symbols.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(date, symbol, value)` observations.
    ///
    /// Dates and symbols are sorted; a repeated `(date, symbol)` keeps the
    /// last value. Cells never observed are missing.
    pub fn from_observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, S, f64)>,
        S: Into<String>,
    {
        let mut cells: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut all_dates = BTreeSet::new();
        for (date, symbol, value) in observations {
            all_dates.insert(date);
            cells.entry(symbol.into()).or_default().insert(date, value);
        }
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
        let mut symbols = Vec::with_capacity(cells.len());
        let mut columns = Vec::with_capacity(cells.len());
        for (symbol, by_date) in cells {
            columns.push(
                dates
                    .iter()
                    .map(|d| by_date.get(d).copied().unwrap_or(f64::NAN))
                    .collect(),
            );
            symbols.push(symbol);
        }
        Self {
            dates,
            symbols,
            columns,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// True when the frame has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.symbols.is_empty()
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Raw column for `symbol`, `NaN` where missing.
    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.symbol_index(symbol).map(|i| self.columns[i].as_slice())
    }

    /// Column by position.
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Value at `(date, symbol)`; `None` if either is absent or the cell is missing.
    pub fn get(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        let row = self.date_index(date)?;
        let col = self.symbol_index(symbol)?;
        let v = self.columns[col][row];
        if v.is_nan() { None } else { Some(v) }
    }

    /// Keep only the listed symbols, in the given order. Unknown names are ignored.
    pub fn select(&self, symbols: &[String]) -> Self {
        let mut kept_symbols = Vec::new();
        let mut kept_columns = Vec::new();
        for s in symbols {
            if let Some(i) = self.symbol_index(s) {
                kept_symbols.push(s.clone());
                kept_columns.push(self.columns[i].clone());
            }
        }
        Self {
            dates: self.dates.clone(),
            symbols: kept_symbols,
            columns: kept_columns,
        }
    }

    /// Keep only rows where `keep(row_index)` is true.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.dates.len()).filter(|&r| keep(r)).collect();
        Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            symbols: self.symbols.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| rows.iter().map(|&r| col[r]).collect())
                .collect(),
        }
    }

    /// Drop every row that has a missing value in any column.
    pub fn drop_incomplete_rows(&self) -> Self {
        self.filter_rows(|r| self.columns.iter().all(|col| !col[r].is_nan()))
    }

    /// Row `r` as a vector across symbols.
    pub fn row(&self, r: usize) -> Vec<f64> {
        self.columns.iter().map(|col| col[r]).collect()
    }

    /// Iterate `(date, row)` pairs in chronological order.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<f64>)> + '_ {
        self.dates.iter().enumerate().map(|(r, &d)| (d, self.row(r)))
    }
}

/// A single date-indexed series, e.g. a capital trajectory.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    points: BTreeMap<NaiveDate, f64>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        self.points.insert(date, value);
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().map(|(&d, &v)| (d, v))
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.iter().next().map(|(&d, &v)| (d, v))
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.iter().next_back().map(|(&d, &v)| (d, v))
    }
}

impl FromIterator<(NaiveDate, f64)> for Series {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, f64)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
