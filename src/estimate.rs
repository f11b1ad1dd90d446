//! Exponentially weighted expected returns and decision-period labelling.
//!
//! The estimator is causal: each estimate only uses returns up to and
//! including its own period.
//!
//! ```text
//! E_0 = r_0
//! E_t = (1 - lambda) * r_t + lambda * E_{t-1}
//! ```

use std::fmt;

use chrono::NaiveDate;
use log::debug;

use crate::error::{PrepError, Result};
use crate::frequency::Frequency;
use crate::returns::AggregatedReturnTable;

/// Smoothing memory `lambda`, strictly inside `(0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecayFactor(f64);

impl DecayFactor {
    pub fn new(lambda: f64) -> Result<Self> {
        if lambda > 0.0 && lambda < 1.0 {
            Ok(Self(lambda))
        } else {
            Err(PrepError::InvalidParameter(format!(
                "decay factor must be in (0, 1), got {lambda}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Where decision-period labels are anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Horizon {
    /// Labels start at the period containing today.
    #[default]
    FromToday,
    /// Labels are anchored at `end`, or today when `end` is open.
    Window {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
}

impl Horizon {
    /// Anchor date for relabelling.
    pub fn anchor(&self, today: NaiveDate) -> NaiveDate {
        match *self {
            Horizon::FromToday => today,
            Horizon::Window { end, .. } => end.unwrap_or(today),
        }
    }
}

/// EWMA over one series.
///
/// Missing inputs carry the previous estimate forward; leading missing
/// values stay missing until the first observation seeds `E_0`.
pub fn ewma(series: &[f64], lambda: DecayFactor) -> Vec<f64> {
    let l = lambda.value();
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for &r in series {
        let next = match (prev, r.is_nan()) {
            (_, true) => prev,
            (None, false) => Some(r),
            (Some(e), false) => Some((1.0 - l) * r + l * e),
        };
        out.push(next.unwrap_or(f64::NAN));
        prev = next;
    }
    out
}

/// `n` decision-period labels for `frequency` under `horizon`.
pub fn relabel(n: usize, frequency: Frequency, horizon: &Horizon, today: NaiveDate) -> Vec<NaiveDate> {
    frequency.labels_from(horizon.anchor(today), n)
}

/// Expected returns, symbols as rows and decision periods as columns.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpectedReturnTable {
    pub frequency: Frequency,
    /// Sorted.
    pub symbols: Vec<String>,
    /// Chronological decision-period labels.
    pub periods: Vec<NaiveDate>,
    /// `values[symbol][period]`.
    pub values: Vec<Vec<f64>>,
}

impl ExpectedReturnTable {
    pub fn empty(frequency: Frequency) -> Self {
        Self {
            frequency,
            symbols: Vec::new(),
            periods: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn row(&self, symbol: &str) -> Option<&[f64]> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.values[i].as_slice())
    }
}

impl fmt::Display for ExpectedReturnTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}", "")?;
        for p in &self.periods {
            write!(f, " {:>10}", p.format("%Y-%m-%d"))?;
        }
        writeln!(f)?;
        for (s, row) in self.symbols.iter().zip(&self.values) {
            write!(f, "{s:<8}")?;
            for v in row {
                write!(f, " {:>9.4}%", v * 100.0)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Smooth every symbol of `aggregated` and relabel the periods.
///
/// Fails with [`PrepError::InvalidParameter`] before touching the data when
/// `lambda` is outside `(0, 1)`. Zero input periods yield an empty table.
pub fn estimate(
    aggregated: &AggregatedReturnTable,
    lambda: f64,
    horizon: &Horizon,
    today: NaiveDate,
) -> Result<ExpectedReturnTable> {
    let lambda = DecayFactor::new(lambda)?;
    let frequency = aggregated.frequency;
    let table = &aggregated.returns;
    let n = table.n_dates();
    if n == 0 {
        return Ok(ExpectedReturnTable::empty(frequency));
    }

    let mut order: Vec<usize> = (0..table.n_symbols()).collect();
    order.sort_by(|&a, &b| table.symbols()[a].cmp(&table.symbols()[b]));

    let symbols = order.iter().map(|&i| table.symbols()[i].clone()).collect();
    let values = order
        .iter()
        .map(|&i| ewma(table.column_at(i), lambda))
        .collect();
    let periods = relabel(n, frequency, horizon, today);
    debug!(
        "estimated {} symbols over {} {} periods starting {}",
        table.n_symbols(),
        n,
        frequency,
        periods[0]
    );

    Ok(ExpectedReturnTable {
        frequency,
        symbols,
        periods,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn aggregated(cols: &[(&str, Vec<f64>)]) -> AggregatedReturnTable {
        let n = cols[0].1.len();
        let dates = Frequency::Monthly.labels_from(d(2023, 1, 1), n);
        AggregatedReturnTable {
            frequency: Frequency::Monthly,
            returns: Frame::new(
                dates,
                cols.iter().map(|(s, _)| s.to_string()).collect(),
                cols.iter().map(|(_, c)| c.clone()).collect(),
            )
            .unwrap(),
            dropped: Vec::new(),
        }
    }

    #[test]
    fn decay_bounds() {
        assert!(DecayFactor::new(0.0).is_err());
        assert!(DecayFactor::new(1.0).is_err());
        assert!(DecayFactor::new(-0.5).is_err());
        assert!(DecayFactor::new(f64::NAN).is_err());
        assert!(DecayFactor::new(0.94).is_ok());
    }

    #[test]
    fn ewma_sequence() {
        let e = ewma(&[0.02, -0.01, 0.03], DecayFactor::new(0.94).unwrap());
        assert!((e[0] - 0.02).abs() < 1e-12);
        assert!((e[1] - 0.0182).abs() < 1e-12);
        assert!((e[2] - (0.94 * 0.0182 + 0.06 * 0.03)).abs() < 1e-12);
    }

    #[test]
    fn ewma_missing_carries_forward() {
        let e = ewma(&[f64::NAN, 0.01, f64::NAN, 0.02], DecayFactor::new(0.5).unwrap());
        assert!(e[0].is_nan());
        assert_eq!(e[1], 0.01);
        assert_eq!(e[2], 0.01);
        assert!((e[3] - 0.015).abs() < 1e-12);
    }

    #[test]
    fn symbols_sorted_in_output() {
        let agg = aggregated(&[("VTI", vec![0.01, 0.02]), ("AAPL", vec![0.03, 0.04])]);
        let t = estimate(&agg, 0.9, &Horizon::FromToday, d(2024, 5, 10)).unwrap();
        assert_eq!(t.symbols, vec!["AAPL".to_string(), "VTI".to_string()]);
        assert_eq!(t.row("AAPL").unwrap()[0], 0.03);
    }

    #[test]
    fn labels_from_today() {
        let agg = aggregated(&[("A", vec![0.01, 0.02, 0.03])]);
        let t = estimate(&agg, 0.9, &Horizon::FromToday, d(2024, 5, 10)).unwrap();
        assert_eq!(t.periods, vec![d(2024, 5, 31), d(2024, 6, 30), d(2024, 7, 31)]);
    }

    #[test]
    fn labels_anchored_at_window_end() {
        let agg = aggregated(&[("A", vec![0.01, 0.02])]);
        let horizon = Horizon::Window {
            start: d(2022, 1, 1),
            end: Some(d(2023, 3, 15)),
        };
        let t = estimate(&agg, 0.9, &horizon, d(2024, 5, 10)).unwrap();
        assert_eq!(t.periods, vec![d(2023, 3, 31), d(2023, 4, 30)]);
    }

    #[test]
    fn open_window_uses_today() {
        let agg = aggregated(&[("A", vec![0.01])]);
        let horizon = Horizon::Window {
            start: d(2022, 1, 1),
            end: None,
        };
        let t = estimate(&agg, 0.9, &horizon, d(2024, 5, 10)).unwrap();
        assert_eq!(t.periods, vec![d(2024, 5, 31)]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let agg = AggregatedReturnTable {
            frequency: Frequency::Weekly,
            returns: Frame::empty(),
            dropped: Vec::new(),
        };
        let t = estimate(&agg, 0.94, &Horizon::FromToday, d(2024, 1, 1)).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.n_periods(), 0);
    }

    #[test]
    fn invalid_lambda_checked_before_empty_shortcut() {
        let agg = AggregatedReturnTable {
            frequency: Frequency::Weekly,
            returns: Frame::empty(),
            dropped: Vec::new(),
        };
        assert!(estimate(&agg, 1.0, &Horizon::FromToday, d(2024, 1, 1)).is_err());
    }

    #[test]
    fn display_has_one_line_per_symbol() {
        let agg = aggregated(&[("A", vec![0.01]), ("B", vec![0.02])]);
        let t = estimate(&agg, 0.9, &Horizon::FromToday, d(2024, 5, 10)).unwrap();
        let s = t.to_string();
        assert_eq!(s.lines().count(), 3);
        assert!(s.contains("2024-05-31"));
        assert!(s.contains("2.0000%"));
    }
}
