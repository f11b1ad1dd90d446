//! Price-to-return conversion and compounding into reporting periods.

use log::{debug, warn};

use crate::frame::{Frame, PriceTable, ReturnTable};
use crate::frequency::Frequency;

/// Compounded returns per reporting period, labelled by period end.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregatedReturnTable {
    /// Reporting frequency the rows were compounded at.
    pub frequency: Frequency,
    /// Period-end dates x symbols.
    pub returns: Frame,
    /// Symbols removed because they had fewer than two valid prices.
    pub dropped: Vec<String>,
}

impl AggregatedReturnTable {
    pub fn n_periods(&self) -> usize {
        self.returns.n_dates()
    }

    pub fn symbols(&self) -> &[String] {
        self.returns.symbols()
    }
}

/// Simple returns `p_t / p_{t-1} - 1`.
///
/// Each column is forward-filled after its first valid price, so a gap in
/// one symbol does not discard the other symbols' observations. Rows where
/// any kept symbol still has no defined return are dropped, which always
/// removes the first price date. Non-positive prices count as missing.
///
/// Returns the table and the symbols dropped for having fewer than two
/// valid prices.
pub fn simple_returns(prices: &PriceTable) -> (ReturnTable, Vec<String>) {
    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (i, symbol) in prices.symbols().iter().enumerate() {
        let valid = prices
            .column_at(i)
            .iter()
            .filter(|p| p.is_finite() && **p > 0.0)
            .count();
        if valid < 2 {
            warn!("dropping {symbol}: {valid} valid price(s), need at least 2");
            dropped.push(symbol.clone());
        } else {
            kept.push(symbol.clone());
        }
    }

    let n = prices.n_dates();
    if n < 2 || kept.is_empty() {
        return (
            Frame::new(Vec::new(), kept.clone(), vec![Vec::new(); kept.len()]).unwrap_or_default(),
            dropped,
        );
    }

    let mut columns = Vec::with_capacity(kept.len());
    for symbol in &kept {
        let raw = prices.column(symbol).unwrap_or(&[]);
        let mut last = f64::NAN;
        let filled: Vec<f64> = raw
            .iter()
            .map(|&p| {
                if p.is_finite() && p > 0.0 {
                    last = p;
                }
                last
            })
            .collect();
        let rets: Vec<f64> = filled.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        columns.push(rets);
    }

    let dates = prices.dates()[1..].to_vec();
    let full = Frame::new(dates, kept, columns).unwrap_or_default();
    let clean = full.drop_incomplete_rows();
    debug!(
        "simple returns: {} price rows -> {} return rows, {} symbols",
        n,
        clean.n_dates(),
        clean.n_symbols()
    );
    (clean, dropped)
}

/// Compound returns within each period of `frequency`: `prod(1 + r) - 1`.
///
/// Periods are labelled by their end date. A trailing partial period is kept
/// with whatever observations it has; periods without observations never
/// appear. Missing cells inside a period are skipped; a period where a symbol
/// has no value at all stays missing for that symbol.
pub fn compound(returns: &ReturnTable, frequency: Frequency) -> Frame {
    let dates = returns.dates();
    let mut labels = Vec::new();
    // (start, end) row ranges, contiguous because dates are ascending
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (r, &date) in dates.iter().enumerate() {
        let end = frequency.period_end(date);
        if labels.last() == Some(&end) {
            if let Some(g) = groups.last_mut() {
                g.1 = r + 1;
            }
        } else {
            labels.push(end);
            groups.push((r, r + 1));
        }
    }

    let columns = (0..returns.n_symbols())
        .map(|c| {
            let col = returns.column_at(c);
            groups
                .iter()
                .map(|&(start, end)| {
                    let mut growth = 1.0;
                    let mut seen = false;
                    for &r in &col[start..end] {
                        if !r.is_nan() {
                            growth *= 1.0 + r;
                            seen = true;
                        }
                    }
                    if seen { growth - 1.0 } else { f64::NAN }
                })
                .collect()
        })
        .collect();

    Frame::new(labels, returns.symbols().to_vec(), columns).unwrap_or_default()
}

/// Prices -> simple returns -> compounded returns at `frequency`.
///
/// ```
/// use chrono::NaiveDate;
/// use portfolio_prep::{aggregate, Frame, Frequency};
///
/// let dates: Vec<_> = (1..=3).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).collect();
/// let prices = Frame::new(dates, vec!["SPY".into()], vec![vec![100.0, 110.0, 121.0]]).unwrap();
/// let weekly = aggregate(&prices, Frequency::Weekly);
/// assert_eq!(weekly.n_periods(), 1);
/// assert!((weekly.returns.column("SPY").unwrap()[0] - 0.21).abs() < 1e-12);
/// ```
pub fn aggregate(prices: &PriceTable, frequency: Frequency) -> AggregatedReturnTable {
    let (returns, dropped) = simple_returns(prices);
    let compounded = compound(&returns, frequency);
    debug!(
        "aggregated {} return rows into {} {} periods",
        returns.n_dates(),
        compounded.n_dates(),
        frequency
    );
    AggregatedReturnTable {
        frequency,
        returns: compounded,
        dropped,
    }
}
