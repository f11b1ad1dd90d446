//! Feed-to-core glue: expected returns for `generate`, realized returns
//! for `compare`.

use std::io::Write;

use chrono::{Days, NaiveDate};
use log::{info, warn};

use portfolio_prep::{
    DecayFactor, ExpectedReturnTable, Frame, Frequency, PriceTable, aggregate, estimate,
};
use portfolio_prep_feed::{FeedError, FetchRequest, Interval, PriceSource};

use crate::config::DataConfig;
use crate::error::{Error, Result};

/// Fetch prices for `symbols` and estimate per-period expected returns.
///
/// The decay factor is checked before any data is requested. Symbols the
/// source does not return, or that never produce a return, are absent
/// from the result.
pub fn expected_returns<S: PriceSource + ?Sized>(
    source: &S,
    symbols: &[String],
    data: &DataConfig,
    today: NaiveDate,
) -> Result<ExpectedReturnTable> {
    DecayFactor::new(data.lambda)?;
    let frequency = data.frequency()?;
    let request = data.fetch_request(today)?;
    info!("fetching {} symbols ({request})", symbols.len());

    let prices = source.closes(symbols, &request)?;
    let aggregated = aggregate(&prices, frequency);
    info!(
        "{} {frequency} periods for {} symbols",
        aggregated.n_periods(),
        aggregated.symbols().len()
    );

    let table = estimate(&aggregated, data.lambda, &data.horizon(today), today)?;
    if table.is_empty() || table.n_symbols() == 0 {
        return Err(Error::DataUnavailable(FeedError::NoData(
            "no symbol produced a complete return history".into(),
        )));
    }
    Ok(table)
}

/// Frequency implied by the gap between the first two decision dates.
pub fn infer_frequency(dates: &[NaiveDate]) -> Option<Frequency> {
    match dates {
        [first, second, ..] => Some(Frequency::from_spacing((*second - *first).num_days())),
        _ => None,
    }
}

/// Realized returns per `frequency` period covering the decision dates.
///
/// Daily closes are fetched from the first decision date through the end
/// of the period after the last one, capped at `today`. Rows missing any
/// symbol are dropped before compounding. An empty table is returned when
/// the decision dates all lie in the future.
pub fn realized_returns<S: PriceSource + ?Sized>(
    source: &S,
    symbols: &[String],
    decision_dates: &[NaiveDate],
    frequency: Frequency,
    today: NaiveDate,
) -> Result<Frame> {
    let (Some(&first), Some(&last)) = (decision_dates.first(), decision_dates.last()) else {
        return Ok(Frame::empty());
    };
    let horizon_end = frequency.next_end(frequency.period_end(last));
    let end = horizon_end.min(today).checked_add_days(Days::new(1)).unwrap_or(horizon_end);
    if first >= end {
        warn!("decision dates start {first}, after {today}: nothing realized yet");
        return Ok(Frame::empty());
    }

    let request = FetchRequest::window(first, end, Interval::Daily)?;
    info!("fetching realized prices for {} symbols ({request})", symbols.len());
    let prices = source.closes(symbols, &request)?;
    let complete = prices.drop_incomplete_rows();
    if complete.n_dates() < prices.n_dates() {
        warn!(
            "dropped {} price rows with missing symbols",
            prices.n_dates() - complete.n_dates()
        );
    }
    Ok(aggregate(&complete, frequency).returns)
}

/// Write `prices` as CSV: a `Date` column then one column per symbol.
pub fn write_prices_csv<W: Write>(prices: &PriceTable, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec!["Date".to_string()];
    header.extend(prices.symbols().iter().cloned());
    wtr.write_record(&header)?;
    for (date, row) in prices.rows() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(
            row.iter()
                .map(|v| if v.is_nan() { String::new() } else { format!("{v:.6}") }),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
