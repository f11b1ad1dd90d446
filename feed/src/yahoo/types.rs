//! Yahoo chart API response types.

use chrono::{DateTime, NaiveDate};
use portfolio_prep::InstrumentProfile;
use serde::Deserialize;

use crate::error::FeedError;

/// Top-level `/v8/finance/chart/{symbol}` response.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Bar open times, seconds since the epoch (UTC).
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// The single result for `symbol`, mapping API errors to feed errors.
    pub fn into_result(self, symbol: &str) -> Result<ChartResult, FeedError> {
        if let Some(err) = self.chart.error {
            return Err(if err.code.eq_ignore_ascii_case("Not Found") {
                FeedError::InvalidSymbol(format!("{symbol}: {}", err.description))
            } else {
                FeedError::Other(format!("{symbol}: {} ({})", err.description, err.code))
            });
        }
        self.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FeedError::NoData(symbol.to_string()))
    }
}

impl ChartResult {
    /// `(exchange-local date, close)` pairs, skipping null closes.
    pub fn closes(&self) -> Vec<(NaiveDate, f64)> {
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };
        self.timestamp
            .iter()
            .zip(&quote.close)
            .filter_map(|(&ts, close)| {
                let close = (*close)?;
                let date = DateTime::from_timestamp(ts + self.meta.gmtoffset, 0)?.date_naive();
                Some((date, close))
            })
            .collect()
    }

    pub fn profile(&self) -> InstrumentProfile {
        InstrumentProfile {
            symbol: self.meta.symbol.clone(),
            kind: self.meta.instrument_type.clone(),
            sector: None,
            name: self.meta.long_name.clone().or_else(|| self.meta.short_name.clone()),
        }
    }
}
