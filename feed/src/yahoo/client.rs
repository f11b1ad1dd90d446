//! Yahoo Finance chart API client.

use chrono::NaiveDate;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;

use super::types::{ChartResponse, ChartResult};
use crate::error::FeedError;
use crate::types::{FetchRequest, Span};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) portfolio-prep";

/// Blocking Yahoo chart client.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Chart URL for `symbol` under `request`.
    pub fn chart_url(&self, symbol: &str, request: &FetchRequest) -> String {
        let range = match &request.span {
            Span::Period(p) => format!("range={p}"),
            Span::Window { start, end } => {
                format!("period1={}&period2={}", epoch(*start), epoch(*end))
            }
        };
        format!(
            "{}/v8/finance/chart/{symbol}?{range}&interval={}&includePrePost=false",
            self.base_url, request.interval
        )
    }

    /// Fetch one symbol's chart (GET /v8/finance/chart/{symbol}).
    pub fn chart(&self, symbol: &str, request: &FetchRequest) -> Result<ChartResult, FeedError> {
        let url = self.chart_url(symbol, request);
        debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .map_err(|e| FeedError::Connection(format!("chart request failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FeedError::InvalidSymbol(symbol.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(FeedError::RateLimit),
            status => {
                let body = resp.text().unwrap_or_default();
                return Err(FeedError::Connection(format!(
                    "chart returned {status}: {body}"
                )));
            }
        }

        resp.json::<ChartResponse>()
            .map_err(|e| FeedError::Parse(format!("failed to parse chart for {symbol}: {e}")))?
            .into_result(symbol)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}
