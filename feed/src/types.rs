//! Fetch request types: history span and bar interval.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::FeedError;

/// Lookback ranges accepted for [`Span::Period`].
pub const PERIODS: [&str; 11] = [
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Bar size of the downloaded price history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn code(self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Interval {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(Interval::Daily),
            "1wk" | "1w" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            other => Err(FeedError::Other(format!("unsupported interval '{other}'"))),
        }
    }
}

/// How much history to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Relative lookback ending now, e.g. `1y`.
    Period(String),
    /// Explicit `[start, end)` window.
    Window { start: NaiveDate, end: NaiveDate },
}

impl Span {
    pub fn period(code: &str) -> Result<Self, FeedError> {
        let code = code.trim();
        if PERIODS.contains(&code) {
            Ok(Span::Period(code.to_string()))
        } else {
            Err(FeedError::Other(format!(
                "unsupported period '{code}', expected one of {}",
                PERIODS.join(", ")
            )))
        }
    }

    pub fn window(start: NaiveDate, end: NaiveDate) -> Result<Self, FeedError> {
        if start >= end {
            return Err(FeedError::Other(format!(
                "window start {start} must precede end {end}"
            )));
        }
        Ok(Span::Window { start, end })
    }

    /// Whether `date` falls inside the span. Periods accept every date.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Span::Period(_) => true,
            Span::Window { start, end } => *start <= date && date < *end,
        }
    }
}

/// A complete history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub span: Span,
    pub interval: Interval,
}

impl FetchRequest {
    pub fn period(code: &str, interval: Interval) -> Result<Self, FeedError> {
        Ok(Self {
            span: Span::period(code)?,
            interval,
        })
    }

    pub fn window(start: NaiveDate, end: NaiveDate, interval: Interval) -> Result<Self, FeedError> {
        Ok(Self {
            span: Span::window(start, end)?,
            interval,
        })
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Span::Period(p) => write!(f, "range={p} interval={}", self.interval),
            Span::Window { start, end } => {
                write!(f, "{start}..{end} interval={}", self.interval)
            }
        }
    }
}
