//! Mock feed for testing: implements both feed traits over in-memory data.
//!
//! Use this in integration tests to simulate provider responses without
//! network calls.
//!
//! ```
//! use chrono::NaiveDate;
//! use portfolio_prep::InstrumentProfile;
//! use portfolio_prep_feed::mock::MockFeed;
//! use portfolio_prep_feed::{FetchRequest, Interval, PriceSource};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let feed = MockFeed::builder()
//!     .with_series("SPY", vec![(day(2), 470.0), (day(3), 468.5)])
//!     .with_profile(InstrumentProfile::new("SPY").with_kind("ETF"))
//!     .build();
//!
//! let request = FetchRequest::period("1y", Interval::Daily).unwrap();
//! let prices = feed.closes(&["SPY".to_string()], &request).unwrap();
//! assert_eq!(prices.n_dates(), 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use portfolio_prep::{InstrumentProfile, PriceTable};

use crate::error::FeedError;
use crate::types::FetchRequest;
use crate::{InstrumentLookup, PriceSource, collect_closes};

/// A recorded call for assertion in tests.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    Closes {
        symbols: Vec<String>,
        request: FetchRequest,
    },
    Profile(String),
}

/// Builder for `MockFeed`.
#[derive(Default)]
pub struct MockFeedBuilder {
    series: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    profiles: BTreeMap<String, InstrumentProfile>,
    failures: BTreeMap<String, FeedError>,
    offline: bool,
}

impl MockFeedBuilder {
    pub fn with_series(mut self, symbol: &str, points: Vec<(NaiveDate, f64)>) -> Self {
        self.series.insert(symbol.to_string(), points);
        self
    }

    pub fn with_profile(mut self, profile: InstrumentProfile) -> Self {
        self.profiles.insert(profile.symbol.clone(), profile);
        self
    }

    /// Every request touching `symbol` fails with `error`.
    pub fn failing(mut self, symbol: &str, error: FeedError) -> Self {
        self.failures.insert(symbol.to_string(), error);
        self
    }

    /// Every call fails with a connection error.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn build(self) -> MockFeed {
        MockFeed {
            series: self.series,
            profiles: self.profiles,
            failures: self.failures,
            offline: self.offline,
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// A mock feed that records calls and serves configured data.
pub struct MockFeed {
    series: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    profiles: BTreeMap<String, InstrumentProfile>,
    failures: BTreeMap<String, FeedError>,
    offline: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockFeed {
    pub fn builder() -> MockFeedBuilder {
        MockFeedBuilder::default()
    }

    /// All calls made so far (for assertion in tests).
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check(&self, symbol: &str) -> Result<(), FeedError> {
        if self.offline {
            return Err(FeedError::Connection("mock: offline".into()));
        }
        match self.failures.get(symbol) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl PriceSource for MockFeed {
    fn closes(&self, symbols: &[String], request: &FetchRequest) -> Result<PriceTable, FeedError> {
        self.record(RecordedCall::Closes {
            symbols: symbols.to_vec(),
            request: request.clone(),
        });
        collect_closes(symbols, |symbol| {
            self.check(symbol)?;
            let points = self
                .series
                .get(symbol)
                .ok_or_else(|| FeedError::InvalidSymbol(symbol.to_string()))?;
            Ok(points
                .iter()
                .copied()
                .filter(|(d, _)| request.span.contains(*d))
                .collect())
        })
    }
}

impl InstrumentLookup for MockFeed {
    fn profile(&self, symbol: &str) -> Result<InstrumentProfile, FeedError> {
        self.record(RecordedCall::Profile(symbol.to_string()));
        self.check(symbol)?;
        self.profiles
            .get(symbol)
            .cloned()
            .ok_or_else(|| FeedError::InvalidSymbol(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LiveStage;
    use crate::types::Interval;
    use portfolio_prep::{AssetClass, Classifier, RuleChain, StaticTable};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn year() -> FetchRequest {
        FetchRequest::period("1y", Interval::Daily).unwrap()
    }

    #[test]
    fn merges_symbols_on_union_of_dates() {
        let feed = MockFeed::builder()
            .with_series("A", vec![(day(2), 10.0), (day(3), 11.0)])
            .with_series("B", vec![(day(3), 20.0), (day(4), 21.0)])
            .build();
        let t = feed.closes(&["B".into(), "A".into()], &year()).unwrap();
        assert_eq!(t.dates(), &[day(2), day(3), day(4)]);
        assert_eq!(t.symbols(), &["A".to_string(), "B".to_string()]);
        assert_eq!(t.get(day(4), "A"), None);
    }

    #[test]
    fn unknown_symbol_skipped() {
        let feed = MockFeed::builder()
            .with_series("A", vec![(day(2), 10.0)])
            .build();
        let t = feed.closes(&["A".into(), "NOPE".into()], &year()).unwrap();
        assert_eq!(t.symbols(), &["A".to_string()]);
    }

    #[test]
    fn all_missing_is_no_data() {
        let feed = MockFeed::builder().build();
        let err = feed.closes(&["X".into()], &year()).unwrap_err();
        assert!(matches!(err, FeedError::NoData(_)));
    }

    #[test]
    fn transport_failure_propagates() {
        let feed = MockFeed::builder()
            .with_series("A", vec![(day(2), 10.0)])
            .failing("B", FeedError::RateLimit)
            .build();
        let err = feed.closes(&["A".into(), "B".into()], &year()).unwrap_err();
        assert_eq!(err, FeedError::RateLimit);
    }

    #[test]
    fn window_filters_dates() {
        let feed = MockFeed::builder()
            .with_series("A", vec![(day(2), 10.0), (day(3), 11.0), (day(4), 12.0)])
            .build();
        let req = FetchRequest::window(day(3), day(4), Interval::Daily).unwrap();
        let t = feed.closes(&["A".into()], &req).unwrap();
        assert_eq!(t.dates(), &[day(3)]);
        assert_eq!(feed.calls().len(), 1);
    }

    #[test]
    fn live_stage_falls_through_when_offline() {
        let offline = MockFeed::builder().offline().build();
        let classifier = Classifier::new()
            .stage(LiveStage::new(&offline, RuleChain::default()))
            .stage(StaticTable::builtin());
        assert_eq!(classifier.classify("TLT"), AssetClass::Bonds);
        assert_eq!(classifier.classify("NVDA"), AssetClass::Unknown);
        assert_eq!(offline.calls(), vec![
            RecordedCall::Profile("TLT".into()),
            RecordedCall::Profile("NVDA".into()),
        ]);
    }

    #[test]
    fn live_stage_uses_profile() {
        let feed = MockFeed::builder()
            .with_profile(InstrumentProfile::new("NVDA").with_kind("EQUITY"))
            .build();
        let classifier = Classifier::new()
            .stage(LiveStage::new(&feed, RuleChain::default()))
            .stage(StaticTable::builtin());
        assert_eq!(classifier.classify("NVDA"), AssetClass::Stocks);
    }
}
