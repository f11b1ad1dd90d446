//! Market-data adapters for portfolio-prep.
//!
//! Provides the `PriceSource` and `InstrumentLookup` traits that abstract
//! over data providers. Implementations:
//!
//! - **Mock** (`mock`): in-memory series for tests
//! - **Yahoo** (feature `yahoo`): Yahoo Finance chart API, blocking

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "yahoo")]
pub mod yahoo;

pub use error::FeedError;
pub use types::*;

use chrono::NaiveDate;
use log::{debug, warn};
use portfolio_prep::{AssetClass, ClassifyStage, Frame, InstrumentProfile, PriceTable, RuleChain};

/// A provider of closing-price history.
pub trait PriceSource {
    /// Closing prices for `symbols`, one column per symbol that returned data.
    ///
    /// Symbols the provider does not know, or that have no history in the
    /// requested span, are left out. Transport failures abort the call.
    fn closes(&self, symbols: &[String], request: &FetchRequest) -> Result<PriceTable, FeedError>;
}

/// A provider of instrument metadata.
pub trait InstrumentLookup {
    fn profile(&self, symbol: &str) -> Result<InstrumentProfile, FeedError>;
}

/// Fetch every symbol with `fetch_one` and merge into one table.
///
/// Per-symbol failures ([`FeedError::is_per_symbol`]) are logged and the
/// symbol skipped; any other failure is returned immediately. When no
/// symbol yields data the result is [`FeedError::NoData`].
pub fn collect_closes<F>(symbols: &[String], mut fetch_one: F) -> Result<PriceTable, FeedError>
where
    F: FnMut(&str) -> Result<Vec<(NaiveDate, f64)>, FeedError>,
{
    let mut observations = Vec::new();
    let mut delivered = 0usize;
    for symbol in symbols {
        match fetch_one(symbol) {
            Ok(points) if points.is_empty() => {
                warn!("{symbol}: no closing prices returned, skipping");
            }
            Ok(points) => {
                debug!("{symbol}: {} closing prices", points.len());
                delivered += 1;
                observations.extend(points.into_iter().map(|(d, p)| (d, symbol.clone(), p)));
            }
            Err(e) if e.is_per_symbol() => {
                warn!("{symbol}: {e}, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    if delivered == 0 && !symbols.is_empty() {
        return Err(FeedError::NoData(format!(
            "none of {} requested symbols returned prices",
            symbols.len()
        )));
    }
    Ok(Frame::from_observations(observations))
}

/// Classification stage backed by a live instrument lookup.
///
/// Lookup failures and profiles the rules cannot place fall through to the
/// next stage.
pub struct LiveStage<'a, L: InstrumentLookup + ?Sized> {
    lookup: &'a L,
    rules: RuleChain,
}

impl<'a, L: InstrumentLookup + ?Sized> LiveStage<'a, L> {
    pub fn new(lookup: &'a L, rules: RuleChain) -> Self {
        Self { lookup, rules }
    }
}

impl<L: InstrumentLookup + ?Sized> ClassifyStage for LiveStage<'_, L> {
    fn name(&self) -> &str {
        "live"
    }

    fn classify(&self, symbol: &str) -> Option<AssetClass> {
        match self.lookup.profile(symbol) {
            Ok(profile) => self.rules.classify(&profile),
            Err(e) => {
                warn!("{symbol}: live lookup failed: {e}");
                None
            }
        }
    }
}
