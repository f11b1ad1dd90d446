//! Yahoo Finance price source and instrument lookup.

pub mod client;
pub mod types;

use portfolio_prep::{InstrumentProfile, PriceTable};

use crate::error::FeedError;
use crate::types::{FetchRequest, Interval};
use crate::{InstrumentLookup, PriceSource, collect_closes};
use client::YahooClient;

/// Yahoo-backed feed implementing both feed traits.
///
/// Symbols are fetched one chart request at a time. Blocking (sync) via
/// reqwest::blocking.
#[derive(Default)]
pub struct YahooFeed {
    client: YahooClient,
}

impl YahooFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: YahooClient) -> Self {
        Self { client }
    }
}

impl PriceSource for YahooFeed {
    fn closes(&self, symbols: &[String], request: &FetchRequest) -> Result<PriceTable, FeedError> {
        collect_closes(symbols, |symbol| {
            Ok(self.client.chart(symbol, request)?.closes())
        })
    }
}

impl InstrumentLookup for YahooFeed {
    fn profile(&self, symbol: &str) -> Result<InstrumentProfile, FeedError> {
        let request = FetchRequest::period("5d", Interval::Daily)?;
        Ok(self.client.chart(symbol, &request)?.profile())
    }
}
