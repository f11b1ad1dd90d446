//! Asset classification and class-membership matrices.
//!
//! Classification is an ordered chain at two levels:
//!
//! - A [`RuleChain`] turns an [`InstrumentProfile`] into a class; the first
//!   matching [`Rule`] wins.
//! - A [`Classifier`] tries each [`ClassifyStage`] in turn (typically a live
//!   lookup, then a static table); when every stage declines, the symbol is
//!   [`AssetClass::Unknown`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::error::PrepError;

/// Asset category used for class limits and costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetClass {
    Stocks,
    Bonds,
    Etf,
    Other,
    Unknown,
}

impl AssetClass {
    pub const ALL: [AssetClass; 5] = [
        AssetClass::Stocks,
        AssetClass::Bonds,
        AssetClass::Etf,
        AssetClass::Other,
        AssetClass::Unknown,
    ];

    /// Label used in solver files and config keys.
    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Stocks => "Stocks",
            AssetClass::Bonds => "Bonds",
            AssetClass::Etf => "ETF",
            AssetClass::Other => "Other",
            AssetClass::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetClass {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetClass::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PrepError::InvalidParameter(format!("unknown asset class '{s}'")))
    }
}

/// What a market-data provider knows about an instrument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentProfile {
    pub symbol: String,
    /// Provider instrument type, e.g. `ETF`, `EQUITY`, `MUTUALFUND`.
    pub kind: Option<String>,
    pub sector: Option<String>,
    pub name: Option<String>,
}

impl InstrumentProfile {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A single classification rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    /// Instrument type equals `kind` (case-insensitive).
    Kind { kind: String, class: AssetClass },
    /// The profile carries a sector.
    HasSector(AssetClass),
    /// Symbol is one of `symbols`.
    SymbolIn { symbols: Vec<String>, class: AssetClass },
    /// Instrument name contains `needle` (case-insensitive).
    NameContains { needle: String, class: AssetClass },
    /// Always matches.
    Always(AssetClass),
}

impl Rule {
    pub fn apply(&self, profile: &InstrumentProfile) -> Option<AssetClass> {
        match self {
            Rule::Kind { kind, class } => profile
                .kind
                .as_deref()
                .filter(|k| k.eq_ignore_ascii_case(kind))
                .map(|_| *class),
            Rule::HasSector(class) => profile
                .sector
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|_| *class),
            Rule::SymbolIn { symbols, class } => symbols
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&profile.symbol))
                .then_some(*class),
            Rule::NameContains { needle, class } => profile
                .name
                .as_deref()
                .filter(|n| n.to_lowercase().contains(&needle.to_lowercase()))
                .map(|_| *class),
            Rule::Always(class) => Some(*class),
        }
    }
}

/// Ordered rules; first match wins.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule after the existing ones.
    pub fn then(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn classify(&self, profile: &InstrumentProfile) -> Option<AssetClass> {
        self.rules.iter().find_map(|r| r.apply(profile))
    }
}

impl Default for RuleChain {
    /// ETF type, then equities, then known bond tickers and names, else `Other`.
    fn default() -> Self {
        Self::new(vec![
            Rule::Kind {
                kind: "ETF".into(),
                class: AssetClass::Etf,
            },
            Rule::HasSector(AssetClass::Stocks),
            Rule::Kind {
                kind: "EQUITY".into(),
                class: AssetClass::Stocks,
            },
            Rule::SymbolIn {
                symbols: vec!["BND".into(), "TLT".into(), "IEF".into()],
                class: AssetClass::Bonds,
            },
            Rule::NameContains {
                needle: "treasury".into(),
                class: AssetClass::Bonds,
            },
            Rule::NameContains {
                needle: "bond".into(),
                class: AssetClass::Bonds,
            },
            Rule::Always(AssetClass::Other),
        ])
    }
}

/// One step of the per-symbol attempt chain. `None` falls through.
pub trait ClassifyStage {
    fn name(&self) -> &str;
    fn classify(&self, symbol: &str) -> Option<AssetClass>;
}

/// Fixed symbol -> class table.
#[derive(Clone, Debug, Default)]
pub struct StaticTable {
    entries: FxHashMap<String, AssetClass>,
}

impl StaticTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: impl Into<String>, class: AssetClass) -> Self {
        self.entries.insert(symbol.into().to_uppercase(), class);
        self
    }

    /// Classes for the built-in fallback universe.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for s in ["SPY", "VOO", "VTI"] {
            table = table.with(s, AssetClass::Etf);
        }
        for s in ["BND", "TLT", "IEF"] {
            table = table.with(s, AssetClass::Bonds);
        }
        for s in [
            "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "JNJ", "WMT", "JPM", "PG", "XOM",
        ] {
            table = table.with(s, AssetClass::Stocks);
        }
        for s in ["GLD", "SLV", "USO", "VNQ"] {
            table = table.with(s, AssetClass::Other);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClassifyStage for StaticTable {
    fn name(&self) -> &str {
        "static"
    }

    fn classify(&self, symbol: &str) -> Option<AssetClass> {
        self.entries.get(&symbol.to_uppercase()).copied()
    }
}

/// Applies stages in order; `Unknown` when none answers.
#[derive(Default)]
pub struct Classifier<'a> {
    stages: Vec<Box<dyn ClassifyStage + 'a>>,
}

impl<'a> Classifier<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn stage(mut self, stage: impl ClassifyStage + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn classify(&self, symbol: &str) -> AssetClass {
        for stage in &self.stages {
            if let Some(class) = stage.classify(symbol) {
                debug!("{symbol}: {class} via {}", stage.name());
                return class;
            }
            debug!("{symbol}: stage {} declined", stage.name());
        }
        warn!("{symbol}: no classification stage answered, marking Unknown");
        AssetClass::Unknown
    }

    /// Classify every symbol; the map is ordered by symbol.
    pub fn classify_all(&self, symbols: &[String]) -> BTreeMap<String, AssetClass> {
        symbols
            .iter()
            .map(|s| (s.clone(), self.classify(s)))
            .collect()
    }
}

/// Default fallback universe used to top up user-provided symbols.
pub const FALLBACK_SYMBOLS: [&str; 20] = [
    "SPY", "VOO", "VTI", "BND", "TLT", "IEF", "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "JNJ",
    "WMT", "JPM", "PG", "XOM", "GLD", "SLV", "USO", "VNQ",
];

/// Up to `n` symbols: `initial` first, then `fallback`, skipping duplicates.
pub fn assemble_universe<S: AsRef<str>>(initial: &[S], fallback: &[S], n: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(n);
    for s in initial.iter().chain(fallback) {
        if out.len() >= n {
            break;
        }
        let s = s.as_ref().trim().to_uppercase();
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    if out.len() < n {
        warn!("universe has {} symbols, {} requested", out.len(), n);
    }
    out
}

/// Binary membership `g[i][c]`: rows are sorted symbols, columns sorted classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipMatrix {
    pub symbols: Vec<String>,
    pub classes: Vec<AssetClass>,
    pub cells: Vec<Vec<u8>>,
}

impl MembershipMatrix {
    /// Build from a symbol -> class map. Only classes that occur become columns.
    pub fn from_classes(classes: &BTreeMap<String, AssetClass>) -> Self {
        let symbols: Vec<String> = classes.keys().cloned().collect();
        let mut present: Vec<AssetClass> = classes.values().copied().collect();
        present.sort_by_key(|c| c.label());
        present.dedup();
        let cells = symbols
            .iter()
            .map(|s| {
                present
                    .iter()
                    .map(|c| u8::from(classes.get(s) == Some(c)))
                    .collect()
            })
            .collect();
        Self {
            symbols,
            classes: present,
            cells,
        }
    }

    pub fn class_labels(&self) -> Vec<&'static str> {
        self.classes.iter().map(|c| c.label()).collect()
    }
}
