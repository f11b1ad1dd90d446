//! TOML configuration loading and validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Months, NaiveDate};
use serde::Deserialize;

use portfolio_prep::{
    Alignment, AssetClass, BoundTable, Bounds, CompareOptions, CostModel, CostSchedule,
    DecayFactor, FALLBACK_SYMBOLS, Frequency, Horizon, assemble_universe,
};
use portfolio_prep_feed::{FetchRequest, Interval, Span};

use crate::error::{Error, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub costs: CostsConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Symbols placed first in the universe.
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_universe_size")]
    pub universe_size: usize,
    /// Top-up list; the built-in list when absent.
    #[serde(default)]
    pub fallback_symbols: Option<Vec<String>>,
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_price_interval")]
    pub price_interval: String,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default)]
    pub window: Option<WindowConfig>,
    #[serde(default)]
    pub window_months: Option<RelativeWindow>,
}

fn default_universe_size() -> usize {
    10
}
fn default_period() -> String {
    "1y".into()
}
fn default_price_interval() -> String {
    "1d".into()
}
fn default_frequency() -> String {
    "M".into()
}
fn default_lambda() -> f64 {
    0.94
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            universe_size: default_universe_size(),
            fallback_symbols: None,
            period: default_period(),
            price_interval: default_price_interval(),
            frequency: default_frequency(),
            lambda: default_lambda(),
            window: None,
            window_months: None,
        }
    }
}

/// Explicit history window. An open `end` means today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowConfig {
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// History window given in whole months before today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RelativeWindow {
    pub start_offset: u32,
    #[serde(default)]
    pub end_offset: u32,
}

impl DataConfig {
    pub fn frequency(&self) -> Result<Frequency> {
        Ok(self.frequency.parse()?)
    }

    pub fn interval(&self) -> Result<Interval> {
        self.price_interval
            .parse()
            .map_err(|e| Error::Config(format!("price_interval: {e}")))
    }

    /// The symbols to fetch, user symbols first.
    pub fn universe(&self) -> Vec<String> {
        match &self.fallback_symbols {
            Some(fallback) => assemble_universe(&self.symbols, fallback, self.universe_size),
            None => {
                let fallback: Vec<String> = FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect();
                assemble_universe(&self.symbols, &fallback, self.universe_size)
            }
        }
    }

    /// The history window, if one is configured, resolved against `today`.
    pub fn resolved_window(&self, today: NaiveDate) -> Option<WindowConfig> {
        if let Some(window) = self.window {
            return Some(window);
        }
        let rel = self.window_months?;
        let start = today.checked_sub_months(Months::new(rel.start_offset))?;
        let end = match rel.end_offset {
            0 => None,
            n => today.checked_sub_months(Months::new(n)),
        };
        Some(WindowConfig { start, end })
    }

    pub fn fetch_request(&self, today: NaiveDate) -> Result<FetchRequest> {
        let interval = self.interval()?;
        let request = match self.resolved_window(today) {
            Some(w) => FetchRequest::window(w.start, w.end.unwrap_or(today), interval),
            None => FetchRequest::period(&self.period, interval),
        };
        request.map_err(|e| Error::Config(e.to_string()))
    }

    /// Where decision labels start: the window end in window mode, else today.
    pub fn horizon(&self, today: NaiveDate) -> Horizon {
        match self.resolved_window(today) {
            Some(w) => Horizon::Window {
                start: w.start,
                end: w.end,
            },
            None => Horizon::FromToday,
        }
    }
}

/// `[lower, upper]` weight bounds per class and per asset.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_bounds")]
    pub class_default: [f64; 2],
    /// Overrides keyed by class label (`ETF`, `Stocks`, ...).
    #[serde(default)]
    pub classes: BTreeMap<String, [f64; 2]>,
    #[serde(default = "default_bounds")]
    pub asset_default: [f64; 2],
    /// Overrides keyed by symbol.
    #[serde(default)]
    pub assets: BTreeMap<String, [f64; 2]>,
    /// Explicit lists aligned with the sorted class set.
    #[serde(default)]
    pub class_lower: Option<Vec<f64>>,
    #[serde(default)]
    pub class_upper: Option<Vec<f64>>,
    /// Explicit lists aligned with the sorted symbol set.
    #[serde(default)]
    pub asset_lower: Option<Vec<f64>>,
    #[serde(default)]
    pub asset_upper: Option<Vec<f64>>,
}

fn default_bounds() -> [f64; 2] {
    [0.0, 1.0]
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            class_default: default_bounds(),
            classes: BTreeMap::new(),
            asset_default: default_bounds(),
            assets: BTreeMap::new(),
            class_lower: None,
            class_upper: None,
            asset_lower: None,
            asset_upper: None,
        }
    }
}

fn pair(bounds: [f64; 2]) -> Result<Bounds> {
    Ok(Bounds::new(bounds[0], bounds[1])?)
}

fn bound_table(
    labels: &[String],
    lower: Option<&Vec<f64>>,
    upper: Option<&Vec<f64>>,
    overrides: BTreeMap<String, Bounds>,
    default: Bounds,
) -> Result<BoundTable> {
    if lower.is_none() && upper.is_none() {
        return Ok(BoundTable::from_overrides(labels, &overrides, default));
    }
    let lower = lower.cloned().unwrap_or_else(|| vec![default.lower(); labels.len()]);
    let upper = upper.cloned().unwrap_or_else(|| vec![default.upper(); labels.len()]);
    Ok(BoundTable::from_lists(labels, &lower, &upper)?)
}

impl LimitsConfig {
    /// Bounds for `labels`, the class columns of the membership matrix.
    pub fn class_table(&self, labels: &[String]) -> Result<BoundTable> {
        let mut overrides = BTreeMap::new();
        for (key, bounds) in &self.classes {
            let class: AssetClass = key.parse()?;
            overrides.insert(class.label().to_string(), pair(*bounds)?);
        }
        bound_table(
            labels,
            self.class_lower.as_ref(),
            self.class_upper.as_ref(),
            overrides,
            pair(self.class_default)?,
        )
    }

    /// Bounds for `symbols`, in order.
    pub fn asset_table(&self, symbols: &[String]) -> Result<BoundTable> {
        let mut overrides = BTreeMap::new();
        for (key, bounds) in &self.assets {
            overrides.insert(key.trim().to_uppercase(), pair(*bounds)?);
        }
        bound_table(
            symbols,
            self.asset_lower.as_ref(),
            self.asset_upper.as_ref(),
            overrides,
            pair(self.asset_default)?,
        )
    }
}

/// Proportional trading costs in basis points.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostsConfig {
    /// Replaces the built-in fallback model.
    #[serde(default)]
    pub default: Option<CostModel>,
    /// Per-class models keyed by class label.
    #[serde(default)]
    pub classes: BTreeMap<String, CostModel>,
}

impl CostsConfig {
    /// Built-in schedule with the configured models layered on top.
    pub fn schedule(&self) -> Result<CostSchedule> {
        let mut schedule = CostSchedule::default();
        if let Some(model) = self.default {
            schedule.default = model;
        }
        for (key, model) in &self.classes {
            schedule = schedule.with(key.parse()?, *model);
        }
        Ok(schedule)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Generated `.dat` file.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Solver results CSV read by `compare`.
    #[serde(default = "default_results")]
    pub results: PathBuf,
    /// Solver parameter dump read by `compare`.
    #[serde(default = "default_params")]
    pub params: PathBuf,
    /// Label prefix of the initial-capital line in `params`.
    #[serde(default = "default_capital_label")]
    pub capital_label: String,
}

fn default_initial_capital() -> f64 {
    100.0
}
fn default_output() -> PathBuf {
    "portfolio.dat".into()
}
fn default_results() -> PathBuf {
    "results.csv".into()
}
fn default_params() -> PathBuf {
    "params.txt".into()
}
fn default_capital_label() -> String {
    "Capital inicial (W0)".into()
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            output: default_output(),
            results: default_results(),
            params: default_params(),
            capital_label: default_capital_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareConfig {
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default = "default_min_planned")]
    pub min_planned: f64,
    /// HTML chart output; needs the `plot` feature.
    #[serde(default)]
    pub plot: Option<PathBuf>,
}

fn default_min_planned() -> f64 {
    1e-6
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            min_planned: default_min_planned(),
            plot: None,
        }
    }
}

impl CompareConfig {
    /// Simulator options for decisions spaced at `frequency`.
    pub fn options(&self, frequency: Frequency) -> CompareOptions {
        CompareOptions {
            alignment: self.alignment,
            frequency,
            min_planned: self.min_planned,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        let data = &self.data;
        if data.universe_size == 0 {
            return Err(Error::Config("universe_size must be > 0".into()));
        }
        DecayFactor::new(data.lambda)?;
        data.frequency()?;
        data.interval()?;
        if data.window.is_some() && data.window_months.is_some() {
            return Err(Error::Config(
                "set either window or window_months, not both".into(),
            ));
        }
        if let Some(WindowConfig {
            start,
            end: Some(end),
        }) = data.window
        {
            if start >= end {
                return Err(Error::Config(format!(
                    "window start {start} must precede end {end}"
                )));
            }
        }
        if let Some(rel) = data.window_months {
            if rel.start_offset <= rel.end_offset {
                return Err(Error::Config(
                    "window_months start_offset must exceed end_offset".into(),
                ));
            }
        }
        if data.window.is_none() && data.window_months.is_none() {
            Span::period(&data.period).map_err(|e| Error::Config(e.to_string()))?;
        }

        let limits = &self.limits;
        pair(limits.class_default)?;
        pair(limits.asset_default)?;
        for bounds in limits.classes.values().chain(limits.assets.values()) {
            pair(*bounds)?;
        }
        for key in limits.classes.keys().chain(self.costs.classes.keys()) {
            key.parse::<AssetClass>()?;
        }

        if !self.solver.initial_capital.is_finite() || self.solver.initial_capital <= 0.0 {
            return Err(Error::Config("initial_capital must be > 0".into()));
        }
        if self.solver.capital_label.trim().is_empty() {
            return Err(Error::Config("capital_label must not be empty".into()));
        }
        if self.compare.min_planned.is_nan() || self.compare.min_planned < 0.0 {
            return Err(Error::Config("min_planned must be >= 0".into()));
        }
        Ok(())
    }
}
