//! The `generate` command: market data in, solver `.dat` file out.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use log::{info, warn};

use portfolio_prep::{
    AssetClass, Classifier, ExpectedReturnTable, MembershipMatrix, RuleChain, SolverInput,
    StaticTable,
};
use portfolio_prep_feed::{InstrumentLookup, LiveStage, PriceSource};

use crate::config::Config;
use crate::error::Result;
use crate::pipeline;

/// What a `generate` run produced.
#[derive(Debug, Clone)]
pub struct Summary {
    pub output: PathBuf,
    pub expected: ExpectedReturnTable,
    pub classes: BTreeMap<String, AssetClass>,
    /// Universe symbols left out for lack of data.
    pub dropped: Vec<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wrote {}", self.output.display())?;
        writeln!(
            f,
            "  {} assets x {} {} periods",
            self.expected.n_symbols(),
            self.expected.n_periods(),
            self.expected.frequency
        )?;
        if let (Some(first), Some(last)) = (self.expected.periods.first(), self.expected.periods.last()) {
            writeln!(f, "  Periods: {first} .. {last}")?;
        }
        for (symbol, class) in &self.classes {
            writeln!(f, "  {symbol:<8} {class}")?;
        }
        if !self.dropped.is_empty() {
            writeln!(f, "  Dropped (no data): {}", self.dropped.join(", "))?;
        }
        Ok(())
    }
}

/// Classify `symbols`: live lookup first, then the built-in table, else
/// `Unknown`.
pub fn classify_symbols<L: InstrumentLookup + ?Sized>(
    lookup: &L,
    symbols: &[String],
) -> BTreeMap<String, AssetClass> {
    Classifier::new()
        .stage(LiveStage::new(lookup, RuleChain::default()))
        .stage(StaticTable::builtin())
        .classify_all(symbols)
}

/// Run the whole preparation and write the solver file.
pub fn run<F>(feed: &F, config: &Config, today: NaiveDate) -> Result<Summary>
where
    F: PriceSource + InstrumentLookup + ?Sized,
{
    let universe = config.data.universe();
    info!("universe: {}", universe.join(", "));

    let expected = pipeline::expected_returns(feed, &universe, &config.data, today)?;
    let dropped: Vec<String> = universe
        .iter()
        .filter(|s| !expected.symbols.contains(s))
        .cloned()
        .collect();

    let classes = classify_symbols(feed, &expected.symbols);
    let membership = MembershipMatrix::from_classes(&classes);
    let labels: Vec<String> = membership.class_labels().iter().map(|l| l.to_string()).collect();

    let class_bounds = config.limits.class_table(&labels)?;
    let asset_bounds = config.limits.asset_table(&expected.symbols)?;
    if !class_bounds.is_feasible() {
        warn!("class bounds cannot hold a fully invested portfolio");
    }
    if !asset_bounds.is_feasible() {
        warn!("asset bounds cannot hold a fully invested portfolio");
    }
    let costs = config.costs.schedule()?;

    let text = SolverInput {
        expected: &expected,
        classes: &classes,
        initial_capital: config.solver.initial_capital,
        class_bounds: &class_bounds,
        asset_bounds: &asset_bounds,
        costs: &costs,
    }
    .render()?;

    let output = config.solver.output.clone();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, text)?;
    info!("wrote {}", output.display());

    Ok(Summary {
        output,
        expected,
        classes,
        dropped,
    })
}
