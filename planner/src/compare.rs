//! The `compare` command: solver plan versus what the market delivered.

use chrono::NaiveDate;
use log::{info, warn};

use portfolio_prep::{CapitalTrajectory, ComparisonReport, Frequency, compare_with};
use portfolio_prep_feed::PriceSource;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::params::read_initial_capital;
use crate::pipeline;
use crate::results::SolverResults;

/// Output of a `compare` run.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub frequency: Frequency,
    pub initial_capital: f64,
    pub trajectory: CapitalTrajectory,
    pub report: ComparisonReport,
}

/// Load the solver output named in `config`, fetch realized returns and
/// simulate the real trajectory.
pub fn run<S: PriceSource + ?Sized>(source: &S, config: &Config, today: NaiveDate) -> Result<Comparison> {
    let results = SolverResults::load(&config.solver.results)?;
    let initial_capital = read_initial_capital(&config.solver.params, &config.solver.capital_label)?;
    info!(
        "plan: {} symbols over {} decision dates, W0 = {initial_capital:.2}",
        results.x.n_symbols(),
        results.decision_dates().len()
    );
    if results.x.is_empty() {
        return Err(Error::malformed(&config.solver.results, "no 'x' rows"));
    }

    let frequency = match pipeline::infer_frequency(results.decision_dates()) {
        Some(f) => f,
        None => {
            let f = config.data.frequency()?;
            warn!("single decision date, assuming {f} periods");
            f
        }
    };
    info!("decision frequency: {frequency}");

    let realized = pipeline::realized_returns(
        source,
        results.x.symbols(),
        results.decision_dates(),
        frequency,
        today,
    )?;
    let (trajectory, report) = compare_with(
        &results.x,
        &results.w,
        &realized,
        initial_capital,
        &config.compare.options(frequency),
    );

    if let Some(path) = &config.compare.plot {
        #[cfg(feature = "plot")]
        {
            crate::plot::write_html(&trajectory, path, "Planned vs real capital")?;
            info!("wrote {}", path.display());
        }
        #[cfg(not(feature = "plot"))]
        warn!(
            "plot output {} requested but the planner was built without the `plot` feature",
            path.display()
        );
    }

    Ok(Comparison {
        frequency,
        initial_capital,
        trajectory,
        report,
    })
}
