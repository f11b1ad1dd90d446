//! # portfolio-prep
//!
//! Input preparation for multi-period portfolio optimization, and a
//! plan-vs-actual check of the solver's output.
//!
//! ## Features
//!
//! - **Returns**: simple returns from closing prices, compounded per reporting period
//! - **Expected returns**: causal EWMA per asset, relabelled to upcoming decision periods
//! - **Classification**: ordered rule chains and attempt chains, first answer wins
//! - **Limits and costs**: class/asset bounds and per-class transaction costs
//! - **Solver file**: `.dat` sets and parameters, deterministic ordering
//! - **Simulation**: real capital trajectory from realized returns vs. the plan
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use portfolio_prep::{aggregate, estimate, Frame, Frequency, Horizon};
//!
//! let dates: Vec<_> = (1..=10)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
//!     .collect();
//! let spy: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
//! let prices = Frame::new(dates, vec!["SPY".into()], vec![spy]).unwrap();
//!
//! let weekly = aggregate(&prices, Frequency::Weekly);
//! assert_eq!(weekly.n_periods(), 2);
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! let expected = estimate(&weekly, 0.94, &Horizon::FromToday, today).unwrap();
//! assert_eq!(expected.n_periods(), 2);
//! assert_eq!(expected.periods[0], NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
//! ```
//!
//! ## Period Labels
//!
//! | Frequency | Label |
//! |-----------|-------|
//! | **Daily** | the date |
//! | **Weekly** | Sunday ending the week |
//! | **Monthly** | last day of the month |
//! | **Yearly** | December 31 |
//!
//! ## Plan vs. Actual
//!
//! ```
//! use chrono::NaiveDate;
//! use portfolio_prep::{compare, Frame, Series};
//!
//! let jan = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//! let feb = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
//!
//! // 60 invested in SPY at the end of January
//! let positions = Frame::new(vec![jan], vec!["SPY".into()], vec![vec![60.0]]).unwrap();
//! // SPY returned 5% in February
//! let realized = Frame::new(vec![feb], vec!["SPY".into()], vec![vec![0.05]]).unwrap();
//! let planned: Series = vec![(jan, 100.0), (feb, 102.0)].into_iter().collect();
//!
//! let (trajectory, report) = compare(&positions, &planned, &realized, 100.0);
//! assert_eq!(trajectory.len(), 2);
//! assert_eq!(report.final_real, Some(103.0));
//! assert_eq!(report.final_difference, Some(1.0));
//! ```

pub mod classify;
mod costs;
pub mod dat;
mod error;
mod estimate;
mod frame;
mod frequency;
pub mod limits;
mod returns;
mod simulate;

// Re-export public API
pub use classify::{
    AssetClass, ClassifyStage, Classifier, InstrumentProfile, MembershipMatrix, Rule, RuleChain,
    StaticTable, FALLBACK_SYMBOLS, assemble_universe,
};
pub use costs::{CostModel, CostSchedule};
pub use dat::{DatWriter, SolverInput};
pub use error::{PrepError, Result};
pub use estimate::{DecayFactor, ExpectedReturnTable, Horizon, estimate, ewma, relabel};
pub use frame::{Frame, PriceTable, ReturnTable, Series};
pub use frequency::Frequency;
pub use limits::{BoundTable, Bounds};
pub use returns::{AggregatedReturnTable, aggregate, compound, simple_returns};
pub use simulate::{
    Alignment, CapitalTrajectory, CompareOptions, ComparisonReport, TrajectoryPoint, compare,
    compare_with, real_trajectory,
};
