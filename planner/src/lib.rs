//! portfolio-prep-planner: command-line front end for portfolio-prep.
//!
//! `generate` downloads prices, estimates per-period expected returns,
//! classifies the universe and writes the solver's `.dat` input file.
//! `compare` reads the solver's results back, fetches what the market
//! actually returned and reports how far reality drifted from the plan.

pub mod compare;
pub mod config;
pub mod error;
pub mod generate;
pub mod params;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod results;
