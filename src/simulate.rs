//! Plan-vs-actual capital simulation.
//!
//! The *real* trajectory applies the solver's positions to the returns the
//! market actually delivered:
//!
//! ```text
//! real(t) = W0 + sum_{s <= t} sum_i w(d_s, i) * r(s, i)
//! ```
//!
//! where `d_s` is the decision date whose holding period is realized at `s`.
//! Symbols or dates present on only one side contribute zero.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use log::{debug, warn};

use crate::error::PrepError;
use crate::frame::{Frame, Series};
use crate::frequency::Frequency;

/// Which realized period a decision date's positions earn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Alignment {
    /// Positions decided at `d` earn the period immediately after the one
    /// containing `d`.
    #[default]
    Next,
    /// Positions decided at `d` earn the period labelled `d`.
    Same,
}

impl FromStr for Alignment {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next" => Ok(Alignment::Next),
            "same" => Ok(Alignment::Same),
            other => Err(PrepError::InvalidParameter(format!(
                "alignment must be 'next' or 'same', got '{other}'"
            ))),
        }
    }
}

/// Knobs for [`compare_with`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompareOptions {
    pub alignment: Alignment,
    /// Period calendar of the decision dates.
    pub frequency: Frequency,
    /// Planned values with a smaller magnitude are excluded from the
    /// percentage deviation.
    pub min_planned: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            alignment: Alignment::Next,
            frequency: Frequency::Monthly,
            min_planned: 1e-6,
        }
    }
}

/// One date of the joined trajectory. Either side may be missing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub planned: Option<f64>,
    pub real: Option<f64>,
}

/// Planned and real capital, outer-joined on date.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapitalTrajectory {
    pub points: Vec<TrajectoryPoint>,
}

impl CapitalTrajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn planned(&self) -> Series {
        self.points
            .iter()
            .filter_map(|p| p.planned.map(|v| (p.date, v)))
            .collect()
    }

    pub fn real(&self) -> Series {
        self.points
            .iter()
            .filter_map(|p| p.real.map(|v| (p.date, v)))
            .collect()
    }
}

/// Discrepancy summary between plan and reality.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonReport {
    /// Last available planned capital.
    pub final_planned: Option<f64>,
    /// Last available real capital.
    pub final_real: Option<f64>,
    /// `final_real - final_planned`.
    pub final_difference: Option<f64>,
    /// Mean `|real - planned|` over dates where both exist.
    pub mean_abs_deviation: Option<f64>,
    /// Mean `(real - planned) / planned` in percent; `None` when no date qualifies.
    pub mean_pct_deviation: Option<f64>,
    /// Dates left out of the percentage mean because planned capital was
    /// below the minimum magnitude.
    pub undefined_pct_points: usize,
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn money(v: Option<f64>) -> String {
            v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.2}"))
        }

        writeln!(f, "=== Plan vs Real ===")?;
        writeln!(f, "  Final planned capital: {:>14}", money(self.final_planned))?;
        writeln!(f, "  Final real capital:    {:>14}", money(self.final_real))?;
        writeln!(f, "  Final difference:      {:>14}", money(self.final_difference))?;
        writeln!(f, "  Mean abs deviation:    {:>14}", money(self.mean_abs_deviation))?;
        match self.mean_pct_deviation {
            Some(p) => writeln!(f, "  Mean deviation (%):    {:>13.2}%", p)?,
            None => writeln!(f, "  Mean deviation (%):    {:>14}", "undefined")?,
        }
        if self.undefined_pct_points > 0 {
            writeln!(
                f,
                "  ({} date(s) excluded: planned capital near zero)",
                self.undefined_pct_points
            )?;
        }
        Ok(())
    }
}

/// Per-date portfolio gain from holding `weights` over the realized periods.
///
/// Keys are the dates the gain is booked on: the realized label. A decision
/// whose label is absent from `realized` books nothing, so each decision
/// earns at most one period.
fn period_gains(
    weights: &Frame,
    realized: &Frame,
    frequency: Frequency,
    alignment: Alignment,
) -> BTreeMap<NaiveDate, f64> {
    let mut gains = BTreeMap::new();
    for (row, &decided) in weights.dates().iter().enumerate() {
        let booked = match alignment {
            Alignment::Next => frequency.next_end(frequency.period_end(decided)),
            Alignment::Same => decided,
        };
        if realized.date_index(booked).is_none() {
            continue;
        }
        let gain: f64 = weights
            .symbols()
            .iter()
            .enumerate()
            .map(|(c, symbol)| {
                let w = weights.column_at(c)[row];
                let r = realized.get(booked, symbol).unwrap_or(0.0);
                if w.is_nan() { 0.0 } else { w * r }
            })
            .sum();
        *gains.entry(booked).or_insert(0.0) += gain;
    }
    gains
}

/// Real capital on every date of `weights` or `realized`.
pub fn real_trajectory(
    weights: &Frame,
    realized: &Frame,
    initial_capital: f64,
    frequency: Frequency,
    alignment: Alignment,
) -> Series {
    let gains = period_gains(weights, realized, frequency, alignment);
    let mut dates: Vec<NaiveDate> = weights.dates().to_vec();
    dates.extend_from_slice(realized.dates());
    dates.sort();
    dates.dedup();

    let mut capital = initial_capital;
    dates
        .into_iter()
        .map(|d| {
            capital += gains.get(&d).copied().unwrap_or(0.0);
            (d, capital)
        })
        .collect()
}

/// [`compare_with`] using [`CompareOptions::default`].
pub fn compare(
    weights: &Frame,
    planned: &Series,
    realized: &Frame,
    initial_capital: f64,
) -> (CapitalTrajectory, ComparisonReport) {
    compare_with(weights, planned, realized, initial_capital, &CompareOptions::default())
}

/// Simulate the real trajectory and report its deviation from `planned`.
pub fn compare_with(
    weights: &Frame,
    planned: &Series,
    realized: &Frame,
    initial_capital: f64,
    options: &CompareOptions,
) -> (CapitalTrajectory, ComparisonReport) {
    let real = real_trajectory(
        weights,
        realized,
        initial_capital,
        options.frequency,
        options.alignment,
    );

    let mut joined: BTreeMap<NaiveDate, TrajectoryPoint> = BTreeMap::new();
    for (date, v) in planned.iter() {
        joined.entry(date).or_insert(TrajectoryPoint { date, planned: None, real: None }).planned = Some(v);
    }
    for (date, v) in real.iter() {
        joined.entry(date).or_insert(TrajectoryPoint { date, planned: None, real: None }).real = Some(v);
    }
    let trajectory = CapitalTrajectory {
        points: joined.into_values().collect(),
    };

    let final_planned = planned.last().map(|(_, v)| v);
    let final_real = real.last().map(|(_, v)| v);
    let final_difference = match (final_real, final_planned) {
        (Some(r), Some(p)) => Some(r - p),
        _ => None,
    };

    let mut abs_sum = 0.0;
    let mut abs_n = 0usize;
    let mut pct_sum = 0.0;
    let mut pct_n = 0usize;
    let mut undefined = 0usize;
    for p in &trajectory.points {
        let (Some(plan), Some(actual)) = (p.planned, p.real) else {
            continue;
        };
        abs_sum += (actual - plan).abs();
        abs_n += 1;
        if plan.abs() < options.min_planned {
            undefined += 1;
        } else {
            pct_sum += (actual - plan) / plan;
            pct_n += 1;
        }
    }
    if undefined > 0 {
        warn!(
            "{undefined} date(s) excluded from percentage deviation: |planned| < {}",
            options.min_planned
        );
    }

    let report = ComparisonReport {
        final_planned,
        final_real,
        final_difference,
        mean_abs_deviation: (abs_n > 0).then(|| abs_sum / abs_n as f64),
        mean_pct_deviation: (pct_n > 0).then(|| pct_sum / pct_n as f64 * 100.0),
        undefined_pct_points: undefined,
    };
    debug!(
        "compared {} trajectory points ({} matched)",
        trajectory.len(),
        abs_n
    );
    (trajectory, report)
}
