//! Reporting-period calendar: period boundaries and label generation.
//!
//! Every period is labelled by its **end** date:
//!
//! | Frequency | Period end |
//! |-----------|------------|
//! | Daily     | the date itself |
//! | Weekly    | the Sunday closing the Monday..Sunday week |
//! | Monthly   | the last calendar day of the month |
//! | Yearly    | December 31 |

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::PrepError;

/// Reporting frequency used for compounding and decision-period labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// End of the period containing `date`.
    pub fn period_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                add_days(date, to_sunday as u64)
            }
            Frequency::Monthly => month_end(date.year(), date.month()),
            Frequency::Yearly => NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
        }
    }

    /// Period end immediately after the period ending at `end`.
    ///
    /// `end` is expected to be a period end already.
    pub fn next_end(self, end: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => add_days(end, 1),
            Frequency::Weekly => add_days(end, 7),
            Frequency::Monthly => self.period_end(add_days(month_end(end.year(), end.month()), 1)),
            Frequency::Yearly => {
                NaiveDate::from_ymd_opt(end.year() + 1, 12, 31).unwrap_or(NaiveDate::MAX)
            }
        }
    }

    /// `n` consecutive period ends, the first being the end of the period
    /// containing `anchor`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use portfolio_prep::Frequency;
    ///
    /// let wed = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    /// let labels = Frequency::Weekly.labels_from(wed, 2);
    /// assert_eq!(labels[0], NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
    /// assert_eq!(labels[1], NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    /// ```
    pub fn labels_from(self, anchor: NaiveDate, n: usize) -> Vec<NaiveDate> {
        let mut labels = Vec::with_capacity(n);
        let mut current = self.period_end(anchor);
        for _ in 0..n {
            labels.push(current);
            current = self.next_end(current);
        }
        labels
    }

    /// Infer the frequency from the spacing (in days) between two
    /// consecutive decision dates.
    pub fn from_spacing(days: i64) -> Self {
        if days <= 1 {
            Frequency::Daily
        } else if days <= 7 {
            Frequency::Weekly
        } else if days <= 31 {
            Frequency::Monthly
        } else {
            Frequency::Yearly
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

impl FromStr for Frequency {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "1d" | "day" | "daily" => Ok(Frequency::Daily),
            "w" | "1wk" | "w-sun" | "week" | "weekly" => Ok(Frequency::Weekly),
            "m" | "me" | "1mo" | "month" | "monthly" => Ok(Frequency::Monthly),
            "y" | "ye" | "a" | "1y" | "year" | "yearly" | "annual" => Ok(Frequency::Yearly),
            other => Err(PrepError::InvalidParameter(format!(
                "unknown frequency '{other}'"
            ))),
        }
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
