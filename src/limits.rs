//! Investment bounds per asset class and per asset.
//!
//! Bounds are fractions of total capital. The solver reads them as lists
//! aligned with the sorted class set `C` (`L`, `U`) or the sorted asset set
//! `I` (`X_min`, `X_max`).

use std::collections::BTreeMap;

use log::warn;

use crate::error::{PrepError, Result};

/// `lower <= weight <= upper`, both in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower > upper {
            return Err(PrepError::InvalidParameter(format!(
                "bounds must satisfy 0 <= lower <= upper <= 1, got [{lower}, {upper}]"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// `[0, 1]`.
    pub fn unrestricted() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Bounds aligned with an ordered label set.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundTable {
    labels: Vec<String>,
    bounds: Vec<Bounds>,
}

impl BoundTable {
    /// Explicit lower/upper lists; both must have one entry per label.
    pub fn from_lists(labels: &[String], lower: &[f64], upper: &[f64]) -> Result<Self> {
        if lower.len() != labels.len() {
            return Err(PrepError::shape("lower bounds", labels.len(), lower.len()));
        }
        if upper.len() != labels.len() {
            return Err(PrepError::shape("upper bounds", labels.len(), upper.len()));
        }
        let bounds = lower
            .iter()
            .zip(upper)
            .map(|(&l, &u)| Bounds::new(l, u))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            labels: labels.to_vec(),
            bounds,
        })
    }

    /// Same bounds for every label.
    pub fn uniform(labels: &[String], bounds: Bounds) -> Self {
        Self {
            labels: labels.to_vec(),
            bounds: vec![bounds; labels.len()],
        }
    }

    /// Per-label overrides, `default` elsewhere.
    pub fn from_overrides(labels: &[String], overrides: &BTreeMap<String, Bounds>, default: Bounds) -> Self {
        let bounds = labels
            .iter()
            .map(|l| overrides.get(l).copied().unwrap_or(default))
            .collect();
        for key in overrides.keys() {
            if !labels.contains(key) {
                warn!("bound override for '{key}' matches no label");
            }
        }
        Self {
            labels: labels.to_vec(),
            bounds,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<Bounds> {
        self.labels.iter().position(|l| l == label).map(|i| self.bounds[i])
    }

    pub fn lower(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.upper).collect()
    }

    /// Whether a fully invested allocation can satisfy every bound:
    /// `sum(lower) <= 1 <= sum(upper)`.
    pub fn is_feasible(&self) -> bool {
        let lo: f64 = self.bounds.iter().map(|b| b.lower).sum();
        let hi: f64 = self.bounds.iter().map(|b| b.upper).sum();
        lo <= 1.0 + 1e-12 && hi >= 1.0 - 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bounds_validation() {
        assert!(Bounds::new(0.0, 1.0).is_ok());
        assert!(Bounds::new(0.3, 0.3).is_ok());
        assert!(Bounds::new(0.5, 0.4).is_err());
        assert!(Bounds::new(-0.1, 0.4).is_err());
        assert!(Bounds::new(0.1, 1.2).is_err());
        assert!(Bounds::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn list_length_mismatch() {
        let err = BoundTable::from_lists(&labels(&["A", "B", "C"]), &[0.0, 0.0], &[1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, PrepError::shape("lower bounds", 3, 2));
        let err = BoundTable::from_lists(&labels(&["A"]), &[0.0], &[]).unwrap_err();
        assert_eq!(err, PrepError::shape("upper bounds", 1, 0));
    }

    #[test]
    fn invalid_pair_in_list() {
        let err = BoundTable::from_lists(&labels(&["A", "B"]), &[0.0, 0.6], &[1.0, 0.5]).unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter(_)));
    }

    #[test]
    fn overrides_fill_default() {
        let mut over = BTreeMap::new();
        over.insert("Bonds".to_string(), Bounds::new(0.1, 0.4).unwrap());
        let t = BoundTable::from_overrides(&labels(&["Bonds", "Stocks"]), &over, Bounds::new(0.0, 0.6).unwrap());
        assert_eq!(t.lower(), vec![0.1, 0.0]);
        assert_eq!(t.upper(), vec![0.4, 0.6]);
        assert!(t.is_feasible());
    }

    #[test]
    fn infeasible_lower_sum() {
        let t = BoundTable::uniform(&labels(&["A", "B", "C"]), Bounds::new(0.4, 1.0).unwrap());
        assert!(!t.is_feasible());
    }
}
