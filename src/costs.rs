//! Proportional transaction costs per asset, derived from its class.

use std::collections::BTreeMap;

use crate::classify::AssetClass;

/// Buy and sell costs as a fraction of traded notional, in basis points.
///
/// ```
/// use portfolio_prep::CostModel;
///
/// let model = CostModel { buy_bps: 10, sell_bps: 15 };
/// assert!((model.buy_rate() - 0.0010).abs() < 1e-12);
/// assert!((model.sell_rate() - 0.0015).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    /// Cost of buying, in basis points (1 bps = 0.01%)
    pub buy_bps: u32,
    /// Cost of selling, in basis points
    pub sell_bps: u32,
}

impl CostModel {
    /// No costs.
    pub fn zero() -> Self {
        Self {
            buy_bps: 0,
            sell_bps: 0,
        }
    }

    pub fn symmetric(bps: u32) -> Self {
        Self {
            buy_bps: bps,
            sell_bps: bps,
        }
    }

    pub fn buy_rate(&self) -> f64 {
        self.buy_bps as f64 / 10_000.0
    }

    pub fn sell_rate(&self) -> f64 {
        self.sell_bps as f64 / 10_000.0
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::zero()
    }
}

/// Cost model per asset class with a fallback for unlisted classes.
#[derive(Clone, Debug, PartialEq)]
pub struct CostSchedule {
    pub default: CostModel,
    pub per_class: BTreeMap<AssetClass, CostModel>,
}

impl CostSchedule {
    pub fn uniform(model: CostModel) -> Self {
        Self {
            default: model,
            per_class: BTreeMap::new(),
        }
    }

    pub fn with(mut self, class: AssetClass, model: CostModel) -> Self {
        self.per_class.insert(class, model);
        self
    }

    pub fn model_for(&self, class: AssetClass) -> CostModel {
        self.per_class.get(&class).copied().unwrap_or(self.default)
    }

    /// `(c_buy, c_sell)` rates, one entry per symbol in map order.
    pub fn rates(&self, classes: &BTreeMap<String, AssetClass>) -> (Vec<f64>, Vec<f64>) {
        classes
            .values()
            .map(|&c| {
                let m = self.model_for(c);
                (m.buy_rate(), m.sell_rate())
            })
            .unzip()
    }
}

impl Default for CostSchedule {
    /// Liquid funds cheapest; unclassified instruments most expensive.
    fn default() -> Self {
        Self::uniform(CostModel::symmetric(25))
            .with(AssetClass::Etf, CostModel::symmetric(5))
            .with(AssetClass::Stocks, CostModel::symmetric(10))
            .with(AssetClass::Bonds, CostModel::symmetric(8))
            .with(AssetClass::Other, CostModel::symmetric(20))
    }
}
