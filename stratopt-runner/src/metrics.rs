//! Backtest metrics — the contract returned by the external backtest engine.
//!
//! The optimizer only reads these values. Anything beyond the five core
//! statistics is carried through untouched in `extra`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw performance metrics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    #[serde(alias = "netProfit")]
    pub net_profit: f64,
    #[serde(alias = "sharpeRatio")]
    pub sharpe_ratio: f64,
    #[serde(alias = "maxDrawdown")]
    pub max_drawdown: f64,
    #[serde(alias = "winRate")]
    pub win_rate: f64,
    #[serde(alias = "profitFactor")]
    pub profit_factor: f64,
    /// Additional engine-specific statistics.
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A core metric that is NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonFiniteMetric {
    pub field: &'static str,
    pub value: f64,
}

impl BacktestMetrics {
    pub fn new(
        net_profit: f64,
        sharpe_ratio: f64,
        max_drawdown: f64,
        win_rate: f64,
        profit_factor: f64,
    ) -> Self {
        Self {
            net_profit,
            sharpe_ratio,
            max_drawdown,
            win_rate,
            profit_factor,
            extra: BTreeMap::new(),
        }
    }

    /// All five core metrics must be finite; anything else counts as a failed evaluation.
    pub fn validate(&self) -> Result<(), NonFiniteMetric> {
        let fields = [
            ("net_profit", self.net_profit),
            ("sharpe_ratio", self.sharpe_ratio),
            ("max_drawdown", self.max_drawdown),
            ("win_rate", self.win_rate),
            ("profit_factor", self.profit_factor),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some(&(field, value)) => Err(NonFiniteMetric { field, value }),
            None => Ok(()),
        }
    }
}

/// The headline numbers reported for a best candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub net_profit: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
}

impl From<&BacktestMetrics> for PerformanceSummary {
    fn from(m: &BacktestMetrics) -> Self {
        Self {
            net_profit: m.net_profit,
            sharpe_ratio: m.sharpe_ratio,
            max_drawdown: m.max_drawdown,
            win_rate: m.win_rate,
            profit_factor: m.profit_factor,
        }
    }
}
