//! Fitness function — maps backtest metrics to the scalar used for ranking.

use crate::metrics::BacktestMetrics;
use serde::{Deserialize, Serialize};

/// Which metric to optimize.
///
/// Every objective is "higher is better"; `MaxDrawdown` is negated so the
/// smallest drawdown ranks first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    SharpeRatio,
    NetProfit,
    WinRate,
    ProfitFactor,
    MaxDrawdown,
    /// `0.3·sharpe + 0.3·win_rate + 0.2·profit_factor − 0.2·max_drawdown`
    Custom,
}

impl Objective {
    pub fn score(&self, m: &BacktestMetrics) -> f64 {
        match self {
            Self::SharpeRatio => m.sharpe_ratio,
            Self::NetProfit => m.net_profit,
            Self::WinRate => m.win_rate,
            Self::ProfitFactor => m.profit_factor,
            Self::MaxDrawdown => -m.max_drawdown,
            Self::Custom => {
                0.3 * m.sharpe_ratio + 0.3 * m.win_rate + 0.2 * m.profit_factor
                    - 0.2 * m.max_drawdown
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SharpeRatio => "sharpe_ratio",
            Self::NetProfit => "net_profit",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::MaxDrawdown => "max_drawdown",
            Self::Custom => "custom",
        }
    }
}

/// Blended score used to order walk-forward periods by their best candidate.
pub fn blended_score(m: &BacktestMetrics) -> f64 {
    0.3 * m.net_profit
        + 0.2 * m.sharpe_ratio
        + 0.2 * (1.0 - m.max_drawdown)
        + 0.15 * m.win_rate
        + 0.15 * m.profit_factor
}
