//! Evaluator seam — the boundary to the external backtest engine.
//!
//! An evaluator must be reentrant: the pipeline calls it from several rayon
//! workers at once. Implementations that are not can wrap their state in a
//! `Mutex` themselves.

use stratopt_core::{BoundStrategy, DateRange};
use thiserror::Error;

use crate::metrics::{BacktestMetrics, NonFiniteMetric};

/// A single backtest that did not produce usable metrics.
///
/// Never aborts a run; the candidate is recorded as failed instead.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("backtest failed: {0}")]
    Backtest(String),

    #[error("backtest timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid metric {field}: {value}")]
    InvalidMetrics { field: &'static str, value: f64 },

    #[error("malformed metrics: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("backtest process exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NonFiniteMetric> for EvaluationError {
    fn from(e: NonFiniteMetric) -> Self {
        Self::InvalidMetrics {
            field: e.field,
            value: e.value,
        }
    }
}

/// Runs one backtest of a bound strategy over a date range.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        strategy: &BoundStrategy,
        range: &DateRange,
    ) -> Result<BacktestMetrics, EvaluationError>;
}

impl<F> Evaluator for F
where
    F: Fn(&BoundStrategy, &DateRange) -> Result<BacktestMetrics, EvaluationError> + Send + Sync,
{
    fn evaluate(
        &self,
        strategy: &BoundStrategy,
        range: &DateRange,
    ) -> Result<BacktestMetrics, EvaluationError> {
        self(strategy, range)
    }
}

/// Call the evaluator and reject non-finite metrics.
pub(crate) fn evaluate_checked<E: Evaluator + ?Sized>(
    evaluator: &E,
    strategy: &BoundStrategy,
    range: &DateRange,
) -> Result<BacktestMetrics, EvaluationError> {
    let metrics = evaluator.evaluate(strategy, range)?;
    metrics.validate()?;
    Ok(metrics)
}
