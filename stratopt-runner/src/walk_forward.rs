//! Walk-forward driver — re-run an inner search per time slice.
//!
//! The date range is split into equal, contiguous periods (the last absorbs
//! the remainder). Each period runs the inner method against its own slice
//! with its own RNG streams, and the periods are then ordered by a blended
//! score of their best candidate's metrics.

use serde::Serialize;
use stratopt_core::{Candidate, DateRange};
use tracing::info;

use crate::config::MethodConfig;
use crate::evaluator::Evaluator;
use crate::fitness::blended_score;
use crate::pipeline::RunContext;
use crate::result::{OptimizationResult, RunStatus};
use crate::{genetic, grid, monte_carlo};

// ─── Result types ────────────────────────────────────────────────────

/// One period's optimization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    /// Chronological position of the period (0 = earliest).
    pub period_index: usize,
    pub range: DateRange,
    /// Blended score of the best candidate; `-∞` when nothing scored.
    pub blended_score: f64,
    pub result: OptimizationResult,
}

/// Per-period results, blended score descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkForwardResult {
    pub status: RunStatus,
    pub periods: Vec<PeriodResult>,
}

impl WalkForwardResult {
    /// Period with the highest blended score.
    pub fn best_period(&self) -> Option<&PeriodResult> {
        self.periods.first().filter(|p| p.blended_score.is_finite())
    }

    pub fn evaluations(&self) -> usize {
        self.periods.iter().map(|p| p.result.evaluations).sum()
    }

    pub fn failures(&self) -> usize {
        self.periods.iter().map(|p| p.result.failures).sum()
    }

    /// How many periods picked each distinct best candidate, most frequent first.
    ///
    /// A candidate that wins many periods is robust across time.
    pub fn winner_counts(&self) -> Vec<(Candidate, usize)> {
        let mut counts: Vec<(Candidate, usize)> = Vec::new();
        let mut by_period: Vec<&PeriodResult> = self.periods.iter().collect();
        by_period.sort_by_key(|p| p.period_index);
        for best in by_period.iter().filter_map(|p| p.result.best_parameters.as_ref()) {
            match counts.iter_mut().find(|(c, _)| c == best) {
                Some((_, n)) => *n += 1,
                None => counts.push((best.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

// ─── Driver ──────────────────────────────────────────────────────────

pub(crate) fn run<E: Evaluator + ?Sized>(
    ctx: &RunContext<'_, E>,
    periods: &[DateRange],
    inner: &MethodConfig,
) -> WalkForwardResult {
    let mut status = RunStatus::Completed;
    let mut results = Vec::with_capacity(periods.len());

    for (i, &range) in periods.iter().enumerate() {
        if ctx.control.is_cancelled() {
            info!(period = i, "walk-forward cancelled at period boundary");
            status = RunStatus::Cancelled;
            break;
        }

        let period_ctx = ctx.for_period(i, range, inner.label());
        let result = match inner {
            MethodConfig::GridSearch => grid::run(&period_ctx),
            MethodConfig::MonteCarlo { iterations } => monte_carlo::run(&period_ctx, *iterations),
            MethodConfig::Genetic(ga) => genetic::run(&period_ctx, ga),
            // Rejected by config validation.
            MethodConfig::WalkForward { .. } => grid::run(&period_ctx),
        };

        let score = result
            .best()
            .and_then(|best| best.metrics())
            .map_or(f64::NEG_INFINITY, blended_score);
        let best = result
            .best_parameters
            .as_ref()
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        info!(
            period = i,
            range = %range,
            evaluations = result.evaluations,
            failures = result.failures,
            best = %best,
            blended_score = score,
            "walk-forward period complete"
        );

        let cancelled = result.is_cancelled();
        results.push(PeriodResult {
            period_index: i,
            range,
            blended_score: score,
            result,
        });
        if cancelled {
            status = RunStatus::Cancelled;
            break;
        }
    }

    consolidate(results, status)
}

/// Order periods by blended score, descending; ties keep chronological order.
pub fn consolidate(mut periods: Vec<PeriodResult>, status: RunStatus) -> WalkForwardResult {
    periods.sort_by(|a, b| b.blended_score.total_cmp(&a.blended_score));
    WalkForwardResult { status, periods }
}
