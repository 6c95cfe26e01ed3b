//! Grid search driver — exhaustive Cartesian sweep.

use stratopt_core::expand_grid;
use tracing::info;

use crate::evaluator::Evaluator;
use crate::pipeline::{evaluate_batch, RunContext};
use crate::ranking::rank;
use crate::result::OptimizationResult;

/// Evaluate every grid candidate and rank them.
///
/// Work is the product of every dimension's cardinality with no cap; callers
/// should check `ParameterSpace::grid_size()` first.
pub(crate) fn run<E: Evaluator + ?Sized>(ctx: &RunContext<'_, E>) -> OptimizationResult {
    let candidates = expand_grid(ctx.space);
    info!(
        period = ctx.period,
        candidates = candidates.len(),
        range = %ctx.range,
        "grid search"
    );
    let batch = evaluate_batch(ctx, candidates, None);
    let status = batch.status();
    rank(batch.results, status)
}
