//! Monte Carlo driver — uniform random sampling of the space.

use stratopt_core::{sample_random, Candidate};
use tracing::info;

use crate::evaluator::Evaluator;
use crate::pipeline::{evaluate_batch, RunContext};
use crate::ranking::rank;
use crate::result::OptimizationResult;

/// Draw `iterations` candidates from one seeded stream, evaluate, rank.
///
/// Draws happen up front on a single thread, so the candidate sequence
/// depends only on the seed, never on evaluation scheduling.
pub(crate) fn run<E: Evaluator + ?Sized>(
    ctx: &RunContext<'_, E>,
    iterations: usize,
) -> OptimizationResult {
    let mut rng = ctx.rng.rng_for("monte_carlo", 0);
    let candidates: Vec<Candidate> = (0..iterations)
        .map(|_| sample_random(ctx.space, &mut rng))
        .collect();
    info!(period = ctx.period, iterations, range = %ctx.range, "monte carlo");

    let batch = evaluate_batch(ctx, candidates, None);
    let status = batch.status();
    rank(batch.results, status)
}
