//! Result ranker.

use tracing::debug;

use crate::metrics::PerformanceSummary;
use crate::result::{EvaluatedCandidate, OptimizationResult, RunStatus};

/// Stable sort by fitness, descending.
///
/// Equal fitness keeps the incoming order, so re-sorting a sorted slice is a
/// no-op. `total_cmp` places `-∞` (failures) after every finite score.
pub fn sort_by_fitness(results: &mut [EvaluatedCandidate]) {
    results.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

/// Sort evaluated candidates and package the best one with the full list.
pub fn rank(mut results: Vec<EvaluatedCandidate>, status: RunStatus) -> OptimizationResult {
    sort_by_fitness(&mut results);

    let failures = results.iter().filter(|e| e.is_failure()).count();
    let best = results.first().filter(|e| !e.is_failure());
    let best_parameters = best.map(|e| e.candidate.clone());
    let best_performance = best.and_then(|e| e.metrics()).map(PerformanceSummary::from);

    debug!(
        evaluations = results.len(),
        failures,
        best_fitness = best.map(|e| e.fitness),
        "ranked results"
    );

    OptimizationResult {
        status,
        best_parameters,
        best_performance,
        evaluations: results.len(),
        failures,
        all_results: results,
        generations: Vec::new(),
    }
}
