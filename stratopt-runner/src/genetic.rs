//! Genetic driver — generational search with elitism.
//!
//! Each generation is evaluated as one batch, then consumed by value to breed
//! the next: the top `floor(population · 0.1)` individuals are copied forward
//! unchanged, and the rest are children of two tournament winners. After the
//! last generation the final population is evaluated once more and ranked.
//! A run cancelled mid-generation ranks the last complete generation together
//! with whatever the cut-short one managed to evaluate.
//!
//! With a deterministic evaluator, elitism makes the best fitness
//! non-decreasing from one generation to the next.

use rand::Rng;
use stratopt_core::{initialize_population, Candidate, ParameterSpace};
use tracing::info;

use crate::config::GeneticConfig;
use crate::evaluator::Evaluator;
use crate::pipeline::{evaluate_batch, RunContext};
use crate::ranking::{rank, sort_by_fitness};
use crate::result::{EvaluatedCandidate, GenerationStats, OptimizationResult, RunStatus};

const TOURNAMENT_SIZE: usize = 3;
const MUTATION_SCALE: f64 = 0.1;

pub(crate) fn run<E: Evaluator + ?Sized>(
    ctx: &RunContext<'_, E>,
    ga: &GeneticConfig,
) -> OptimizationResult {
    let mut init_rng = ctx.rng.rng_for("genetic_init", 0);
    let mut population = initialize_population(ctx.space, ga.population_size, &mut init_rng);
    let mut stats = Vec::with_capacity(ga.generations + 1);
    let mut previous: Vec<EvaluatedCandidate> = Vec::new();

    for generation in 0..=ga.generations {
        if ctx.control.is_cancelled() {
            info!(generation, "genetic search cancelled at generation boundary");
            return finish(previous, RunStatus::Cancelled, stats);
        }

        let batch = evaluate_batch(ctx, population, Some(generation));
        if batch.cancelled {
            info!(generation, evaluated = batch.results.len(), "genetic search cancelled mid-generation");
            return finish(
                merge_partial(previous, batch.results),
                RunStatus::Cancelled,
                stats,
            );
        }

        let gen_stats = GenerationStats::from_population(generation, &batch.results);
        info!(
            period = ctx.period,
            generation = gen_stats.generation,
            best = gen_stats.best_fitness,
            mean = gen_stats.mean_fitness,
            failures = gen_stats.failures,
            "generation evaluated"
        );
        stats.push(gen_stats);

        if generation == ga.generations {
            return finish(batch.results, RunStatus::Completed, stats);
        }

        let mut rng = ctx.rng.rng_for("genetic", generation as u64);
        population = next_generation(&batch.results, ctx.space, ga, &mut rng);
        previous = batch.results;
    }

    // The loop always returns on its last iteration.
    finish(previous, RunStatus::Completed, stats)
}

/// Last complete generation followed by the partial one.
///
/// Partial indexes are shifted past the complete generation, so fitness ties
/// resolve toward the earlier, fully evaluated individual.
fn merge_partial(
    mut complete: Vec<EvaluatedCandidate>,
    partial: Vec<EvaluatedCandidate>,
) -> Vec<EvaluatedCandidate> {
    let offset = complete.len();
    complete.extend(partial.into_iter().map(|mut e| {
        e.index += offset;
        e
    }));
    complete
}

fn finish(
    population: Vec<EvaluatedCandidate>,
    status: RunStatus,
    stats: Vec<GenerationStats>,
) -> OptimizationResult {
    let mut result = rank(population, status);
    result.generations = stats;
    result
}

/// Breed the next population from an evaluated one.
///
/// `evaluated` is in population order; elites are chosen by a stable sort, so
/// fitness ties go to the earlier individual.
pub fn next_generation<R: Rng + ?Sized>(
    evaluated: &[EvaluatedCandidate],
    space: &ParameterSpace,
    ga: &GeneticConfig,
    rng: &mut R,
) -> Vec<Candidate> {
    let size = ga.population_size;
    let mut next = Vec::with_capacity(size);

    let mut ranked = evaluated.to_vec();
    sort_by_fitness(&mut ranked);
    next.extend(
        ranked
            .into_iter()
            .take(ga.elite_count().min(size))
            .map(|e| e.candidate),
    );

    if evaluated.is_empty() {
        return next;
    }
    while next.len() < size {
        let a = tournament(evaluated, rng);
        let b = tournament(evaluated, rng);
        let child = crossover(&a.candidate, &b.candidate, ga.crossover_rate, rng);
        next.push(mutate(&child, space, ga.mutation_rate, rng));
    }
    next
}

/// Fittest of `TOURNAMENT_SIZE` uniform draws, with replacement.
///
/// Panics if `population` is empty.
pub fn tournament<'p, R: Rng + ?Sized>(
    population: &'p [EvaluatedCandidate],
    rng: &mut R,
) -> &'p EvaluatedCandidate {
    let mut best = &population[rng.gen_range(0..population.len())];
    for _ in 1..TOURNAMENT_SIZE {
        let contender = &population[rng.gen_range(0..population.len())];
        if contender.fitness > best.fitness {
            best = contender;
        }
    }
    best
}

/// Uniform crossover with probability `rate`, otherwise a copy of `a`.
pub fn crossover<R: Rng + ?Sized>(a: &Candidate, b: &Candidate, rate: f64, rng: &mut R) -> Candidate {
    if !rng.gen_bool(rate) {
        return a.clone();
    }
    a.iter()
        .map(|(name, va)| {
            let value = match b.get(name) {
                Some(vb) if rng.gen_bool(0.5) => vb,
                _ => va,
            };
            (name, value)
        })
        .collect()
}

/// Per parameter with probability `rate`, scale by `1 + u`, `u ~ U[-0.1, 0.1]`,
/// clamped to the parameter's bounds. Discrete-set parameters never mutate.
pub fn mutate<R: Rng + ?Sized>(
    candidate: &Candidate,
    space: &ParameterSpace,
    rate: f64,
    rng: &mut R,
) -> Candidate {
    candidate
        .iter()
        .map(|(name, value)| {
            let bounds = space.get(name).and_then(|p| p.bounds());
            let value = match bounds {
                Some((min, max)) if rng.gen_bool(rate) => {
                    let u = rng.gen_range(-MUTATION_SCALE..=MUTATION_SCALE);
                    (value * (1.0 + u)).clamp(min, max)
                }
                _ => value,
            };
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BacktestMetrics;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use stratopt_core::OptimizationParameter;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            OptimizationParameter::range("fast", 5.0, 50.0, 1.0),
            OptimizationParameter::values("mode", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap()
    }

    fn evaluated(fitnesses: &[f64]) -> Vec<EvaluatedCandidate> {
        fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                EvaluatedCandidate::scored(
                    i,
                    [("fast", 5.0 + i as f64), ("mode", 1.0)].into_iter().collect(),
                    BacktestMetrics::new(f, f, 0.1, 0.5, 1.0),
                    f,
                )
            })
            .collect()
    }

    #[test]
    fn elites_are_copied_verbatim() {
        let fitness: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let population = evaluated(&fitness);
        let ga = GeneticConfig {
            population_size: 20,
            ..GeneticConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let next = next_generation(&population, &space(), &ga, &mut rng);
        assert_eq!(next.len(), 20);
        // floor(20 · 0.1) = 2 elites: the two fittest, best first.
        assert_eq!(next[0], population[19].candidate);
        assert_eq!(next[1], population[18].candidate);
    }

    #[test]
    fn small_population_has_no_elites() {
        let population = evaluated(&[1.0, 2.0, 3.0]);
        let ga = GeneticConfig {
            population_size: 3,
            crossover_rate: 0.0,
            mutation_rate: 0.0,
            ..GeneticConfig::default()
        };
        assert_eq!(ga.elite_count(), 0);
        let mut rng = StdRng::seed_from_u64(1);
        let next = next_generation(&population, &space(), &ga, &mut rng);
        assert_eq!(next.len(), 3);
        // Without crossover or mutation every child is a tournament winner.
        for child in &next {
            assert!(population.iter().any(|e| &e.candidate == child));
        }
    }

    #[test]
    fn tournament_never_picks_worse_than_all_draws() {
        let population = evaluated(&[0.0, 10.0]);
        let mut rng = StdRng::seed_from_u64(9);
        let mut wins = 0;
        for _ in 0..200 {
            if tournament(&population, &mut rng).fitness == 10.0 {
                wins += 1;
            }
        }
        // Loses only when all three draws hit the weaker one: p = 1/8.
        assert!(wins > 150, "wins = {wins}");
    }

    #[test]
    fn failed_individuals_lose_tournaments() {
        let mut population = evaluated(&[1.0]);
        population.push(EvaluatedCandidate::failed(1, Candidate::empty(), "boom"));
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let winner = tournament(&population, &mut rng);
            // A failure wins only if every draw was the failure.
            assert!(winner.fitness == 1.0 || winner.is_failure());
        }
    }

    #[test]
    fn crossover_mixes_parent_values() {
        let a: Candidate = [("fast", 10.0), ("mode", 1.0)].into_iter().collect();
        let b: Candidate = [("fast", 40.0), ("mode", 3.0)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let child = crossover(&a, &b, 1.0, &mut rng);
            assert!(matches!(child.get("fast"), Some(v) if v == 10.0 || v == 40.0));
            assert!(matches!(child.get("mode"), Some(v) if v == 1.0 || v == 3.0));
        }
    }

    #[test]
    fn zero_crossover_rate_copies_first_parent() {
        let a: Candidate = [("fast", 10.0)].into_iter().collect();
        let b: Candidate = [("fast", 40.0)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(crossover(&a, &b, 0.0, &mut rng), a);
    }

    #[test]
    fn mutation_stays_within_ten_percent_and_bounds() {
        let c: Candidate = [("fast", 49.0), ("mode", 2.0)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let m = mutate(&c, &space(), 1.0, &mut rng);
            let fast = m.get("fast").unwrap();
            assert!((49.0 * 0.9..=50.0).contains(&fast), "fast = {fast}");
            // Discrete parameters are never mutated.
            assert_eq!(m.get("mode"), Some(2.0));
        }
    }

    #[test]
    fn zero_mutation_rate_is_identity() {
        let c: Candidate = [("fast", 20.0), ("mode", 2.0)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(mutate(&c, &space(), 0.0, &mut rng), c);
    }
}
