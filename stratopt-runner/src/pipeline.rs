//! Bind → evaluate → score, for a batch of independent candidates.
//!
//! Each candidate keeps its batch index through parallel dispatch, so output
//! order matches input order whatever order the workers finish in.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use stratopt_core::{Binder, Candidate, DateRange, ParameterSpace, RngHierarchy};
use tracing::{debug, warn};

use crate::control::{OptimizationProgress, RunControl};
use crate::evaluator::{evaluate_checked, Evaluator};
use crate::fitness::Objective;
use crate::result::{EvaluatedCandidate, RunStatus};

/// Shared, read-only state for one driver invocation.
pub(crate) struct RunContext<'a, E: Evaluator + ?Sized> {
    pub binder: &'a Binder,
    pub evaluator: &'a E,
    pub space: &'a ParameterSpace,
    pub objective: Objective,
    pub range: DateRange,
    pub parallel: bool,
    pub rng: RngHierarchy,
    pub control: RunControl<'a>,
    pub phase: &'static str,
    /// Walk-forward period this run belongs to.
    pub period: Option<usize>,
}

impl<'a, E: Evaluator + ?Sized> RunContext<'a, E> {
    /// Same context narrowed to one walk-forward period.
    pub fn for_period(&self, period: usize, range: DateRange, phase: &'static str) -> Self {
        Self {
            binder: self.binder,
            evaluator: self.evaluator,
            space: self.space,
            objective: self.objective,
            range,
            parallel: self.parallel,
            rng: self.rng.child("walk_forward", period as u64),
            control: self.control,
            phase,
            period: Some(period),
        }
    }
}

/// Evaluated candidates in input order, and whether cancellation cut the batch short.
pub(crate) struct Batch {
    pub results: Vec<EvaluatedCandidate>,
    pub cancelled: bool,
}

impl Batch {
    pub fn status(&self) -> RunStatus {
        if self.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        }
    }
}

pub(crate) fn evaluate_batch<E: Evaluator + ?Sized>(
    ctx: &RunContext<'_, E>,
    candidates: Vec<Candidate>,
    generation: Option<usize>,
) -> Batch {
    let total = candidates.len();
    let completed = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);

    let run_one = |index: usize, candidate: Candidate| -> Option<EvaluatedCandidate> {
        if ctx.control.is_cancelled() {
            return None;
        }
        let evaluated = evaluate_one(ctx, index, candidate);
        let failed = if evaluated.is_failure() {
            failures.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            failures.load(Ordering::Relaxed)
        };
        ctx.control.report(&OptimizationProgress {
            phase: ctx.phase,
            period: ctx.period,
            generation,
            completed: completed.fetch_add(1, Ordering::Relaxed) + 1,
            total,
            failures: failed,
        });
        Some(evaluated)
    };

    let slots: Vec<Option<EvaluatedCandidate>> = if ctx.parallel {
        candidates
            .into_par_iter()
            .enumerate()
            .map(|(i, c)| run_one(i, c))
            .collect()
    } else {
        let mut slots = Vec::with_capacity(total);
        for (i, c) in candidates.into_iter().enumerate() {
            let slot = run_one(i, c);
            let stop = slot.is_none();
            slots.push(slot);
            if stop {
                break;
            }
        }
        slots
    };

    let results: Vec<EvaluatedCandidate> = slots.into_iter().flatten().collect();
    let cancelled = results.len() < total;
    if cancelled {
        debug!(
            phase = ctx.phase,
            evaluated = results.len(),
            total,
            "batch cut short by cancellation"
        );
    }
    Batch { results, cancelled }
}

fn evaluate_one<E: Evaluator + ?Sized>(
    ctx: &RunContext<'_, E>,
    index: usize,
    candidate: Candidate,
) -> EvaluatedCandidate {
    let strategy = ctx.binder.bind(&candidate);
    match evaluate_checked(ctx.evaluator, &strategy, &ctx.range) {
        Ok(metrics) => {
            let fitness = ctx.objective.score(&metrics);
            debug!(index, candidate = %candidate, fitness, "evaluated candidate");
            EvaluatedCandidate::scored(index, candidate, metrics, fitness)
        }
        Err(e) => {
            warn!(
                index,
                candidate = %candidate,
                fingerprint = %candidate.fingerprint(),
                error = %e,
                "evaluation failed"
            );
            EvaluatedCandidate::failed(index, candidate, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationError;
    use crate::metrics::BacktestMetrics;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicBool;
    use stratopt_core::{expand_grid, BoundStrategy, ConditionNode, OptimizationParameter, StrategyTemplate};

    fn binder() -> Binder {
        Binder::new(StrategyTemplate {
            name: "t".into(),
            symbol: "SPY".into(),
            timeframe: "1D".into(),
            conditions: ConditionNode::group([("x", ConditionNode::Number(0.0))]),
        })
    }

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![OptimizationParameter::range("x", 0.0, 9.0, 1.0)]).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn eval(s: &BoundStrategy, _: &DateRange) -> Result<BacktestMetrics, EvaluationError> {
        let x = s.conditions.field("x").and_then(ConditionNode::as_f64).unwrap_or(0.0);
        if x == 3.0 {
            return Err(EvaluationError::Backtest("bad combo".into()));
        }
        Ok(BacktestMetrics::new(x * 10.0, x, 0.1, 0.5, 1.0))
    }

    fn ctx<'a>(
        binder: &'a Binder,
        space: &'a ParameterSpace,
        control: RunControl<'a>,
        parallel: bool,
    ) -> RunContext<'a, dyn Evaluator + 'a> {
        RunContext {
            binder,
            evaluator: &eval,
            space,
            objective: Objective::SharpeRatio,
            range: range(),
            parallel,
            rng: RngHierarchy::new(1),
            control,
            phase: "grid_search",
            period: None,
        }
    }

    #[test]
    fn parallel_and_sequential_agree_on_order() {
        let (b, s) = (binder(), space());
        let seq = evaluate_batch(&ctx(&b, &s, RunControl::new(), false), expand_grid(&s), None);
        let par = evaluate_batch(&ctx(&b, &s, RunControl::new(), true), expand_grid(&s), None);
        assert_eq!(seq.results, par.results);
        let order: Vec<usize> = par.results.iter().map(|e| e.index).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn failure_is_isolated() {
        let (b, s) = (binder(), space());
        let batch = evaluate_batch(&ctx(&b, &s, RunControl::new(), true), expand_grid(&s), None);
        assert!(!batch.cancelled);
        assert_eq!(batch.results.len(), 10);
        let failed: Vec<usize> = batch.results.iter().filter(|e| e.is_failure()).map(|e| e.index).collect();
        assert_eq!(failed, vec![3]);
    }

    #[test]
    fn pre_set_cancel_evaluates_nothing() {
        let (b, s) = (binder(), space());
        let flag = AtomicBool::new(true);
        let batch = evaluate_batch(
            &ctx(&b, &s, RunControl::new().with_cancel(&flag), false),
            expand_grid(&s),
            None,
        );
        assert!(batch.cancelled);
        assert!(batch.results.is_empty());
    }

    #[test]
    fn progress_counts_every_evaluation() {
        let (b, s) = (binder(), space());
        let seen = AtomicUsize::new(0);
        let max_failures = AtomicUsize::new(0);
        let cb = |p: &OptimizationProgress| {
            assert_eq!(p.total, 10);
            seen.fetch_add(1, Ordering::Relaxed);
            max_failures.fetch_max(p.failures, Ordering::Relaxed);
        };
        evaluate_batch(&ctx(&b, &s, RunControl::new().with_progress(&cb), true), expand_grid(&s), Some(2));
        assert_eq!(seen.load(Ordering::Relaxed), 10);
        assert_eq!(max_failures.load(Ordering::Relaxed), 1);
    }
}
