//! Optimizer entry point — validates a config and dispatches to a driver.

use serde::Serialize;
use stratopt_core::{Binder, RngHierarchy, StrategyTemplate};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, MethodConfig, OptimizationConfig};
use crate::control::RunControl;
use crate::evaluator::Evaluator;
use crate::pipeline::RunContext;
use crate::result::{OptimizationResult, RunStatus};
use crate::walk_forward::WalkForwardResult;
use crate::{genetic, grid, monte_carlo, walk_forward};

/// A run that could not start.
///
/// Evaluation failures never surface here; they are recorded per candidate.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result of a run: one ranked result, or one per walk-forward period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    Single(OptimizationResult),
    WalkForward(WalkForwardResult),
}

impl OptimizationOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            Self::Single(r) => r.status,
            Self::WalkForward(wf) => wf.status,
        }
    }

    pub fn evaluations(&self) -> usize {
        match self {
            Self::Single(r) => r.evaluations,
            Self::WalkForward(wf) => wf.evaluations(),
        }
    }

    pub fn failures(&self) -> usize {
        match self {
            Self::Single(r) => r.failures,
            Self::WalkForward(wf) => wf.failures(),
        }
    }

    pub fn single(&self) -> Option<&OptimizationResult> {
        match self {
            Self::Single(r) => Some(r),
            Self::WalkForward(_) => None,
        }
    }

    pub fn walk_forward(&self) -> Option<&WalkForwardResult> {
        match self {
            Self::WalkForward(wf) => Some(wf),
            Self::Single(_) => None,
        }
    }
}

/// Searches a strategy template's parameters against one evaluator.
///
/// The template is bound once per candidate and never mutated, so one
/// optimizer can serve any number of runs.
pub struct Optimizer<E> {
    binder: Binder,
    evaluator: E,
}

impl<E: Evaluator> Optimizer<E> {
    pub fn new(template: StrategyTemplate, evaluator: E) -> Self {
        Self {
            binder: Binder::new(template),
            evaluator,
        }
    }

    pub fn template(&self) -> &StrategyTemplate {
        self.binder.template()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Validate `config`, then run it to completion or cancellation.
    pub fn run(
        &self,
        config: &OptimizationConfig,
        control: RunControl<'_>,
    ) -> Result<OptimizationOutcome, OptimizeError> {
        config.validate()?;

        let unbound = self.binder.unbound(config.parameters.names());
        if !unbound.is_empty() {
            warn!(
                strategy = %self.binder.template().name,
                parameters = ?unbound,
                "parameters match no field in the strategy and will have no effect"
            );
        }

        info!(
            strategy = %self.binder.template().name,
            method = config.method.label(),
            objective = config.objective.label(),
            parameters = config.parameters.len(),
            planned = config.planned_evaluations(),
            seed = config.seed,
            parallel = config.parallel,
            "optimization started"
        );

        let ctx = RunContext {
            binder: &self.binder,
            evaluator: &self.evaluator,
            space: &config.parameters,
            objective: config.objective,
            range: config.date_range,
            parallel: config.parallel,
            rng: RngHierarchy::new(config.seed),
            control,
            phase: config.method.label(),
            period: None,
        };

        let outcome = match &config.method {
            MethodConfig::GridSearch => OptimizationOutcome::Single(grid::run(&ctx)),
            MethodConfig::MonteCarlo { iterations } => {
                OptimizationOutcome::Single(monte_carlo::run(&ctx, *iterations))
            }
            MethodConfig::Genetic(ga) => OptimizationOutcome::Single(genetic::run(&ctx, ga)),
            MethodConfig::WalkForward { periods, inner } => {
                let slices = config.date_range.split(*periods).map_err(ConfigError::from)?;
                OptimizationOutcome::WalkForward(walk_forward::run(&ctx, &slices, inner))
            }
        };

        info!(
            status = ?outcome.status(),
            evaluations = outcome.evaluations(),
            failures = outcome.failures(),
            "optimization finished"
        );
        Ok(outcome)
    }
}
