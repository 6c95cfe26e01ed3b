//! Evaluated candidates and optimization results.

use serde::Serialize;
use stratopt_core::{Candidate, CandidateHash};

use crate::metrics::{BacktestMetrics, PerformanceSummary};

/// How one candidate's backtest ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Scored { metrics: BacktestMetrics },
    Failed { error: String },
}

/// A candidate with its metrics and fitness. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedCandidate {
    /// Position in the batch that produced it; the ranking tie-break.
    pub index: usize,
    pub candidate: Candidate,
    pub outcome: EvaluationOutcome,
    /// `-∞` for failed evaluations so they sort last.
    pub fitness: f64,
}

impl EvaluatedCandidate {
    pub fn scored(index: usize, candidate: Candidate, metrics: BacktestMetrics, fitness: f64) -> Self {
        Self {
            index,
            candidate,
            outcome: EvaluationOutcome::Scored { metrics },
            fitness,
        }
    }

    pub fn failed(index: usize, candidate: Candidate, error: impl Into<String>) -> Self {
        Self {
            index,
            candidate,
            outcome: EvaluationOutcome::Failed {
                error: error.into(),
            },
            fitness: f64::NEG_INFINITY,
        }
    }

    pub fn metrics(&self) -> Option<&BacktestMetrics> {
        match &self.outcome {
            EvaluationOutcome::Scored { metrics } => Some(metrics),
            EvaluationOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::Failed { .. })
    }

    pub fn fingerprint(&self) -> CandidateHash {
        self.candidate.fingerprint()
    }
}

/// Whether the run finished or stopped early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Completed,
    /// Stopped by the cancellation flag; results cover only what was evaluated.
    Cancelled,
}

/// Fitness summary of one evaluated genetic generation.
///
/// Mean and worst consider finite fitness only; both are `None` when every
/// individual failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: Option<f64>,
    pub worst_fitness: Option<f64>,
    pub failures: usize,
}

impl GenerationStats {
    pub fn from_population(generation: usize, population: &[EvaluatedCandidate]) -> Self {
        let finite: Vec<f64> = population
            .iter()
            .map(|e| e.fitness)
            .filter(|f| f.is_finite())
            .collect();
        let best_fitness = population
            .iter()
            .map(|e| e.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_fitness = if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        };
        let worst_fitness = finite.iter().copied().reduce(f64::min);
        Self {
            generation,
            best_fitness,
            mean_fitness,
            worst_fitness,
            failures: population.len() - finite.len(),
        }
    }
}

/// Ranked output of a grid, Monte Carlo, or genetic run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub status: RunStatus,
    /// `None` when nothing was scored successfully.
    pub best_parameters: Option<Candidate>,
    pub best_performance: Option<PerformanceSummary>,
    /// Every evaluated candidate, fitness descending.
    pub all_results: Vec<EvaluatedCandidate>,
    pub evaluations: usize,
    pub failures: usize,
    /// Per-generation statistics (genetic runs only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generations: Vec<GenerationStats>,
}

impl OptimizationResult {
    pub fn best(&self) -> Option<&EvaluatedCandidate> {
        self.all_results.first().filter(|e| !e.is_failure())
    }

    pub fn best_fitness(&self) -> f64 {
        self.best().map_or(f64::NEG_INFINITY, |e| e.fitness)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    pub fn top(&self, n: usize) -> &[EvaluatedCandidate] {
        &self.all_results[..n.min(self.all_results.len())]
    }
}
