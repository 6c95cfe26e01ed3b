//! StratOpt Runner — optimization orchestration on top of `stratopt-core`.
//!
//! This crate provides:
//! - The backtest metrics contract and objective scoring
//! - The `Evaluator` seam, plus an external-process implementation
//! - Serializable optimization configs (TOML/JSON) with validation
//! - A parallel, order-preserving evaluation pipeline
//! - Grid search, Monte Carlo, walk-forward, and genetic drivers
//! - Result ranking, cancellation, and progress reporting

pub mod command;
pub mod config;
pub mod control;
pub mod evaluator;
pub mod fitness;
pub mod genetic;
mod grid;
pub mod metrics;
mod monte_carlo;
pub mod optimizer;
mod pipeline;
pub mod ranking;
pub mod result;
pub mod walk_forward;

pub use command::CommandEvaluator;
pub use config::{ConfigError, GeneticConfig, MethodConfig, OptimizationConfig};
pub use control::{OptimizationProgress, ProgressFn, RunControl};
pub use evaluator::{EvaluationError, Evaluator};
pub use fitness::{blended_score, Objective};
pub use metrics::{BacktestMetrics, PerformanceSummary};
pub use optimizer::{OptimizationOutcome, OptimizeError, Optimizer};
pub use ranking::{rank, sort_by_fitness};
pub use result::{
    EvaluatedCandidate, EvaluationOutcome, GenerationStats, OptimizationResult, RunStatus,
};
pub use walk_forward::{PeriodResult, WalkForwardResult};
