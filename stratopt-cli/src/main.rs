//! StratOpt CLI — run and validate strategy parameter optimizations.
//!
//! Commands:
//! - `run` — optimize a strategy template against an external backtest command
//! - `validate` — parse and validate a config, report planned work

mod export;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratopt_core::{Binder, StrategyTemplate};
use stratopt_runner::{
    CommandEvaluator, EvaluatedCandidate, OptimizationConfig, OptimizationOutcome,
    OptimizationProgress, OptimizationResult, Optimizer, RunControl, RunStatus, WalkForwardResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stratopt",
    about = "StratOpt: strategy parameter optimizer"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an optimization.
    Run {
        /// Optimization config (.toml or .json).
        #[arg(long)]
        config: PathBuf,

        /// Strategy template (JSON).
        #[arg(long)]
        strategy: PathBuf,

        /// Backtest command. Receives the bound strategy and date range as JSON
        /// on stdin and must print BacktestMetrics JSON on stdout.
        #[arg(long)]
        backtest_cmd: PathBuf,

        /// Extra argument for the backtest command (repeatable).
        #[arg(long = "backtest-arg", allow_hyphen_values = true)]
        backtest_args: Vec<String>,

        /// Per-backtest timeout in seconds.
        #[arg(long)]
        eval_timeout_secs: Option<u64>,

        /// Cancel the run after this many seconds and keep partial results.
        #[arg(long)]
        time_budget_secs: Option<u64>,

        /// Write the full result as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write every evaluated candidate as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Rows in the printed leaderboard.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Validate a config (and optionally a strategy) without running anything.
    Validate {
        /// Optimization config (.toml or .json).
        #[arg(long)]
        config: PathBuf,

        /// Strategy template (JSON), checked for unbound parameters.
        #[arg(long)]
        strategy: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            strategy,
            backtest_cmd,
            backtest_args,
            eval_timeout_secs,
            time_budget_secs,
            output,
            csv,
            top,
        } => {
            let mut evaluator = CommandEvaluator::new(backtest_cmd).args(backtest_args);
            if let Some(secs) = eval_timeout_secs {
                evaluator = evaluator.timeout(Duration::from_secs(secs));
            }
            run_optimization(
                &config,
                &strategy,
                evaluator,
                time_budget_secs.map(Duration::from_secs),
                output.as_deref(),
                csv.as_deref(),
                top,
            )
        }
        Commands::Validate { config, strategy } => run_validate(&config, strategy.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_strategy(path: &Path) -> Result<StrategyTemplate> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read strategy {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse strategy {}", path.display()))
}

fn load_config(path: &Path) -> Result<OptimizationConfig> {
    OptimizationConfig::load(path).with_context(|| format!("invalid config {}", path.display()))
}

fn run_optimization(
    config_path: &Path,
    strategy_path: &Path,
    evaluator: CommandEvaluator,
    time_budget: Option<Duration>,
    output: Option<&Path>,
    csv_path: Option<&Path>,
    top: usize,
) -> Result<()> {
    let config = load_config(config_path)?;
    let template = load_strategy(strategy_path)?;
    let optimizer = Optimizer::new(template, evaluator);

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(budget) = time_budget {
        let flag = Arc::clone(&cancel);
        std::thread::spawn(move || {
            std::thread::sleep(budget);
            info!(budget_secs = budget.as_secs(), "time budget exhausted, cancelling");
            flag.store(true, Ordering::Relaxed);
        });
    }

    let progress = |p: &OptimizationProgress| {
        let step = (p.total / 10).max(1);
        if p.completed % step == 0 || p.completed == p.total {
            info!(
                phase = p.phase,
                period = p.period,
                generation = p.generation,
                completed = p.completed,
                total = p.total,
                failures = p.failures,
                "progress {:.0}%",
                p.fraction() * 100.0
            );
        }
    };
    let control = RunControl::new().with_cancel(&cancel).with_progress(&progress);

    let outcome = optimizer.run(&config, control)?;

    match &outcome {
        OptimizationOutcome::Single(result) => print_result(result, top),
        OptimizationOutcome::WalkForward(wf) => print_walk_forward(wf, top),
    }

    if let Some(path) = output {
        std::fs::write(path, export::export_json(&outcome)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Result written to: {}", path.display());
    }
    if let Some(path) = csv_path {
        std::fs::write(path, export::export_candidates_csv(&outcome)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Candidates written to: {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path, strategy_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("Config OK:      {}", config_path.display());
    println!("Method:         {}", config.method.label());
    println!("Objective:      {}", config.objective.label());
    println!("Parameters:     {}", config.parameters.len());
    for p in &config.parameters {
        match p.cardinality() {
            Some(n) => println!("  {:<14}{n} values", p.name),
            None => println!("  {:<14}too many values", p.name),
        }
    }
    println!("Date range:     {}", config.date_range);
    match config.planned_evaluations() {
        Some(n) => println!("Planned runs:   {n}"),
        None => println!("Planned runs:   overflow (space too large)"),
    }

    if let Some(path) = strategy_path {
        let template = load_strategy(path)?;
        let unbound = Binder::new(template).unbound(config.parameters.names());
        if unbound.is_empty() {
            println!("Strategy OK:    every parameter binds");
        } else {
            println!("WARNING: parameters with no matching field: {}", unbound.join(", "));
        }
    }
    Ok(())
}

fn print_status(status: RunStatus, evaluations: usize, failures: usize) {
    let status = match status {
        RunStatus::Completed => "completed",
        RunStatus::Cancelled => "CANCELLED (partial results)",
    };
    println!("Status:         {status}");
    println!("Evaluations:    {evaluations}");
    println!("Failures:       {failures}");
}

fn print_leaderboard(results: &[EvaluatedCandidate]) {
    println!("{:>4}  {:>12}  {:>10}  {:>8}  {:>7}  parameters", "rank", "fitness", "net", "sharpe", "max_dd");
    for (i, e) in results.iter().enumerate() {
        match e.metrics() {
            Some(m) => println!(
                "{:>4}  {:>12.4}  {:>10.2}  {:>8.3}  {:>6.2}%  {}",
                i + 1,
                e.fitness,
                m.net_profit,
                m.sharpe_ratio,
                m.max_drawdown * 100.0,
                e.candidate
            ),
            None => println!("{:>4}  {:>12}  {:>10}  {:>8}  {:>7}  {}", i + 1, "failed", "-", "-", "-", e.candidate),
        }
    }
}

fn print_result(result: &OptimizationResult, top: usize) {
    println!();
    println!("=== Optimization Result ===");
    print_status(result.status, result.evaluations, result.failures);
    match (&result.best_parameters, &result.best_performance) {
        (Some(best), Some(perf)) => {
            println!("Best:           {best}");
            println!("Fitness:        {:.4}", result.best_fitness());
            println!();
            println!("--- Best Performance ---");
            println!("Net Profit:     {:.2}", perf.net_profit);
            println!("Sharpe:         {:.3}", perf.sharpe_ratio);
            println!("Max Drawdown:   {:.2}%", perf.max_drawdown * 100.0);
            println!("Win Rate:       {:.1}%", perf.win_rate * 100.0);
            println!("Profit Factor:  {:.2}", perf.profit_factor);
        }
        _ => println!("Best:           none (no candidate scored)"),
    }
    if let Some(last) = result.generations.last() {
        println!();
        println!("--- Generations ---");
        for g in &result.generations {
            println!(
                "gen {:>3}  best {:>10.4}  mean {:>10}  failures {}",
                g.generation,
                g.best_fitness,
                g.mean_fitness.map_or_else(|| "-".to_string(), |m| format!("{m:.4}")),
                g.failures
            );
        }
        println!("Final generation: {}", last.generation);
    }
    println!();
    println!("--- Top {} ---", top.min(result.all_results.len()));
    print_leaderboard(result.top(top));
}

fn print_walk_forward(wf: &WalkForwardResult, top: usize) {
    println!();
    println!("=== Walk-Forward Result ===");
    print_status(wf.status, wf.evaluations(), wf.failures());
    println!();
    println!("{:>6}  {:>12}  {:<45}  best", "period", "blended", "range");
    for p in &wf.periods {
        let best = p
            .result
            .best_parameters
            .as_ref()
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        println!("{:>6}  {:>12.4}  {:<45}  {}", p.period_index, p.blended_score, p.range.to_string(), best);
    }

    let winners = wf.winner_counts();
    if !winners.is_empty() {
        println!();
        println!("--- Winners across periods ---");
        for (candidate, count) in winners.iter().take(top) {
            println!("{count:>3} of {}  {candidate}", wf.periods.len());
        }
    }
}
