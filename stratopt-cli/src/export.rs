//! Result export — pretty JSON and a flat CSV of ranked candidates.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use stratopt_runner::{EvaluatedCandidate, OptimizationOutcome};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(outcome: &OptimizationOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("failed to serialize optimization result to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per evaluated candidate, in rank order.
///
/// Columns: period, rank, index, fingerprint, status, fitness, one column per
/// parameter, the five core metrics, error. `period` is empty outside
/// walk-forward runs; walk-forward rows follow the consolidated period order.
pub fn export_candidates_csv(outcome: &OptimizationOutcome) -> Result<String> {
    let sections: Vec<(Option<usize>, &[EvaluatedCandidate])> = match outcome {
        OptimizationOutcome::Single(r) => vec![(None, r.all_results.as_slice())],
        OptimizationOutcome::WalkForward(wf) => wf
            .periods
            .iter()
            .map(|p| (Some(p.period_index), p.result.all_results.as_slice()))
            .collect(),
    };

    let names: BTreeSet<&str> = sections
        .iter()
        .flat_map(|(_, results)| results.iter())
        .flat_map(|e| e.candidate.iter().map(|(name, _)| name))
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["period", "rank", "index", "fingerprint", "status", "fitness"];
    header.extend(names.iter().copied());
    header.extend([
        "net_profit",
        "sharpe_ratio",
        "max_drawdown",
        "win_rate",
        "profit_factor",
        "error",
    ]);
    wtr.write_record(&header)?;

    for (period, results) in &sections {
        for (rank, e) in results.iter().enumerate() {
            let mut row = vec![
                period.map(|p| p.to_string()).unwrap_or_default(),
                (rank + 1).to_string(),
                e.index.to_string(),
                e.fingerprint().to_string(),
                if e.is_failure() { "failed" } else { "scored" }.to_string(),
                format_float(e.fitness),
            ];
            row.extend(
                names
                    .iter()
                    .map(|name| e.candidate.get(name).map(format_float).unwrap_or_default()),
            );
            match e.metrics() {
                Some(m) => row.extend(
                    [m.net_profit, m.sharpe_ratio, m.max_drawdown, m.win_rate, m.profit_factor]
                        .into_iter()
                        .map(format_float),
                ),
                None => row.extend(std::iter::repeat(String::new()).take(5)),
            }
            row.push(match &e.outcome {
                stratopt_runner::EvaluationOutcome::Failed { error } => error.clone(),
                stratopt_runner::EvaluationOutcome::Scored { .. } => String::new(),
            });
            wtr.write_record(&row)?;
        }
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn format_float(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        v.to_string()
    }
}
