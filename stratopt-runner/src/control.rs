//! Cooperative cancellation and progress reporting for a run.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress snapshot, emitted after every evaluation.
///
/// `completed` and `total` count the current batch: the whole grid, all
/// Monte Carlo draws, or one genetic generation. Walk-forward runs tag each
/// batch with its period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationProgress {
    pub phase: &'static str,
    pub period: Option<usize>,
    pub generation: Option<usize>,
    pub completed: usize,
    pub total: usize,
    pub failures: usize,
}

impl OptimizationProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Callback invoked from evaluation workers, possibly concurrently.
pub type ProgressFn<'a> = &'a (dyn Fn(&OptimizationProgress) + Sync);

/// Optional cancellation flag plus optional progress callback.
#[derive(Clone, Copy, Default)]
pub struct RunControl<'a> {
    cancel: Option<&'a AtomicBool>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> RunControl<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the next candidate, generation, or period boundary once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::Relaxed))
    }

    pub(crate) fn report(&self, progress: &OptimizationProgress) {
        if let Some(cb) = self.progress {
            cb(progress);
        }
    }
}

impl fmt::Debug for RunControl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunControl")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.map(|_| "<callback>"))
            .finish()
    }
}
