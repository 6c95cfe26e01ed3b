//! External backtest sidecar.
//!
//! Each evaluation spawns the configured command, writes a JSON request
//! (`{"strategy": ..., "date_range": ...}`) to its stdin and reads one
//! `BacktestMetrics` JSON object from its stdout.

use serde::Serialize;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use stratopt_core::{BoundStrategy, DateRange};
use tracing::debug;

use crate::evaluator::{EvaluationError, Evaluator};
use crate::metrics::BacktestMetrics;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long pipe threads get to finish after a timed-out child is killed.
const REAP_GRACE: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct BacktestRequest<'a> {
    strategy: &'a BoundStrategy,
    date_range: &'a DateRange,
}

/// Evaluator backed by an external process.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the process and fail the evaluation after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn spawn(&self) -> Result<Child, EvaluationError> {
        Ok(Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?)
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, EvaluationError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                // Already exited between the poll and the kill is fine.
                let _ = child.kill();
                let _ = child.wait();
                return Err(EvaluationError::Timeout(limit));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

/// Join `handle` if it finishes before `deadline`.
///
/// A thread still running at the deadline is left detached. That happens when
/// a descendant of the killed child inherited the pipe; the thread exits once
/// that descendant closes it.
fn reap<T>(handle: JoinHandle<T>, deadline: Instant) -> bool {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = handle.join();
    true
}

fn join(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>, EvaluationError> {
    handle
        .join()
        .map_err(|_| EvaluationError::Backtest("pipe reader panicked".into()))?
        .map_err(EvaluationError::from)
}

impl Evaluator for CommandEvaluator {
    fn evaluate(
        &self,
        strategy: &BoundStrategy,
        range: &DateRange,
    ) -> Result<BacktestMetrics, EvaluationError> {
        let request = serde_json::to_vec(&BacktestRequest {
            strategy,
            date_range: range,
        })?;

        let mut child = self.spawn()?;

        // Pipes are serviced on their own threads so a chatty child cannot
        // block on a full buffer while we wait for it.
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The child may exit without reading its input.
                let _ = stdin.write_all(&request);
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.wait(&mut child) {
            Ok(status) => status,
            Err(e) => {
                let deadline = Instant::now() + REAP_GRACE;
                let detached = [
                    reap(writer, deadline),
                    reap(stdout, deadline),
                    reap(stderr, deadline),
                ]
                .into_iter()
                .filter(|reaped| !reaped)
                .count();
                if detached > 0 {
                    debug!(
                        program = %self.program.display(),
                        detached,
                        "pipe threads still held open by a descendant of the killed child"
                    );
                }
                return Err(e);
            }
        };
        let _ = writer.join();
        let stdout = join(stdout)?;
        let stderr = join(stderr)?;

        if !status.success() {
            return Err(EvaluationError::ExitStatus {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        debug!(
            program = %self.program.display(),
            bytes = stdout.len(),
            "backtest sidecar finished"
        );
        Ok(serde_json::from_slice(&stdout)?)
    }
}
