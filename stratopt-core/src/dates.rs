//! Date ranges and walk-forward partitioning.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from date range construction or partitioning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateRangeError {
    #[error("start {start} must be before end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("cannot split a range into zero periods")]
    ZeroPeriods,
    #[error("range of {span_ms} ms is too short for {periods} periods")]
    TooShort { span_ms: i64, periods: usize },
}

/// A half-open evaluation window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DateRangeError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), DateRangeError> {
        if self.start >= self.end {
            return Err(DateRangeError::Inverted {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Split into `periods` contiguous, non-overlapping sub-ranges.
    ///
    /// Period length is `(end - start) / periods` in whole milliseconds. Each
    /// period starts where the previous one ends, and the final period runs to
    /// `end`, absorbing the division remainder. The union is exactly `self`.
    pub fn split(&self, periods: usize) -> Result<Vec<DateRange>, DateRangeError> {
        if periods == 0 {
            return Err(DateRangeError::ZeroPeriods);
        }
        self.validate()?;

        let span_ms = self.duration().num_milliseconds();
        let period_ms = span_ms / periods as i64;
        if period_ms <= 0 {
            return Err(DateRangeError::TooShort { span_ms, periods });
        }

        let boundary = |i: usize| self.start + Duration::milliseconds(period_ms * i as i64);
        Ok((0..periods)
            .map(|i| DateRange {
                start: boundary(i),
                end: if i + 1 == periods {
                    self.end
                } else {
                    boundary(i + 1)
                },
            })
            .collect())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
