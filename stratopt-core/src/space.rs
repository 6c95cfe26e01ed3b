//! Parameter space model — the tunable dimensions of a strategy.
//!
//! A dimension is either a numeric range (`min..=max` in `step` increments)
//! or an explicit discrete set of values. Both are enumerable, which is what
//! grid expansion and uniform sampling rely on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parameter space validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpaceError {
    #[error("parameter name must not be empty")]
    EmptyName,
    #[error("duplicate parameter name '{0}'")]
    DuplicateName(String),
    #[error("parameter '{name}': min {min} > max {max}")]
    InvertedBounds { name: String, min: f64, max: f64 },
    #[error("parameter '{name}': step must be > 0, got {step}")]
    NonPositiveStep { name: String, step: f64 },
    #[error("parameter '{name}': bounds and values must be finite")]
    NonFinite { name: String },
    #[error("parameter '{name}': discrete value set is empty")]
    EmptyValues { name: String },
    #[error("parameter '{name}': range {min}..={max} step {step} has too many values to enumerate")]
    TooManyValues {
        name: String,
        min: f64,
        max: f64,
        step: f64,
    },
}

/// Largest number of values a range may enumerate: beyond 2^53 the index
/// `k` no longer maps to a distinct `f64`.
const MAX_RANGE_VALUES: f64 = 9_007_199_254_740_992.0;

/// Domain of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterDomain {
    /// Numeric range, inclusive on both ends.
    Range { min: f64, max: f64, step: f64 },
    /// Explicit set of allowed values, in declaration order.
    Values { values: Vec<f64> },
}

/// A single tunable dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParameter {
    pub name: String,
    #[serde(flatten)]
    pub domain: ParameterDomain,
}

impl OptimizationParameter {
    pub fn range(name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            domain: ParameterDomain::Range { min, max, step },
        }
    }

    pub fn values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            domain: ParameterDomain::Values { values },
        }
    }

    /// Check the dimension's invariants.
    pub fn validate(&self) -> Result<(), SpaceError> {
        if self.name.trim().is_empty() {
            return Err(SpaceError::EmptyName);
        }
        match &self.domain {
            ParameterDomain::Range { min, max, step } => {
                if !min.is_finite() || !max.is_finite() || !step.is_finite() {
                    return Err(SpaceError::NonFinite {
                        name: self.name.clone(),
                    });
                }
                if min > max {
                    return Err(SpaceError::InvertedBounds {
                        name: self.name.clone(),
                        min: *min,
                        max: *max,
                    });
                }
                if *step <= 0.0 {
                    return Err(SpaceError::NonPositiveStep {
                        name: self.name.clone(),
                        step: *step,
                    });
                }
                if self.cardinality().is_none() {
                    return Err(SpaceError::TooManyValues {
                        name: self.name.clone(),
                        min: *min,
                        max: *max,
                        step: *step,
                    });
                }
            }
            ParameterDomain::Values { values } => {
                if values.is_empty() {
                    return Err(SpaceError::EmptyValues {
                        name: self.name.clone(),
                    });
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(SpaceError::NonFinite {
                        name: self.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of distinct values this dimension can take.
    ///
    /// `None` when a range cannot be enumerated: too many steps, or bounds
    /// that `validate` would reject.
    pub fn cardinality(&self) -> Option<usize> {
        match &self.domain {
            ParameterDomain::Range { min, max, step } => {
                // Small epsilon so 0.0..=1.0 step 0.1 yields 11 values, not 10.
                let steps = ((max - min) / step + 1e-9).floor();
                if !(0.0..MAX_RANGE_VALUES).contains(&steps) {
                    return None;
                }
                usize::try_from(steps as u64 + 1).ok()
            }
            ParameterDomain::Values { values } => Some(values.len()),
        }
    }

    /// The `k`-th value of this dimension (0-based, `k < cardinality()`).
    pub fn value_at(&self, k: usize) -> f64 {
        match &self.domain {
            ParameterDomain::Range { min, step, .. } => snap(min + step * k as f64, *step),
            ParameterDomain::Values { values } => values[k],
        }
    }

    /// All values in enumeration order.
    pub fn enumerate(&self) -> Vec<f64> {
        (0..self.cardinality().unwrap_or(0))
            .map(|k| self.value_at(k))
            .collect()
    }

    /// Numeric bounds, if this dimension is a range.
    ///
    /// Discrete sets have no bounds; the genetic mutation step skips them.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match &self.domain {
            ParameterDomain::Range { min, max, .. } => Some((*min, *max)),
            ParameterDomain::Values { .. } => None,
        }
    }
}

/// Trim float accumulation noise from `min + step * k` (e.g. 0.30000000000000004).
///
/// Rounds to nine decimal places below `step`'s leading digit, and never
/// coarser than 1e-9, so sub-nanoscale steps keep distinct values.
fn snap(value: f64, step: f64) -> f64 {
    let digits = (9 - step.log10().floor() as i32).clamp(9, 300);
    let scale = 10f64.powi(digits);
    let scaled = value * scale;
    // Past 2^52 the scaled value is already integral; rounding would only add error.
    if !scaled.is_finite() || scaled.abs() >= 4_503_599_627_370_496.0 {
        return value;
    }
    scaled.round() / scale
}

/// Ordered set of parameters with unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSpace {
    parameters: Vec<OptimizationParameter>,
}

impl ParameterSpace {
    /// Build a validated space.
    pub fn new(parameters: Vec<OptimizationParameter>) -> Result<Self, SpaceError> {
        let space = Self { parameters };
        space.validate()?;
        Ok(space)
    }

    /// An empty space (zero dimensions).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate every dimension and name uniqueness.
    ///
    /// Deserialized spaces are not validated until this is called.
    pub fn validate(&self) -> Result<(), SpaceError> {
        let mut seen = std::collections::HashSet::new();
        for param in &self.parameters {
            param.validate()?;
            if !seen.insert(param.name.as_str()) {
                return Err(SpaceError::DuplicateName(param.name.clone()));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptimizationParameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&OptimizationParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Number of grid candidates: the product of every dimension's cardinality.
    ///
    /// Returns `None` on overflow. An empty space has exactly one (empty) candidate.
    pub fn grid_size(&self) -> Option<usize> {
        self.parameters
            .iter()
            .try_fold(1usize, |acc, p| acc.checked_mul(p.cardinality()?))
    }
}

impl<'a> IntoIterator for &'a ParameterSpace {
    type Item = &'a OptimizationParameter;
    type IntoIter = std::slice::Iter<'a, OptimizationParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}
