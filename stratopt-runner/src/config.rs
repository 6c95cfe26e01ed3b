//! Serializable optimization configuration.
//!
//! A config is loaded from TOML or JSON and validated before any evaluation
//! begins. Every invalid setting surfaces as a [`ConfigError`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stratopt_core::{DateRange, DateRangeError, ParameterSpace, SpaceError};
use thiserror::Error;

use crate::fitness::Objective;

/// A configuration that cannot be run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid parameter space: {0}")]
    Space(#[from] SpaceError),

    #[error("invalid date range: {0}")]
    DateRange(#[from] DateRangeError),

    #[error("{method} requires at least one parameter")]
    EmptySpace { method: &'static str },

    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("population_size must be at least 1")]
    ZeroPopulation,

    #[error("iterations must be at least 1")]
    ZeroIterations,

    #[error("walk-forward periods must be at least 1")]
    ZeroPeriods,

    #[error("walk-forward cannot be nested inside walk-forward")]
    NestedWalkForward,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

fn default_iterations() -> usize {
    100
}

fn default_inner() -> Box<MethodConfig> {
    Box::new(MethodConfig::GridSearch)
}

fn default_seed() -> u64 {
    42
}

fn default_parallel() -> bool {
    true
}

/// Search method and its method-specific knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MethodConfig {
    /// Exhaustive Cartesian product. Callers own tractability: grid size is
    /// the product of every dimension's cardinality and is not capped.
    GridSearch,
    MonteCarlo {
        #[serde(default = "default_iterations")]
        iterations: usize,
    },
    WalkForward {
        periods: usize,
        #[serde(default = "default_inner")]
        inner: Box<MethodConfig>,
    },
    Genetic(GeneticConfig),
}

impl MethodConfig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GridSearch => "grid_search",
            Self::MonteCarlo { .. } => "monte_carlo",
            Self::WalkForward { .. } => "walk_forward",
            Self::Genetic(_) => "genetic",
        }
    }
}

/// Genetic algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 10,
            crossover_rate: 1.0,
            mutation_rate: 0.1,
        }
    }
}

impl GeneticConfig {
    /// Individuals copied verbatim into the next generation: `floor(population · 0.1)`.
    pub fn elite_count(&self) -> usize {
        self.population_size / 10
    }
}

/// Everything needed to run one optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub method: MethodConfig,

    #[serde(default)]
    pub objective: Objective,

    #[serde(default)]
    pub parameters: ParameterSpace,

    pub date_range: DateRange,

    /// Master seed for every random stream in the run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Evaluate independent candidates on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl OptimizationConfig {
    pub fn new(method: MethodConfig, parameters: ParameterSpace, date_range: DateRange) -> Self {
        Self {
            method,
            objective: Objective::default(),
            parameters,
            date_range,
            seed: default_seed(),
            parallel: default_parallel(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Reject anything that would fail or be meaningless once evaluation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parameters.validate()?;
        self.date_range.validate()?;
        self.validate_method(&self.method, true)
    }

    fn validate_method(&self, method: &MethodConfig, top_level: bool) -> Result<(), ConfigError> {
        match method {
            MethodConfig::GridSearch => {
                if self.parameters.is_empty() {
                    return Err(ConfigError::EmptySpace {
                        method: method.label(),
                    });
                }
            }
            MethodConfig::MonteCarlo { iterations } => {
                if *iterations == 0 {
                    return Err(ConfigError::ZeroIterations);
                }
            }
            MethodConfig::WalkForward { periods, inner } => {
                if !top_level {
                    return Err(ConfigError::NestedWalkForward);
                }
                if *periods == 0 {
                    return Err(ConfigError::ZeroPeriods);
                }
                self.date_range.split(*periods)?;
                self.validate_method(inner, false)?;
            }
            MethodConfig::Genetic(ga) => {
                if self.parameters.is_empty() {
                    return Err(ConfigError::EmptySpace {
                        method: method.label(),
                    });
                }
                if ga.population_size == 0 {
                    return Err(ConfigError::ZeroPopulation);
                }
                check_rate("crossover_rate", ga.crossover_rate)?;
                check_rate("mutation_rate", ga.mutation_rate)?;
            }
        }
        Ok(())
    }

    /// Number of backtests the run will attempt, or `None` on overflow.
    pub fn planned_evaluations(&self) -> Option<usize> {
        planned(&self.method, &self.parameters)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&read()?),
            Some("json") => Self::from_json_str(&read()?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

fn planned(method: &MethodConfig, space: &ParameterSpace) -> Option<usize> {
    match method {
        MethodConfig::GridSearch => space.grid_size(),
        MethodConfig::MonteCarlo { iterations } => Some(*iterations),
        MethodConfig::WalkForward { periods, inner } => planned(inner, space)?.checked_mul(*periods),
        // The final population is evaluated once more after the last generation.
        MethodConfig::Genetic(ga) => ga.generations.checked_add(1)?.checked_mul(ga.population_size),
    }
}
