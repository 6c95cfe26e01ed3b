//! StratOpt Core — domain model for strategy parameter optimization.
//!
//! This crate holds the pure, I/O-free pieces of the optimizer:
//! - Parameter space model (numeric ranges and discrete value sets)
//! - Candidates and their fingerprints
//! - Candidate generator (grid expansion, uniform sampling, population init)
//! - Strategy templates with a nested condition tree
//! - Name-based parameter binder with a precomputed path index
//! - Date ranges and walk-forward partitioning
//! - Deterministic RNG hierarchy

pub mod binder;
pub mod candidate;
pub mod dates;
pub mod generator;
pub mod rng;
pub mod space;
pub mod strategy;

pub use binder::{bind, Binder, BindingIndex};
pub use candidate::{Candidate, CandidateHash};
pub use dates::{DateRange, DateRangeError};
pub use generator::{expand_grid, grid_iter, initialize_population, sample_random, GridIter};
pub use rng::RngHierarchy;
pub use space::{OptimizationParameter, ParameterDomain, ParameterSpace, SpaceError};
pub use strategy::{BoundStrategy, ConditionNode, FieldPath, PathSegment, StrategyTemplate};
