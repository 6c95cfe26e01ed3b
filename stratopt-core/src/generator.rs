//! Candidate generator — pure functions from a parameter space to candidates.
//!
//! - `expand_grid()` / `grid_iter()`: full Cartesian product (grid search).
//! - `sample_random()`: one uniform draw per dimension (Monte Carlo).
//! - `initialize_population()`: `size` independent draws (genetic).
//!
//! Randomness is always injected; nothing here touches a global RNG.

use rand::Rng;

use crate::candidate::Candidate;
use crate::space::ParameterSpace;

/// Lazy iterator over the Cartesian product of a parameter space.
///
/// Ordering is parameter-major, value-minor: the first parameter varies slowest
/// and the last parameter varies fastest. Identical spaces always produce the
/// identical sequence.
pub struct GridIter<'a> {
    space: &'a ParameterSpace,
    cardinalities: Vec<usize>,
    indices: Vec<usize>,
    done: bool,
}

impl<'a> GridIter<'a> {
    fn new(space: &'a ParameterSpace) -> Self {
        // A dimension that cannot be enumerated makes the product empty.
        let cardinalities: Vec<usize> = space
            .iter()
            .map(|p| p.cardinality().unwrap_or(0))
            .collect();
        let done = cardinalities.iter().any(|&c| c == 0);
        Self {
            space,
            indices: vec![0; cardinalities.len()],
            cardinalities,
            done,
        }
    }

    fn advance(&mut self) {
        for i in (0..self.indices.len()).rev() {
            self.indices[i] += 1;
            if self.indices[i] < self.cardinalities[i] {
                return;
            }
            self.indices[i] = 0;
        }
        // Every position wrapped (or there are no positions): exhausted.
        self.done = true;
    }
}

impl Iterator for GridIter<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.done {
            return None;
        }
        let candidate = self
            .space
            .iter()
            .zip(&self.indices)
            .map(|(param, &k)| (param.name.clone(), param.value_at(k)))
            .collect();
        self.advance();
        Some(candidate)
    }
}

/// Iterate the grid lazily. See [`GridIter`] for ordering.
pub fn grid_iter(space: &ParameterSpace) -> GridIter<'_> {
    GridIter::new(space)
}

/// Materialize the full grid.
///
/// An empty space yields exactly one empty candidate. The result size is
/// `space.grid_size()`; keeping that tractable is the caller's responsibility.
pub fn expand_grid(space: &ParameterSpace) -> Vec<Candidate> {
    grid_iter(space).collect()
}

/// Draw one value per dimension, uniformly over that dimension's enumerated values.
///
/// Dimensions with nothing to enumerate (only possible in an unvalidated
/// space) are left out of the candidate.
pub fn sample_random<R: Rng + ?Sized>(space: &ParameterSpace, rng: &mut R) -> Candidate {
    space
        .iter()
        .filter_map(|param| {
            let n = param.cardinality().filter(|&n| n > 0)?;
            let k = rng.gen_range(0..n);
            Some((param.name.clone(), param.value_at(k)))
        })
        .collect()
}

/// `size` independent random candidates.
pub fn initialize_population<R: Rng + ?Sized>(
    space: &ParameterSpace,
    size: usize,
    rng: &mut R,
) -> Vec<Candidate> {
    (0..size).map(|_| sample_random(space, rng)).collect()
}
