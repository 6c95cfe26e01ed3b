//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(stream, index)` pair,
//! e.g. `("genetic", generation)` or `("walk_forward", period)`. Sub-seeds are derived
//! via BLAKE3 hashing, independently of thread scheduling order, so an optimization
//! run is reproducible regardless of how its work is parallelized.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a specific `(stream, index)`.
    ///
    /// Independent of derivation order: deriving `("a", 0)` then `("b", 0)`
    /// yields the same seeds as deriving them in reverse.
    pub fn sub_seed(&self, stream: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng for `(stream, index)`.
    pub fn rng_for(&self, stream: &str, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, index))
    }

    /// A child hierarchy rooted at `(stream, index)`.
    ///
    /// Used to give each walk-forward period its own independent set of streams.
    pub fn child(&self, stream: &str, index: u64) -> RngHierarchy {
        RngHierarchy::new(self.sub_seed(stream, index))
    }
}
