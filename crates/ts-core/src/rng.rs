//! Deterministic per-worker RNG wrapper.
//!
//! # Determinism strategy
//!
//! Each worker gets its own independent `SmallRng` seeded by:
//!
//!   seed = rank XOR MIXING_CONSTANT rotated through a multiply
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive ranks uniformly across the seed space.  Two
//! runs with the same rank layout draw identical sequences, so strategy
//! assignment and every other stochastic choice are reproducible.
//!
//! The coordinate shuffle needs no randomness at all (it is a round-robin
//! assignment); workers therefore never have to agree on a shared stream.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-worker deterministic RNG.
///
/// Create one per worker at startup; the type is `!Sync` to prevent
/// accidental sharing across threads — each worker holds its own.
pub struct WorkerRng(SmallRng);

impl WorkerRng {
    /// Seed deterministically from the worker rank.
    pub fn for_rank(rank: u32) -> Self {
        let seed = (rank as u64 + 1).wrapping_mul(MIXING_CONSTANT);
        WorkerRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// A uniform draw in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
