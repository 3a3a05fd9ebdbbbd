//! The per-agent reroute strategy.
//!
//! A strategy is a separating line in the plane of the two congestion
//! signals: given (x₁, x₂) the agent reroutes iff
//!
//!   x₁·cos α + x₂·sin α − θ > 0
//!
//! α and θ come from the strategy catalog file; sin/cos are precomputed at
//! construction because the predicate runs once per agent per node visit.

use serde::{Deserialize, Serialize};

/// Parameters of the linear-threshold reroute predicate.
///
/// The default strategy is inert: `optimized` is false and the agent never
/// reroutes, whatever the congestion signals say.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub sin_alpha: f64,
    pub cos_alpha: f64,
    pub theta: f64,
    pub optimized: bool,
}

impl Strategy {
    /// An optimised strategy with angle `alpha` (radians) and threshold
    /// `theta`.
    pub fn new(alpha: f64, theta: f64) -> Self {
        Self {
            sin_alpha: alpha.sin(),
            cos_alpha: alpha.cos(),
            theta,
            optimized: true,
        }
    }

    /// Evaluate the predicate on the congestion signals.
    ///
    /// Callers must handle the `optimized` flag and the x₂ ≤ 0 suppression
    /// themselves (see [`Agent::wants_reroute`](crate::Agent::wants_reroute));
    /// this is the bare linear test.
    #[inline]
    pub fn decides_reroute(&self, x1: f64, x2: f64) -> bool {
        x1 * self.cos_alpha + x2 * self.sin_alpha - self.theta > 0.0
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self { sin_alpha: 0.0, cos_alpha: 0.0, theta: 0.0, optimized: false }
    }
}
