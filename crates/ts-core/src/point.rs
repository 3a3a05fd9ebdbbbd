//! Planar coordinate type.
//!
//! Two coordinate spaces share this type: the *physical* space the input
//! files describe (metres or whatever projection the network ships in) and
//! the *partitioning* space `[0, P] × [0, 1]` that worker ownership is
//! defined over.  A `Point` does not know which space it lives in; the
//! `Node` that owns it does.

/// A 2-D coordinate stored as double-precision floats.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// L1 (Manhattan) distance to `other`.
    ///
    /// This is the A* heuristic of the path planner: cheap, and admissible
    /// on grid-like road networks where link lengths dominate the coordinate
    /// deltas.
    #[inline]
    pub fn manhattan(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}
