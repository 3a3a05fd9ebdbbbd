//! `ts-net` — road network, congestion model, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `Network`, `NetworkBuilder`, `Node`, `Link`, BPR travel time  |
//! | [`planner`] | `shortest_path`, `astar`, `astar_avoiding`, `PlannedPath`     |
//! | [`cache`]   | `PathCache` — worker-local `(origin, destination)` memoiser   |
//! | [`error`]   | `NetError`, `NetResult<T>`                                    |
//!
//! # Coordinate spaces
//!
//! Every node carries two positions: the *physical* coordinates from the
//! input file (kept for the A* heuristic and display) and the *partitioning*
//! coordinates assigned once at startup by
//! [`Network::shuffle_coordinates`], which place the node in the strip
//! `[0, P] × [0, 1]` of the worker that owns it.

pub mod cache;
pub mod error;
pub mod network;
pub mod planner;

#[cfg(test)]
mod tests;

pub use cache::PathCache;
pub use error::{NetError, NetResult};
pub use network::{BoundingBox, Link, Network, NetworkBuilder, Node};
pub use planner::{astar, astar_avoiding, shortest_path, CostMetric, PlannedPath};
