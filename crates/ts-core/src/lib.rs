//! `ts-core` — foundational types for the traffic microsimulation workspace.
//!
//! This crate is a dependency of every other `ts-*` crate.  It intentionally
//! has no `ts-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                           |
//! |--------------|----------------------------------------------------|
//! | [`ids`]      | `AgentId`, `NodeId`, `LinkId`                      |
//! | [`point`]    | `Point`, Manhattan distance                        |
//! | [`params`]   | `SimParams`, `NetworkFormat`                       |
//! | [`rng`]      | `WorkerRng` (per-worker deterministic RNG)         |
//! | [`error`]    | `CoreError`, `CoreResult`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|---------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.     |

pub mod error;
pub mod ids;
pub mod params;
pub mod point;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, LinkId, NodeId};
pub use params::{NetworkFormat, SimParams};
pub use point::Point;
pub use rng::WorkerRng;
