//! `ts-agent` — driver agents, their trips, and their reroute strategies.
//!
//! # Crate layout
//!
//! | Module       | Contents                                            |
//! |--------------|-----------------------------------------------------|
//! | [`trip`]     | `Trip` (origin, destination, earliest start)        |
//! | [`strategy`] | `Strategy` — linear-threshold reroute predicate     |
//! | [`agent`]    | `Agent` — per-driver simulation state               |
//! | [`package`]  | `AgentPackage` — serialisable migration state       |
//!
//! The state *machine* that drives agents through their trips lives in
//! `ts-engine`; this crate owns the state itself and the pure decision
//! helpers, so it stays testable without a running engine.

pub mod agent;
pub mod package;
pub mod strategy;
pub mod trip;

#[cfg(test)]
mod tests;

pub use agent::Agent;
pub use package::AgentPackage;
pub use strategy::Strategy;
pub use trip::Trip;
