//! `ts-engine` — the partitioned simulation engine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`bounds`]  | `StripBounds` — one worker's slice of partitioning space    |
//! | [`comm`]    | `Communicator` trait, `SoloComm`, `ThreadComm`              |
//! | [`engine`]  | `Engine<C>` — tick loop, state machine, migration           |
//! | [`stats`]   | `TickAggregates`, `MoveRecord`, `TickObserver`              |
//! | [`report`]  | `SimReport` — end-of-run data gathered for the writers      |
//! | [`error`]   | `EngineError`, `EngineResult<T>`                            |
//!
//! # Tick anatomy
//!
//! ```text
//! for each tick:
//!   ① clear the pending-migration map, advance the clock by 1 s
//!   ② walk local agents in id order; run the state machine on any agent
//!      whose remaining time fell to the tolerance:
//!        at node, not en route  → start-of-trip, then depart-node
//!        at node, en route      → depart-node (maybe reroute first)
//!        on a link              → arrive-node or end-of-trip
//!   ③ at snapshot ticks, scan en-route agents into the snapshot series
//!   ④ push the local per-tick aggregate row
//!   ⑤ synchronise: ship staged agents to their new workers (all-to-all)
//! every 100 ticks: all-reduce the agent count; stop at zero
//! ```
//!
//! Ownership rule: a link belongs to the worker owning its origin node, and
//! only depart-node / arrive-node touch occupancy — both run on the owner.
//! That is the whole concurrency story; no locks anywhere.

pub mod bounds;
pub mod comm;
pub mod engine;
pub mod error;
pub mod report;
pub mod stats;


pub use bounds::StripBounds;
pub use comm::{Communicator, SoloComm, ThreadComm};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use report::{LinkSeriesRow, MoveRow, SimReport};
pub use stats::{MoveRecord, NoopObserver, TickAggregates, TickObserver};
