//! Per-tick aggregates, the movement log record, and the observer seam.

use ts_core::{AgentId, LinkId};

// ── TickAggregates ────────────────────────────────────────────────────────────

/// One worker's aggregate counters at the end of a tick.
///
/// Rows from all workers sum element-wise into the global row: `moving` is
/// signed because an agent can start a trip on one worker and finish it on
/// another, leaving one local counter positive and the other negative.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickAggregates {
    /// Simulation time at the end of the tick (seconds since midnight).
    pub time: f64,
    /// Agents currently owned by the worker.
    pub total_agents: u64,
    /// Net agents en route (start-of-trip increments, end-of-trip decrements).
    pub total_moving: i64,
    /// Trips completed so far.
    pub total_trips_performed: u64,
    /// Reroute decisions taken so far.
    pub total_rerouting: u64,
}

impl TickAggregates {
    /// Element-wise sum, keeping the time stamp.
    pub fn merge(self, other: TickAggregates) -> TickAggregates {
        TickAggregates {
            time: self.time.max(other.time),
            total_agents: self.total_agents + other.total_agents,
            total_moving: self.total_moving + other.total_moving,
            total_trips_performed: self.total_trips_performed + other.total_trips_performed,
            total_rerouting: self.total_rerouting + other.total_rerouting,
        }
    }
}

// ── MoveRecord ────────────────────────────────────────────────────────────────

/// One entry in the per-worker movement log: an agent entered a link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveRecord {
    pub agent: AgentId,
    pub link: LinkId,
    /// Simulation time at which the agent entered the link.
    pub entered_at: f64,
    /// Travel time assigned on entry.
    pub time_on_link: f64,
    /// 1-based index of the path (trip) the agent is on.
    pub path_idx: u32,
    /// 0-based index of the link within that path.
    pub link_idx: u32,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Callbacks invoked by [`Engine::run`][crate::Engine::run] at key points of
/// the loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait TickObserver {
    /// Called at the end of every tick with this worker's local aggregates.
    fn on_tick_end(&mut self, _tick: u64, _local: &TickAggregates) {}

    /// Called at every termination check (every 100 ticks) with the global
    /// agent count.
    fn on_progress(&mut self, _tick: u64, _time: f64, _remaining_agents: u64) {}

    /// Called once when the run stops.
    fn on_stop(&mut self, _tick: u64) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}
