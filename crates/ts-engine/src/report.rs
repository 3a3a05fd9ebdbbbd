//! End-of-run data, gathered and resolved for the output writers.
//!
//! `Engine::finish` turns internal ids back into the stable string
//! identities of the input files, gathers the globally-owned series to rank
//! 0, and leaves per-worker data (the movement log) local.  The writers in
//! `ts-io` consume these rows without needing the network or the engine.

use crate::stats::TickAggregates;

/// One per-link time series destined for the flows/saturation files.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSeriesRow {
    /// Stable link identity.
    pub link: String,
    /// Link capacity, for the saturation variant of the file.
    pub capacity: f64,
    /// One count per recording bucket.
    pub counts: Vec<u32>,
}

/// One movement-log row, string ids resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveRow {
    pub agent: u64,
    pub link: String,
    pub entered_at: f64,
    pub time_on_link: f64,
    pub path_idx: u32,
    pub link_idx: u32,
}

/// Everything the writers need after a run.
///
/// On rank 0 the gathered fields hold the whole world's data; on other
/// ranks they are empty and only `moves` (always per-worker) is populated.
#[derive(Clone, Debug, Default)]
pub struct SimReport {
    /// Rank that produced this report.
    pub rank: u32,
    /// Globally summed per-tick aggregates (rank 0 only).
    pub sim_series: Vec<TickAggregates>,
    /// All trip start times, sorted ascending (rank 0 only).
    pub starting_times: Vec<f64>,
    /// Final fitness per agent, sorted by agent id (rank 0 only).
    pub fitness: Vec<(u64, f64)>,
    /// Aggregate per-link load series, all workers (rank 0 only).
    pub link_loads: Vec<LinkSeriesRow>,
    /// Snapshot per-link series, all workers (rank 0 only).
    pub link_snapshots: Vec<LinkSeriesRow>,
    /// This worker's movement log.
    pub moves: Vec<MoveRow>,
}
