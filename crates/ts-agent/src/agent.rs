//! Per-driver simulation state.

use std::collections::VecDeque;

use ts_core::{AgentId, LinkId, Point};
use ts_net::Network;

use crate::{Strategy, Trip};

/// One autonomous driver.
///
/// All fields are `pub`: the engine's tick loop reads and writes them
/// directly, and keeping the transition logic in one place there makes the
/// state machine auditable.  The methods here are the pure bits — path
/// consumption, the reroute signals, trip hand-over — that are meaningful
/// without an engine.
///
/// State summary: `at_node && !en_route` is "waiting for the trip to
/// start"; `at_node && en_route` is "paused at an intermediate node";
/// `!at_node` is "traversing `cur_link`".
#[derive(Clone, Debug)]
pub struct Agent {
    /// Stable identity.
    pub id: AgentId,
    /// Rank of the worker that created the agent.
    pub home_rank: u32,
    /// Rank of the worker currently simulating the agent.
    pub rank: u32,
    /// Remaining trips; the front is the current (or next) trip.
    pub trips: VecDeque<Trip>,
    /// Position in partitioning space.
    pub x: f64,
    pub y: f64,
    /// Seconds until the next state transition.  Never negative.
    pub remaining_time: f64,
    /// Reroute strategy.
    pub strategy: Strategy,
    /// Planned links in reverse traversal order: the next link to enter is
    /// the last element.
    pub path: Vec<LinkId>,
    /// `true` from the start of a trip until its end.
    pub en_route: bool,
    /// `true` while the agent is waiting at a node.
    pub at_node: bool,
    /// Link being traversed; meaningful while `en_route`.
    pub cur_link: Option<LinkId>,
    /// Sum of free-flow times of the links traversed on the current trip.
    pub trip_duration_theo: f64,
    /// 1-based index of the current path (trip) — for the movement log.
    pub n_paths: u32,
    /// 0-based index of the current link within the path.
    pub n_link_in_path: u32,
}

impl Agent {
    /// A fresh agent waiting at the origin of its first trip.
    ///
    /// `remaining_time` is the first trip's start time, so the start-of-trip
    /// transition fires exactly when the clock reaches it.
    pub fn new(id: AgentId, rank: u32, trips: Vec<Trip>) -> Self {
        let remaining_time = trips.first().map_or(0.0, |t| t.start_time);
        Self {
            id,
            home_rank: rank,
            rank,
            trips: trips.into(),
            x: 0.0,
            y: 0.0,
            remaining_time,
            strategy: Strategy::default(),
            path: Vec::new(),
            en_route: false,
            at_node: true,
            cur_link: None,
            trip_duration_theo: 0.0,
            n_paths: 1,
            n_link_in_path: 0,
        }
    }

    /// The trip currently being performed (or waited for).
    #[inline]
    pub fn current_trip(&self) -> Option<&Trip> {
        self.trips.front()
    }

    /// Decrement the transition timer by `dt`, clamping at zero.
    #[inline]
    pub fn decrease_remaining_time(&mut self, dt: f64) {
        self.remaining_time = (self.remaining_time - dt).max(0.0);
    }

    /// Pop the next planned link off the path and count it.
    ///
    /// Returns `None` when the path is exhausted — the engine treats that as
    /// a corrupted agent and aborts rather than guessing.
    pub fn next_link_and_remove(&mut self) -> Option<LinkId> {
        let link = self.path.pop()?;
        self.n_link_in_path += 1;
        Some(link)
    }

    /// Should the agent abandon `next_link` and replan?
    ///
    /// Combines the strategy gate, the two congestion signals, and the
    /// empty-link suppression:
    ///
    /// - x₁ = (now − trip start) / theoretical duration so far — how much
    ///   congestion has already slowed this trip;
    /// - x₂ = occupancy / capacity of the next planned link — how saturated
    ///   the road ahead is.  Rerouting around an empty link is never useful,
    ///   so x₂ ≤ 0 suppresses the decision outright.
    pub fn wants_reroute(&self, net: &Network, next_link: LinkId, now: f64) -> bool {
        if !self.strategy.optimized {
            return false;
        }
        let Some(trip) = self.trips.front() else {
            return false;
        };

        let x1 = if self.trip_duration_theo > 0.0 {
            (now - trip.start_time) / self.trip_duration_theo
        } else {
            0.0
        };
        let x2 = net.link(next_link).saturation();

        if x2 <= 0.0 {
            return false;
        }
        self.strategy.decides_reroute(x1, x2)
    }

    /// Hand over to the next trip after the previous one completed.
    ///
    /// The caller has already popped the finished trip and planned `path`
    /// for the new front trip; this resets the per-trip state and parks the
    /// agent at `origin_pos` until the trip's start time (immediately, if
    /// the agent is late).
    pub fn install_next_trip(&mut self, path: Vec<LinkId>, origin_pos: Point, now: f64) {
        let start_time = self.trips.front().map_or(now, |t| t.start_time);
        self.path = path;
        self.x = origin_pos.x;
        self.y = origin_pos.y;
        self.en_route = false;
        self.at_node = true;
        self.cur_link = None;
        self.trip_duration_theo = 0.0;
        self.remaining_time = (start_time - now).max(0.0);
        self.n_paths += 1;
        self.n_link_in_path = 0;
    }
}
