//! Serialisable migration state.
//!
//! When an agent's position leaves its worker's bounds, the full agent
//! state is packaged, shipped to the owning worker, and reconstructed
//! there.  The package is the wire format: a plain struct with `serde`
//! derives so any transport (in-process channels, sockets, files) can carry
//! it.

use serde::{Deserialize, Serialize};

use ts_core::{AgentId, LinkId};

use crate::{Agent, Strategy, Trip};

/// The complete transferable state of one agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentPackage {
    pub id: AgentId,
    pub home_rank: u32,
    /// Rank of the worker the agent is being shipped to.
    pub rank: u32,
    pub trips: Vec<Trip>,
    pub x: f64,
    pub y: f64,
    pub remaining_time: f64,
    pub strategy: Strategy,
    pub path: Vec<LinkId>,
    pub en_route: bool,
    pub at_node: bool,
    pub cur_link: Option<LinkId>,
    pub trip_duration_theo: f64,
    pub n_paths: u32,
    pub n_link_in_path: u32,
}

impl AgentPackage {
    /// Package `agent` for shipment to worker `destination`.
    pub fn for_destination(agent: &Agent, destination: u32) -> Self {
        Self {
            id: agent.id,
            home_rank: agent.home_rank,
            rank: destination,
            trips: agent.trips.iter().copied().collect(),
            x: agent.x,
            y: agent.y,
            remaining_time: agent.remaining_time,
            strategy: agent.strategy,
            path: agent.path.clone(),
            en_route: agent.en_route,
            at_node: agent.at_node,
            cur_link: agent.cur_link,
            trip_duration_theo: agent.trip_duration_theo,
            n_paths: agent.n_paths,
            n_link_in_path: agent.n_link_in_path,
        }
    }
}

impl From<AgentPackage> for Agent {
    fn from(pkg: AgentPackage) -> Agent {
        Agent {
            id: pkg.id,
            home_rank: pkg.home_rank,
            rank: pkg.rank,
            trips: pkg.trips.into(),
            x: pkg.x,
            y: pkg.y,
            remaining_time: pkg.remaining_time,
            strategy: pkg.strategy,
            path: pkg.path,
            en_route: pkg.en_route,
            at_node: pkg.at_node,
            cur_link: pkg.cur_link,
            trip_duration_theo: pkg.trip_duration_theo,
            n_paths: pkg.n_paths,
            n_link_in_path: pkg.n_link_in_path,
        }
    }
}
