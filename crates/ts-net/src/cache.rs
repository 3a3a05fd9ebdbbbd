//! Worker-local memoisation of planning queries.
//!
//! Keyed on `(origin, destination)`.  Entries never expire and are never
//! invalidated by changing occupancy — the planner ignores occupancy, so a
//! cached path stays exactly what a fresh query would return.  Only
//! startup-time initial paths go through the cache; mid-trip recomputations
//! (reroutes, next-trip plans) are computed fresh by the engine.

use std::collections::HashMap;

use ts_core::NodeId;

use crate::network::Network;
use crate::planner::{astar, CostMetric, PlannedPath};
use crate::NetResult;

/// A `(origin, destination) → PlannedPath` memoiser.
#[derive(Default)]
pub struct PathCache {
    map: HashMap<(NodeId, NodeId), PlannedPath>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoised pairs.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Return the memoised path for `(origin, destination)`, running an A*
    /// query on the first request.
    pub fn get_or_compute(
        &mut self,
        net: &Network,
        origin: NodeId,
        destination: NodeId,
        metric: CostMetric,
    ) -> NetResult<PlannedPath> {
        if let Some(path) = self.map.get(&(origin, destination)) {
            return Ok(path.clone());
        }
        let path = astar(net, origin, destination, metric)?;
        self.map.insert((origin, destination), path.clone());
        Ok(path)
    }
}
