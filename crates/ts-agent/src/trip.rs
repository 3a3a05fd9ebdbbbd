//! A single planned trip.

use serde::{Deserialize, Serialize};

use ts_core::NodeId;

/// One trip of an agent's daily plan.
///
/// `start_time` is the earliest departure in seconds since midnight.  An
/// agent that reaches the trip's origin later than this simply departs
/// immediately (its waiting time is clamped to zero).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub origin: NodeId,
    pub destination: NodeId,
    pub start_time: f64,
}

impl Trip {
    pub fn new(origin: NodeId, destination: NodeId, start_time: f64) -> Self {
        Self { origin, destination, start_time }
    }
}
