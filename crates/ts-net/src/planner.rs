//! Shortest-path planner: plain min-cost, A*, and an edge-avoiding variant.
//!
//! All three share the Fibonacci-heap search core and return the path in
//! **reverse traversal order** — the first link to enter is the *last*
//! element of `PlannedPath::links`, so agents can pop links off the back as
//! they travel.  An empty path is returned when source equals destination.
//!
//! # Cost units
//!
//! Costs are either metres ([`CostMetric::Length`]) or free-flow seconds
//! ([`CostMetric::FreeFlowTime`]).  Occupancy never enters the planner;
//! congestion feeds back through the reroute predicate instead.

use ts_core::{LinkId, NodeId};
use ts_heap::{FibHeap, HeapHandle};

use crate::network::{Link, Network};
use crate::{NetError, NetResult};

// ── CostMetric ────────────────────────────────────────────────────────────────

/// Which per-link quantity the search minimises.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CostMetric {
    /// Link length in metres (shortest path).
    Length,
    /// Free-flow traversal time in seconds (fastest path).
    FreeFlowTime,
}

impl CostMetric {
    #[inline]
    fn cost(self, link: &Link) -> f64 {
        match self {
            CostMetric::Length => link.length,
            CostMetric::FreeFlowTime => link.free_flow_time,
        }
    }
}

// ── PlannedPath ───────────────────────────────────────────────────────────────

/// The result of a planning query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// Links in reverse traversal order: the next link to enter is the last
    /// element.
    pub links: Vec<LinkId>,
    /// Total cost under the metric the query ran with.
    pub cost: f64,
}

impl PlannedPath {
    /// `true` when source equalled destination.
    pub fn is_trivial(&self) -> bool {
        self.links.is_empty()
    }

    fn trivial() -> Self {
        Self { links: Vec::new(), cost: 0.0 }
    }
}

// ── Plain shortest path ───────────────────────────────────────────────────────

/// Classic min-cost search from `source` to `destination`.
///
/// Every node starts in the heap at +∞ and the source is decreased to zero;
/// extraction of an infinite key before the destination means the
/// destination is unreachable.
pub fn shortest_path(
    net: &Network,
    source: NodeId,
    destination: NodeId,
    metric: CostMetric,
) -> NetResult<PlannedPath> {
    if source == destination {
        return Ok(PlannedPath::trivial());
    }

    let n = net.node_count();
    let mut heap: FibHeap<NodeId, f64> = FibHeap::with_capacity(n);
    let mut handles: Vec<HeapHandle> = Vec::with_capacity(n);
    for i in 0..n {
        handles.push(heap.insert(NodeId(i as u32), f64::INFINITY));
    }
    heap.decrease_key(handles[source.index()], 0.0)?;

    let mut prev_link = vec![LinkId::INVALID; n];
    let mut closed = vec![false; n];

    loop {
        let (node, dist) = match heap.extract_min() {
            Ok(entry) => entry,
            Err(_) => return Err(NetError::NoPath { from: source, to: destination }),
        };
        if !dist.is_finite() {
            return Err(NetError::NoPath { from: source, to: destination });
        }
        if node == destination {
            return Ok(reconstruct(net, &prev_link, source, destination, dist));
        }
        closed[node.index()] = true;

        for &lid in &net.node(node).links_out {
            let link = net.link(lid);
            let neighbour = link.to;
            if closed[neighbour.index()] {
                continue;
            }
            let tentative = dist + metric.cost(link);
            if tentative < heap.key(handles[neighbour.index()])? {
                heap.decrease_key(handles[neighbour.index()], tentative)?;
                prev_link[neighbour.index()] = lid;
            }
        }
    }
}

// ── A* ────────────────────────────────────────────────────────────────────────

/// A* search keyed on `g + h` with the L1 heuristic on physical coordinates.
///
/// Nodes enter the open set lazily on discovery; once extracted a node is
/// closed and never updated again.  Fails with [`NetError::NoPath`] when the
/// open set empties before the destination is extracted.
pub fn astar(
    net: &Network,
    source: NodeId,
    destination: NodeId,
    metric: CostMetric,
) -> NetResult<PlannedPath> {
    if source == destination {
        return Ok(PlannedPath::trivial());
    }

    let n = net.node_count();
    let mut heap: FibHeap<NodeId, f64> = FibHeap::new();
    let mut handles: Vec<Option<HeapHandle>> = vec![None; n];
    let mut g_score = vec![f64::INFINITY; n];
    let mut prev_link = vec![LinkId::INVALID; n];
    let mut closed = vec![false; n];

    g_score[source.index()] = 0.0;
    handles[source.index()] = Some(heap.insert(source, net.heuristic(source, destination)));

    loop {
        let (node, _f) = match heap.extract_min() {
            Ok(entry) => entry,
            Err(_) => return Err(NetError::NoPath { from: source, to: destination }),
        };
        if node == destination {
            let cost = g_score[destination.index()];
            return Ok(reconstruct(net, &prev_link, source, destination, cost));
        }
        closed[node.index()] = true;
        let dist = g_score[node.index()];

        for &lid in &net.node(node).links_out {
            let link = net.link(lid);
            let neighbour = link.to;
            if closed[neighbour.index()] {
                continue;
            }
            let tentative = dist + metric.cost(link);
            if tentative < g_score[neighbour.index()] {
                g_score[neighbour.index()] = tentative;
                prev_link[neighbour.index()] = lid;
                let f = tentative + net.heuristic(neighbour, destination);
                // The heuristic term is constant per node, so a better g
                // always gives a strictly smaller f here.
                match handles[neighbour.index()] {
                    Some(h) => heap.decrease_key(h, f)?,
                    None => handles[neighbour.index()] = Some(heap.insert(neighbour, f)),
                }
            }
        }
    }
}

// ── Edge-avoiding A* ──────────────────────────────────────────────────────────

/// Cost applied to the avoided link for the duration of the search: large
/// enough that the link is taken only when it is the sole option, finite so
/// the graph stays connected.
const AVOID_COST: f64 = f64::MAX * 0.5;

/// Plan from `source` to `destination` while steering around `avoid`.
///
/// The avoided link's cost is temporarily inflated and restored afterwards,
/// so this takes `&mut Network` and must not race with concurrent planners —
/// the engine only calls it from the single-threaded tick loop.
pub fn astar_avoiding(
    net: &mut Network,
    source: NodeId,
    destination: NodeId,
    avoid: LinkId,
    metric: CostMetric,
) -> NetResult<PlannedPath> {
    let saved = {
        let link = net.link_mut(avoid);
        match metric {
            CostMetric::Length => std::mem::replace(&mut link.length, AVOID_COST),
            CostMetric::FreeFlowTime => std::mem::replace(&mut link.free_flow_time, AVOID_COST),
        }
    };

    let result = astar(net, source, destination, metric);

    let link = net.link_mut(avoid);
    match metric {
        CostMetric::Length => link.length = saved,
        CostMetric::FreeFlowTime => link.free_flow_time = saved,
    }

    result
}

// ── Reconstruction ────────────────────────────────────────────────────────────

/// Follow predecessor links back from the destination.  The path comes out
/// in reverse traversal order, which is exactly the order agents consume.
fn reconstruct(
    net: &Network,
    prev_link: &[LinkId],
    source: NodeId,
    destination: NodeId,
    cost: f64,
) -> PlannedPath {
    let mut links = Vec::new();
    let mut current = destination;
    while current != source {
        let lid = prev_link[current.index()];
        debug_assert!(lid != LinkId::INVALID, "broken predecessor chain");
        links.push(lid);
        current = net.link(lid).from;
    }
    PlannedPath { links, cost }
}
