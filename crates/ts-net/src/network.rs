//! Road network representation and builder.
//!
//! # Data layout
//!
//! Node and link identities arrive from the input files as strings.  The
//! builder interns them into dense `NodeId`/`LinkId` indices so the hot
//! paths (planner relaxation, occupancy updates) are plain `Vec` lookups;
//! the original strings are kept on each record for output files.
//!
//! Two-way roads are two independent `Link`s.  The TRANSIMS reader relates
//! their string ids by prefix inversion: the reverse of link `"17"` is
//! `"-17"`.
//!
//! # Occupancy ownership
//!
//! `occupancy` counts the agents currently traversing a link.  It is only
//! ever mutated by the worker that owns the link's origin node, so no
//! synchronisation is needed; see the engine's depart/arrive transitions.

use std::collections::HashMap;

use ts_core::{LinkId, NodeId, Point};

use crate::{NetError, NetResult};

// ── Node ──────────────────────────────────────────────────────────────────────

/// A road-network node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Stable identity from the input file.
    pub id: String,
    /// Partitioning coordinates in `[0, P] × [0, 1]`.  Equal to `phys`
    /// until [`Network::shuffle_coordinates`] runs.
    pub pos: Point,
    /// Physical coordinates from the input file (heuristic / display).
    pub phys: Point,
    /// Outgoing links, in insertion order.
    pub links_out: Vec<LinkId>,
}

// ── Link ──────────────────────────────────────────────────────────────────────

/// A directed road-network link.
#[derive(Clone, Debug)]
pub struct Link {
    /// Stable identity from the input file.
    pub id: String,
    /// Origin node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// Length in metres.
    pub length: f64,
    /// Free-flow traversal time in seconds (= length / free-flow speed).
    pub free_flow_time: f64,
    /// Capacity in vehicles per hour per kilometre.
    pub capacity: f64,
    /// Number of agents currently traversing the link.
    occupancy: u32,
}

impl Link {
    #[inline]
    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    /// Current saturation `occupancy / capacity`.
    #[inline]
    pub fn saturation(&self) -> f64 {
        self.occupancy as f64 / self.capacity
    }

    /// Time for an agent to traverse the link at the current occupancy,
    /// per the BPR volume-delay function:
    ///
    ///   t(n) = t_free · (1 + 0.15 · (n / c)⁴)
    #[inline]
    pub fn travel_time(&self) -> f64 {
        let ratio = self.occupancy as f64 / self.capacity;
        self.free_flow_time * (1.0 + 0.15 * ratio.powi(4))
    }
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Extremes of the physical node coordinates, cached at build time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Immutable graph topology plus the mutable per-link agent counts.
///
/// Construct with [`NetworkBuilder`].
#[derive(Clone)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_ids: HashMap<String, NodeId>,
    link_ids: HashMap<String, LinkId>,
    bbox: BoundingBox,
}

impl Network {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Bounding box over the physical node coordinates.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.index()]
    }

    /// Resolve a string node identity.
    pub fn node_id(&self, id: &str) -> NetResult<NodeId> {
        self.node_ids
            .get(id)
            .copied()
            .ok_or_else(|| NetError::UnknownNode(id.to_owned()))
    }

    /// Resolve a string link identity.
    pub fn link_id(&self, id: &str) -> NetResult<LinkId> {
        self.link_ids
            .get(id)
            .copied()
            .ok_or_else(|| NetError::UnknownLink(id.to_owned()))
    }

    /// Iterator over `(NodeId, &Node)` in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Iterator over `(LinkId, &Link)` in index order.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i as u32), l))
    }

    /// Out-degree of `node`.
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.nodes[node.index()].links_out.len()
    }

    // ── Per-tick mutation ─────────────────────────────────────────────────

    /// Count one more agent on `link`.  O(1).
    #[inline]
    pub fn increment_occupancy(&mut self, link: LinkId) {
        self.links[link.index()].occupancy += 1;
    }

    /// Count one fewer agent on `link`.  O(1).
    ///
    /// # Panics
    /// Panics in debug mode if the count would go negative — that means a
    /// transition decremented a link the agent never entered.
    #[inline]
    pub fn decrement_occupancy(&mut self, link: LinkId) {
        debug_assert!(self.links[link.index()].occupancy > 0);
        self.links[link.index()].occupancy -= 1;
    }

    // ── Derived startup operations ────────────────────────────────────────

    /// Assign partitioning coordinates for a run with `world` workers.
    ///
    /// Iterating nodes in index order, node i is placed at
    /// `((i mod world) + 0.5, 0.5)` — a round-robin assignment into `world`
    /// unit-width vertical strips.  Physical coordinates are untouched, so
    /// the A* heuristic keeps working.  Every worker computes the identical
    /// assignment; re-running is idempotent.
    pub fn shuffle_coordinates(&mut self, world: u32) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.pos = Point::new((i as u32 % world) as f64 + 0.5, 0.5);
        }
    }

    /// A* heuristic: L1 distance between the *physical* positions of two
    /// nodes.
    #[inline]
    pub fn heuristic(&self, a: NodeId, b: NodeId) -> f64 {
        self.nodes[a.index()].phys.manhattan(self.nodes[b.index()].phys)
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// Nodes must be added before the links that reference them; links may
/// otherwise arrive in any order.  Duplicate identities are rejected —
/// malformed input is fatal at startup.
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_ids: HashMap<String, NodeId>,
    link_ids: HashMap<String, LinkId>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            node_ids: HashMap::new(),
            link_ids: HashMap::new(),
        }
    }

    /// Pre-allocate for the expected number of nodes and links.
    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
            node_ids: HashMap::with_capacity(nodes),
            link_ids: HashMap::with_capacity(links),
        }
    }

    /// Add a node at physical position `(x, y)`.
    pub fn add_node(&mut self, id: &str, x: f64, y: f64) -> NetResult<NodeId> {
        if self.node_ids.contains_key(id) {
            return Err(NetError::DuplicateNode(id.to_owned()));
        }
        let node_id = NodeId(self.nodes.len() as u32);
        let phys = Point::new(x, y);
        self.nodes.push(Node {
            id: id.to_owned(),
            pos: phys,
            phys,
            links_out: Vec::new(),
        });
        self.node_ids.insert(id.to_owned(), node_id);
        Ok(node_id)
    }

    /// Add a directed link.
    ///
    /// `free_flow_speed` is in metres per second; the stored free-flow time
    /// is `length / free_flow_speed`.
    pub fn add_link(
        &mut self,
        id: &str,
        from: &str,
        to: &str,
        length: f64,
        free_flow_speed: f64,
        capacity: f64,
    ) -> NetResult<LinkId> {
        if self.link_ids.contains_key(id) {
            return Err(NetError::DuplicateLink(id.to_owned()));
        }
        let from_id = self.resolve(from)?;
        let to_id = self.resolve(to)?;

        let link_id = LinkId(self.links.len() as u32);
        self.links.push(Link {
            id: id.to_owned(),
            from: from_id,
            to: to_id,
            length,
            free_flow_time: length / free_flow_speed,
            capacity,
            occupancy: 0,
        });
        self.link_ids.insert(id.to_owned(), link_id);
        self.nodes[from_id.index()].links_out.push(link_id);
        Ok(link_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Consume the builder and produce a [`Network`].
    pub fn build(self) -> Network {
        let mut bbox = BoundingBox::empty();
        for node in &self.nodes {
            bbox.include(node.phys);
        }
        Network {
            nodes: self.nodes,
            links: self.links,
            node_ids: self.node_ids,
            link_ids: self.link_ids,
            bbox,
        }
    }

    fn resolve(&self, node: &str) -> NetResult<NodeId> {
        self.node_ids
            .get(node)
            .copied()
            .ok_or_else(|| NetError::UnknownNode(node.to_owned()))
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
