//! The `Engine` struct and its tick loop.

use std::collections::{BTreeMap, HashMap};

use ts_agent::{Agent, AgentPackage, Strategy, Trip};
use ts_core::{AgentId, LinkId, NodeId, SimParams, WorkerRng};
use ts_net::{planner, CostMetric, Network, PathCache};

use crate::comm::{sum_all, Communicator};
use crate::report::{LinkSeriesRow, MoveRow, SimReport};
use crate::stats::{MoveRecord, TickAggregates, TickObserver};
use crate::{EngineError, EngineResult, StripBounds};

/// Simulated seconds per tick.
const TICK_SECONDS: f64 = 1.0;

/// Cadence of the global termination check, in ticks.
const STOP_CHECK_INTERVAL: u64 = 100;

/// One worker's simulation engine.
///
/// `Engine<C>` owns this partition's slice of the world: the local agents,
/// the occupancy counters of the links whose origin nodes it owns, and the
/// recording state.  The communicator `C` is the only connection to the
/// other workers; swap it at compile time for a different transport with no
/// runtime overhead.
pub struct Engine<C: Communicator> {
    comm: C,
    pub(crate) params: SimParams,
    pub(crate) network: Network,
    bounds: StripBounds,

    /// Local agents, keyed by id.  BTreeMap iteration gives the strict
    /// local-id processing order the tick loop guarantees.
    pub(crate) agents: BTreeMap<AgentId, Agent>,

    /// Memoised initial-path queries.
    cache: PathCache,

    /// Complete node → owning-worker map, built once at init.
    node_owner: HashMap<NodeId, u32>,

    /// Agents that left local bounds this tick, with their new worker.
    pending_moves: BTreeMap<AgentId, u32>,

    // ── Clock ─────────────────────────────────────────────────────────────
    pub(crate) time: f64,
    pub(crate) tick: u64,

    // ── Counters ──────────────────────────────────────────────────────────
    pub(crate) moving: i64,
    pub(crate) trips_performed: u64,
    pub(crate) rerouting: u64,

    // ── Recording ─────────────────────────────────────────────────────────
    sim_series: Vec<TickAggregates>,
    start_times: Vec<f64>,
    fitness: BTreeMap<AgentId, f64>,
    link_loads: HashMap<LinkId, Vec<u32>>,
    link_snapshots: HashMap<LinkId, Vec<u32>>,
    pub(crate) moves: Vec<MoveRecord>,
}

impl<C: Communicator> Engine<C> {
    // ── Construction ──────────────────────────────────────────────────────

    /// Build an engine for one worker.
    ///
    /// Shuffles the network's partitioning coordinates for this world size;
    /// every worker computes the identical assignment, so the ownership map
    /// agrees across the run.
    pub fn new(comm: C, params: SimParams, mut network: Network) -> EngineResult<Self> {
        params.validate().map_err(|e| EngineError::Config(e.to_string()))?;
        if params.world_size() != comm.world_size() {
            return Err(EngineError::Config(format!(
                "process grid {}x{} does not match world size {}",
                params.proc_x,
                params.proc_y,
                comm.world_size()
            )));
        }
        network.shuffle_coordinates(comm.world_size());
        let bounds = StripBounds::new(comm.rank());
        Ok(Self {
            comm,
            params,
            network,
            bounds,
            agents: BTreeMap::new(),
            cache: PathCache::new(),
            node_owner: HashMap::new(),
            pending_moves: BTreeMap::new(),
            time: 0.0,
            tick: 0,
            moving: 0,
            trips_performed: 0,
            rerouting: 0,
            sim_series: Vec::new(),
            start_times: Vec::new(),
            fitness: BTreeMap::new(),
            link_loads: HashMap::new(),
            link_snapshots: HashMap::new(),
            moves: Vec::new(),
        })
    }

    /// Populate the partition from the trip catalog and wire up the run.
    ///
    /// Every worker receives the full catalog and keeps the agents whose
    /// first trip starts on a node it owns.  Initial paths are planned with
    /// A* through the memoising cache; the strategy catalog is sampled with
    /// the rank-seeded RNG so runs are reproducible.
    ///
    /// This is a collective call: all workers must reach it together (the
    /// node-ownership exchange is an all-gather).
    pub fn init(
        &mut self,
        catalog: &[(AgentId, Vec<Trip>)],
        strategies: &[Strategy],
    ) -> EngineResult<()> {
        let rank = self.comm.rank();

        // ── Local agents from the catalog ─────────────────────────────────
        for (id, trips) in catalog {
            let Some(first) = trips.first() else { continue };
            let origin = self.network.node(first.origin);
            if !self.bounds.contains(origin.pos.x, origin.pos.y) {
                continue;
            }
            let mut agent = Agent::new(*id, rank, trips.clone());
            agent.x = origin.pos.x;
            agent.y = origin.pos.y;
            self.agents.insert(*id, agent);
        }

        // ── Initial paths ─────────────────────────────────────────────────
        for agent in self.agents.values_mut() {
            let trip = match agent.trips.front() {
                Some(trip) => *trip,
                None => continue,
            };
            let path = self.cache.get_or_compute(
                &self.network,
                trip.origin,
                trip.destination,
                CostMetric::FreeFlowTime,
            )?;
            agent.path = path.links;
        }

        // ── Strategies ────────────────────────────────────────────────────
        let mut rng = WorkerRng::for_rank(rank);
        for agent in self.agents.values_mut() {
            let draw = rng.uniform();
            if draw < self.params.prop_strategic_agents && !strategies.is_empty() {
                agent.strategy = strategies[rng.gen_range(0..strategies.len())];
            }
        }

        // ── Node-ownership map (collective) ───────────────────────────────
        let local: Vec<(NodeId, u32)> = self
            .network
            .nodes()
            .filter(|(_, n)| self.bounds.contains(n.pos.x, n.pos.y))
            .map(|(id, _)| (id, rank))
            .collect();
        for chunk in self.comm.all_gather(local)? {
            self.node_owner.extend(chunk);
        }

        // ── Recording series for owned links ──────────────────────────────
        let n_buckets = self.params.aggregate_buckets();
        let n_slots = self.params.snapshot_slots();
        for (lid, link) in self.network.links() {
            let origin = self.network.node(link.from);
            if self.bounds.contains(origin.pos.x, origin.pos.y) {
                self.link_loads.insert(lid, vec![0; n_buckets]);
                self.link_snapshots.insert(lid, vec![0; n_slots]);
            }
        }

        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn rank(&self) -> u32 {
        self.comm.rank()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of agents currently owned by this worker.
    pub fn local_agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// This worker's aggregate counters as of the last completed tick.
    pub fn local_aggregates(&self) -> TickAggregates {
        TickAggregates {
            time: self.time,
            total_agents: self.agents.len() as u64,
            total_moving: self.moving,
            total_trips_performed: self.trips_performed,
            total_rerouting: self.rerouting,
        }
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run until the global agent count reaches zero (checked every
    /// [`STOP_CHECK_INTERVAL`] ticks), or until `max_ticks` if given.
    ///
    /// Collective: every worker must call `run` with the same `max_ticks`.
    pub fn run(
        &mut self,
        observer: &mut dyn TickObserver,
        max_ticks: Option<u64>,
    ) -> EngineResult<()> {
        loop {
            self.step()?;
            observer.on_tick_end(self.tick, &self.local_aggregates());

            if self.tick % STOP_CHECK_INTERVAL == 0 {
                let remaining = sum_all(&self.comm, self.agents.len() as u64)?;
                observer.on_progress(self.tick, self.time, remaining);
                if remaining == 0 {
                    break;
                }
            }
            if let Some(cap) = max_ticks {
                if self.tick >= cap {
                    break;
                }
            }
        }
        observer.on_stop(self.tick);
        Ok(())
    }

    /// Advance the simulation by one tick.
    ///
    /// Collective: ends with the migration exchange, which doubles as the
    /// end-of-tick barrier.
    pub fn step(&mut self) -> EngineResult<()> {
        self.pending_moves.clear();
        self.time += TICK_SECONDS;
        self.tick += 1;

        let bucket = ((self.time / (60.0 * self.params.record_interval_aggregate as f64)).floor()
            as usize)
            % self.params.aggregate_buckets();

        // ── Walk local agents in id order ─────────────────────────────────
        let ids: Vec<AgentId> = self.agents.keys().copied().collect();
        let mut retired: Vec<AgentId> = Vec::new();

        for id in ids {
            let Some(agent) = self.agents.get_mut(&id) else { continue };

            agent.decrease_remaining_time(TICK_SECONDS);
            if agent.remaining_time > self.params.time_tolerance {
                continue;
            }

            if agent.at_node {
                // ── start-of-trip ─────────────────────────────────────────
                if !agent.en_route {
                    agent.en_route = true;
                    self.moving += 1;
                    self.start_times.push(self.time);
                }

                // ── depart-node ───────────────────────────────────────────
                agent.at_node = false;
                let mut next = agent.next_link_and_remove().ok_or(EngineError::AgentState {
                    agent: id,
                    what: "path exhausted at depart-node",
                })?;

                if agent.wants_reroute(&self.network, next, self.time) {
                    self.rerouting += 1;
                    let here = self.network.link(next).from;
                    if self.network.out_degree(here) > 1 {
                        let destination = agent
                            .current_trip()
                            .ok_or(EngineError::AgentState { agent: id, what: "en route without a trip" })?
                            .destination;
                        let new_path = planner::astar_avoiding(
                            &mut self.network,
                            here,
                            destination,
                            next,
                            CostMetric::FreeFlowTime,
                        )?;
                        agent.path = new_path.links;
                        next = agent.next_link_and_remove().ok_or(EngineError::AgentState {
                            agent: id,
                            what: "reroute produced an empty path",
                        })?;
                    }
                }

                agent.cur_link = Some(next);
                self.network.increment_occupancy(next);
                let link = self.network.link(next);
                agent.trip_duration_theo += link.free_flow_time;
                agent.remaining_time = link.travel_time();

                if let Some(series) = self.link_loads.get_mut(&next) {
                    series[bucket] += 1;
                }
                self.moves.push(MoveRecord {
                    agent: id,
                    link: next,
                    entered_at: self.time,
                    time_on_link: agent.remaining_time,
                    path_idx: agent.n_paths,
                    link_idx: agent.n_link_in_path,
                });
            } else {
                // ── arrive-node ───────────────────────────────────────────
                let done_link = agent.cur_link.ok_or(EngineError::AgentState {
                    agent: id,
                    what: "traversing without a current link",
                })?;

                if !agent.path.is_empty() {
                    // Intermediate node: stop there for zero time.
                    self.network.decrement_occupancy(done_link);
                    let node_id = self.network.link(done_link).to;
                    let node = self.network.node(node_id);
                    agent.x = node.pos.x;
                    agent.y = node.pos.y;
                    agent.at_node = true;

                    if !self.bounds.contains(agent.x, agent.y) {
                        let owner = *self
                            .node_owner
                            .get(&node_id)
                            .ok_or(EngineError::UnknownOwner(node_id))?;
                        self.pending_moves.insert(id, owner);
                    }
                } else {
                    // ── end-of-trip ───────────────────────────────────────
                    let trip = *agent.current_trip().ok_or(EngineError::AgentState {
                        agent: id,
                        what: "finished a trip it never had",
                    })?;

                    let realised = self.time - trip.start_time;
                    let sample = agent.trip_duration_theo / realised;
                    self.fitness
                        .entry(id)
                        .and_modify(|f| *f = (*f + sample) * 0.5)
                        .or_insert(sample);

                    self.trips_performed += 1;
                    self.moving -= 1;
                    self.network.decrement_occupancy(done_link);

                    if agent.trips.len() > 1 {
                        agent.trips.pop_front();
                        let next_trip = *agent.current_trip().ok_or(EngineError::AgentState {
                            agent: id,
                            what: "trip list shrank unexpectedly",
                        })?;
                        let path = planner::shortest_path(
                            &self.network,
                            next_trip.origin,
                            next_trip.destination,
                            CostMetric::FreeFlowTime,
                        )?;
                        let origin_pos = self.network.node(next_trip.origin).pos;
                        agent.install_next_trip(path.links, origin_pos, self.time);

                        if !self.bounds.contains(agent.x, agent.y) {
                            let owner = *self
                                .node_owner
                                .get(&next_trip.origin)
                                .ok_or(EngineError::UnknownOwner(next_trip.origin))?;
                            self.pending_moves.insert(id, owner);
                        }
                    } else {
                        retired.push(id);
                    }
                }
            }
        }

        for id in retired {
            self.agents.remove(&id);
        }

        // ── Snapshot of en-route agents ───────────────────────────────────
        let whole_secs = self.time.floor() as u64;
        let snap_period = self.params.record_interval_snapshot as u64 * 60;
        if whole_secs % snap_period == 0 {
            let slot = ((whole_secs / snap_period) as usize) % self.params.snapshot_slots();
            for agent in self.agents.values() {
                if agent.en_route {
                    if let Some(link) = agent.cur_link {
                        if let Some(series) = self.link_snapshots.get_mut(&link) {
                            series[slot] += 1;
                        }
                    }
                }
            }
        }

        // ── Aggregate row + migration exchange ────────────────────────────
        self.sim_series.push(self.local_aggregates());
        self.synchronize()
    }

    /// Ship staged agents to their new workers and adopt arrivals.
    fn synchronize(&mut self) -> EngineResult<()> {
        let world = self.comm.world_size() as usize;
        let mut outgoing: Vec<Vec<AgentPackage>> = vec![Vec::new(); world];
        for (&id, &dest) in &self.pending_moves {
            let agent = self.agents.get(&id).ok_or(EngineError::AgentState {
                agent: id,
                what: "staged for migration but not local",
            })?;
            outgoing[dest as usize].push(AgentPackage::for_destination(agent, dest));
        }

        let staged: Vec<AgentId> = self.pending_moves.keys().copied().collect();
        for id in staged {
            self.agents.remove(&id);
        }

        let incoming = self.comm.all_to_all(outgoing)?;
        for batch in incoming {
            for package in batch {
                let agent: Agent = package.into();
                self.agents.insert(agent.id, agent);
            }
        }
        Ok(())
    }

    // ── End-of-run reporting ──────────────────────────────────────────────

    /// Gather the run's outputs.  Collective: all workers must call this
    /// together; rank 0 receives the merged data.
    pub fn finish(self) -> EngineResult<SimReport> {
        let rank = self.comm.rank();
        let root = rank == 0;

        // Per-tick aggregates: element-wise sum of every worker's rows.
        let series_per_rank = self.comm.all_gather(self.sim_series)?;
        let sim_series = if root {
            let mut merged: Vec<TickAggregates> = Vec::new();
            for series in series_per_rank {
                if merged.is_empty() {
                    merged = series;
                } else {
                    for (row, local) in merged.iter_mut().zip(series) {
                        *row = row.merge(local);
                    }
                }
            }
            merged
        } else {
            Vec::new()
        };

        // Trip start times, globally sorted.
        let times_per_rank = self.comm.all_gather(self.start_times)?;
        let starting_times = if root {
            let mut all: Vec<f64> = times_per_rank.into_iter().flatten().collect();
            all.sort_by(f64::total_cmp);
            all
        } else {
            Vec::new()
        };

        // Final fitness, sorted by agent id.
        let local_fitness: Vec<(u64, f64)> =
            self.fitness.iter().map(|(id, f)| (id.0, *f)).collect();
        let fitness_per_rank = self.comm.all_gather(local_fitness)?;
        let fitness = if root {
            let mut all: Vec<(u64, f64)> = fitness_per_rank.into_iter().flatten().collect();
            all.sort_by_key(|(id, _)| *id);
            all
        } else {
            Vec::new()
        };

        // Per-link series, resolved to string ids and sorted for stable
        // output within each worker's block.
        let to_rows = |series: &HashMap<LinkId, Vec<u32>>| -> Vec<LinkSeriesRow> {
            let mut rows: Vec<LinkSeriesRow> = series
                .iter()
                .map(|(lid, counts)| {
                    let link = self.network.link(*lid);
                    LinkSeriesRow {
                        link: link.id.clone(),
                        capacity: link.capacity,
                        counts: counts.clone(),
                    }
                })
                .collect();
            rows.sort_by(|a, b| a.link.cmp(&b.link));
            rows
        };
        let loads_per_rank = self.comm.all_gather(to_rows(&self.link_loads))?;
        let snaps_per_rank = self.comm.all_gather(to_rows(&self.link_snapshots))?;
        let (link_loads, link_snapshots) = if root {
            (
                loads_per_rank.into_iter().flatten().collect(),
                snaps_per_rank.into_iter().flatten().collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        // Movement log stays per-worker.
        let moves = self
            .moves
            .iter()
            .map(|m| MoveRow {
                agent: m.agent.0,
                link: self.network.link(m.link).id.clone(),
                entered_at: m.entered_at,
                time_on_link: m.time_on_link,
                path_idx: m.path_idx,
                link_idx: m.link_idx,
            })
            .collect();

        Ok(SimReport {
            rank,
            sim_series,
            starting_times,
            fitness,
            link_loads,
            link_snapshots,
            moves,
        })
    }
}
