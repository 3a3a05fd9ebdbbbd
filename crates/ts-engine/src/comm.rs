//! The message-passing substrate between workers.
//!
//! The engine only ever talks to its peers through two collectives, both
//! executed by *every* worker at the same point of the tick:
//!
//! - [`Communicator::all_gather`] — everyone contributes one value, everyone
//!   receives all of them (rank-ordered).  Sum-reductions are derived from
//!   this.
//! - [`Communicator::all_to_all`] — everyone contributes one batch per
//!   destination, everyone receives one batch per source.  This is the
//!   migration exchange, and its completion is the implicit end-of-tick
//!   barrier.
//!
//! The substrate is assumed reliable and in-order per peer; a closed or
//! silent channel is a fatal [`EngineError::Migration`] — there is no retry
//! logic.
//!
//! Two transports are provided: [`SoloComm`] for a world of one (tests,
//! single-worker runs) and [`ThreadComm`] for in-process workers connected
//! by `std::sync::mpsc` channels.  An MPI-style process transport would
//! implement the same four methods.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::{EngineError, EngineResult};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Collective communication between the workers of one run.
///
/// Implementations must deliver messages reliably and in order per sender;
/// the engine calls collectives in lockstep on every rank, so each
/// collective consumes exactly one message per peer.
pub trait Communicator: Send {
    /// This worker's rank in `0..world_size`.
    fn rank(&self) -> u32;

    /// Total number of workers.
    fn world_size(&self) -> u32;

    /// Contribute `value`; receive every rank's contribution, indexed by
    /// rank.
    fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> EngineResult<Vec<T>>;

    /// Send `outgoing[r]` to rank r; receive one batch per source rank,
    /// indexed by source.  `outgoing` must have exactly `world_size`
    /// entries.
    fn all_to_all<T: Send + 'static>(&self, outgoing: Vec<Vec<T>>) -> EngineResult<Vec<Vec<T>>>;
}

/// Sum a `u64` across all workers.
pub fn sum_all<C: Communicator>(comm: &C, value: u64) -> EngineResult<u64> {
    Ok(comm.all_gather(value)?.into_iter().sum())
}

// ── SoloComm ──────────────────────────────────────────────────────────────────

/// The trivial communicator for a world of one worker.
pub struct SoloComm;

impl Communicator for SoloComm {
    fn rank(&self) -> u32 {
        0
    }

    fn world_size(&self) -> u32 {
        1
    }

    fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> EngineResult<Vec<T>> {
        Ok(vec![value])
    }

    fn all_to_all<T: Send + 'static>(&self, outgoing: Vec<Vec<T>>) -> EngineResult<Vec<Vec<T>>> {
        if outgoing.len() != 1 {
            return Err(EngineError::Config(format!(
                "all_to_all expects 1 batch in a world of 1, got {}",
                outgoing.len()
            )));
        }
        Ok(outgoing)
    }
}

// ── ThreadComm ────────────────────────────────────────────────────────────────

type Payload = Box<dyn Any + Send>;

/// How long a collective waits for a peer before declaring the run dead.
const PEER_TIMEOUT: Duration = Duration::from_secs(30);

/// In-process transport: one endpoint per worker thread, connected by mpsc
/// channels.
///
/// Each endpoint owns a single inbox; messages are tagged with their source
/// rank and parked in per-source reorder buffers, so a collective can wait
/// for "the next message from rank r" while later messages from other ranks
/// queue up behind it.  mpsc channels preserve per-sender order, which is
/// all the lockstep collectives need.
pub struct ThreadComm {
    rank: u32,
    world: u32,
    senders: Vec<Sender<(u32, Payload)>>,
    inbox: Receiver<(u32, Payload)>,
    pending: RefCell<Vec<VecDeque<Payload>>>,
}

impl ThreadComm {
    /// Create one connected endpoint per rank.  Endpoint i is moved into
    /// worker thread i.
    pub fn create(world: u32) -> Vec<ThreadComm> {
        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..world).map(|_| channel()).unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank: rank as u32,
                world,
                senders: senders.clone(),
                inbox,
                pending: RefCell::new((0..world).map(|_| VecDeque::new()).collect()),
            })
            .collect()
    }

    fn send_to(&self, dest: u32, payload: Payload) -> EngineResult<()> {
        self.senders[dest as usize]
            .send((self.rank, payload))
            .map_err(|_| EngineError::Migration(format!("worker {dest} is gone")))
    }

    /// Next payload from `source`, draining the inbox into the reorder
    /// buffers as needed.
    fn recv_from(&self, source: u32) -> EngineResult<Payload> {
        loop {
            if let Some(payload) = self.pending.borrow_mut()[source as usize].pop_front() {
                return Ok(payload);
            }
            match self.inbox.recv_timeout(PEER_TIMEOUT) {
                Ok((from, payload)) => {
                    self.pending.borrow_mut()[from as usize].push_back(payload);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Migration(format!(
                        "timed out waiting for worker {source}"
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Migration("all peer workers are gone".into()));
                }
            }
        }
    }

    fn downcast<T: 'static>(payload: Payload) -> EngineResult<T> {
        payload
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| EngineError::Migration("collective type mismatch between workers".into()))
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world
    }

    fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> EngineResult<Vec<T>> {
        for dest in 0..self.world {
            if dest != self.rank {
                self.send_to(dest, Box::new(value.clone()))?;
            }
        }
        let mut gathered = Vec::with_capacity(self.world as usize);
        for source in 0..self.world {
            if source == self.rank {
                gathered.push(value.clone());
            } else {
                gathered.push(Self::downcast::<T>(self.recv_from(source)?)?);
            }
        }
        Ok(gathered)
    }

    fn all_to_all<T: Send + 'static>(&self, outgoing: Vec<Vec<T>>) -> EngineResult<Vec<Vec<T>>> {
        if outgoing.len() != self.world as usize {
            return Err(EngineError::Config(format!(
                "all_to_all expects {} batches, got {}",
                self.world,
                outgoing.len()
            )));
        }
        let mut own_batch = None;
        for (dest, batch) in outgoing.into_iter().enumerate() {
            if dest as u32 == self.rank {
                own_batch = Some(batch);
            } else {
                self.send_to(dest as u32, Box::new(batch))?;
            }
        }
        let mut received = Vec::with_capacity(self.world as usize);
        for source in 0..self.world {
            if source == self.rank {
                received.push(own_batch.take().unwrap_or_default());
            } else {
                received.push(Self::downcast::<Vec<T>>(self.recv_from(source)?)?);
            }
        }
        Ok(received)
    }
}
