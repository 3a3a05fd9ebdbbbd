//! Network and planner error type.

use thiserror::Error;

use ts_core::NodeId;
use ts_heap::HeapError;

/// Errors produced by `ts-net`.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("unknown node id {0:?}")]
    UnknownNode(String),

    #[error("unknown link id {0:?}")]
    UnknownLink(String),

    #[error("duplicate node id {0:?}")]
    DuplicateNode(String),

    #[error("duplicate link id {0:?}")]
    DuplicateLink(String),

    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("heap error during search: {0}")]
    Heap(#[from] HeapError),
}

/// Shorthand result type for `ts-net`.
pub type NetResult<T> = Result<T, NetError>;
