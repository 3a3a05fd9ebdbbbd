//! Engine error type.
//!
//! Planner and heap failures bubble up unchanged (via `NetError`) and abort
//! the run: a reroute that fails mid-transition would leave the agent in an
//! inconsistent state, so there is nothing sensible to recover to.

use thiserror::Error;

use ts_core::{AgentId, NodeId};
use ts_net::NetError;

/// Errors produced by `ts-engine`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine configuration error: {0}")]
    Config(String),

    #[error("planner failure: {0}")]
    Net(#[from] NetError),

    #[error("agent {agent} in inconsistent state: {what}")]
    AgentState { agent: AgentId, what: &'static str },

    #[error("node {0} has no owning worker")]
    UnknownOwner(NodeId),

    #[error("migration failure: {0}")]
    Migration(String),
}

/// Shorthand result type for `ts-engine`.
pub type EngineResult<T> = Result<T, EngineError>;
