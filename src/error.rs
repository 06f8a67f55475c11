//! Crate-wide error taxonomy.
//!
//! Mutations either succeed or leave the graph byte-identical to the state
//! before the call; no error leaves partial state behind. Numerical edge
//! cases in the layout simulation are masked by softening/guard rules and
//! never surface here.

use thiserror::Error;

use crate::graph::{EdgeId, NodeId};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the graph model, the join compiler, and the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The target node already has an incoming join; a node has at most one
    /// parent.
    #[error("node {node} already has an incoming join")]
    SecondParent {
        /// Node that would have acquired a second parent.
        node: NodeId,
    },
    /// The edge would close a cycle through the tree.
    #[error("join from {from} to {to} would close a cycle")]
    Cycle {
        /// Source node of the rejected edge.
        from: NodeId,
        /// Target node of the rejected edge.
        to: NodeId,
    },
    /// The graph holds no nodes; there is nothing to lay out or compile.
    #[error("graph has no nodes")]
    EmptyGraph,
    /// An operation referenced a node id that is not present.
    #[error("unknown node {id}")]
    UnknownNode {
        /// The missing node id.
        id: NodeId,
    },
    /// An operation referenced an edge id that is not present.
    #[error("unknown edge {id}")]
    UnknownEdge {
        /// The missing edge id.
        id: EdgeId,
    },
    /// An explicit node id was already taken.
    #[error("node id {id} is already in use")]
    DuplicateIdentity {
        /// The colliding node id.
        id: NodeId,
    },
}

impl GraphError {
    /// Returns a machine-readable code for the error variant.
    ///
    /// Both tree-invariant breaches share one code so callers can treat them
    /// uniformly, as do the two identity-lookup failures.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::SecondParent { .. } | GraphError::Cycle { .. } => "InvariantViolation",
            GraphError::EmptyGraph => "EmptyGraph",
            GraphError::UnknownNode { .. } | GraphError::UnknownEdge { .. } => "UnknownIdentity",
            GraphError::DuplicateIdentity { .. } => "DuplicateIdentity",
        }
    }
}
