use thiserror::Error;

use crate::arena::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node already disposed: {0}")]
    AlreadyDisposed(NodeId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("cycle detected: {parent} is {node} or one of its descendants")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("config error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
