//! Error types for quarto-yaml-intelligence

use serde::{Deserialize, Serialize};

/// A request the worker could not serve. Sent back to the host as the
/// error variant of a [`Response`](crate::protocol::Response); the worker
/// keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum ProtocolError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Schema model is not initialized")]
    NotInitialized,
}

/// Failure on the host side of the channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No reply in time. Diagnostics are stale; the host should re-request.
    #[error("Request {id} timed out after {timeout_ms}ms")]
    Timeout { id: u64, timeout_ms: u64 },

    #[error("Worker has shut down")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Could not decode worker reply: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
