//! Error types for blacklist-core

use std::time::Duration;

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Failure of a single remote operation (storage read or view call)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("node error: {0}")]
    Remote(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PortError {
    /// Whether a retry may succeed (network hiccups, not node-side rejections)
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection(_) | PortError::Timeout(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot reach {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: PortError,
    },

    #[error("Length read at slot {slot:#x} failed: {source}")]
    LengthRead {
        slot: U256,
        #[source]
        source: PortError,
    },

    #[error("Element read at offset {offset} (slot {slot:#x}) failed: {source}")]
    ElementRead {
        offset: u64,
        slot: U256,
        #[source]
        source: PortError,
    },

    #[error("Enrichment call for {address} failed: {source}")]
    Enrichment {
        address: Address,
        #[source]
        source: PortError,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Pipeline deadline of {0:?} exceeded")]
    Deadline(Duration),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
