//! Request-Scoped Error Taxonomy
//!
//! Every condition here is recoverable and scoped to a single request;
//! nothing in the core is fatal to the process. Terminal errors
//! (`InvalidKey`, `NoValuePresent`, `KeyNotFound`, `NodeNotFound`) surface
//! verbatim to the client. `PeerUnreachable` is recovered where possible
//! (try the next candidate, or swallow for best-effort broadcasts) and only
//! surfaces when a required forward target cannot be reached.

use axum::http::StatusCode;
use thiserror::Error;

use crate::clock::vector::ClockError;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("Key not valid")]
    InvalidKey,

    #[error("No value provided")]
    NoValuePresent,

    #[error("key does not exist")]
    KeyNotFound,

    #[error("node does not exist")]
    NodeNotFound,

    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    #[error(transparent)]
    Clock(#[from] ClockError),
}

impl KvError {
    /// HTTP status the transport layer maps this error to.
    pub fn status(&self) -> StatusCode {
        match self {
            KvError::PeerUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::NOT_FOUND,
        }
    }
}
