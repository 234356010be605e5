//! Key-Value Wire Protocol
//!
//! DTOs for the client-facing `/kvs` surface and the internal point
//! operations (`get_key`, `add_key`, `remove_key`) used for ownership
//! probing and migration. Requests travel as query-string parameters, as in
//! the original protocol; responses are JSON envelopes.

use serde::{Deserialize, Serialize};

use crate::store::record::Record;

/// Query parameters accepted by `/kvs` and the internal point operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct KvParams {
    pub key: Option<String>,
    pub value: Option<String>,
    pub causal_payload: Option<String>,
}

/// JSON envelope for reads, writes, and relayed point operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvResponse {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causal_payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced: Option<bool>,
}

impl KvResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            msg: "error".to_string(),
            error: Some(message.into()),
            value: None,
            partition_id: None,
            causal_payload: None,
            timestamp: None,
            replaced: None,
        }
    }

    pub fn success() -> Self {
        Self {
            msg: "success".to_string(),
            error: None,
            value: None,
            partition_id: None,
            causal_payload: None,
            timestamp: None,
            replaced: None,
        }
    }

    /// Read response: the record's value plus its causal context.
    pub fn read(partition_id: u32, record: &Record) -> Self {
        Self {
            value: Some(record.value.clone()),
            partition_id: Some(partition_id),
            causal_payload: Some(record.clock.to_string()),
            timestamp: Some(record.timestamp),
            ..Self::success()
        }
    }

    /// Write response: the causal context of the stored record and whether an
    /// existing record was replaced.
    pub fn written(partition_id: u32, record: &Record, replaced: bool) -> Self {
        Self {
            partition_id: Some(partition_id),
            causal_payload: Some(record.clock.to_string()),
            timestamp: Some(record.timestamp),
            replaced: Some(replaced),
            ..Self::success()
        }
    }
}

/// Outcome of a routed operation: the response body plus whether the write
/// created a new key (drives 201 vs 200 at the transport layer).
#[derive(Debug, Clone)]
pub struct KvReply {
    pub created: bool,
    pub body: KvResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyCountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalKeyCountResponse {
    pub total: usize,
}
