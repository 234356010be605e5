//! View-Update Wire Protocol
//!
//! DTOs for the membership endpoints: the client-facing `view_update` and
//! the peer-to-peer `add_node` / `remove_node` / `accept_view` / `send_data`
//! calls. The `accept_view` body is the full address -> partition-id map in
//! JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewUpdateParams {
    /// `"add"` or `"remove"`.
    #[serde(rename = "type")]
    pub update_type: String,
    pub ip_port: String,
}

/// Parameters of the peer-to-peer `add_node` / `remove_node` broadcasts.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeParams {
    pub ip_port: String,
}

/// Sent to a departing sole-replica node; `ip_port` names the coordinator
/// that is waiting for the redistribution to finish.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendDataParams {
    pub ip_port: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewUpdateResponse {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_partitions: Option<u32>,
}

impl ViewUpdateResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            msg: "error".to_string(),
            error: Some(message.into()),
            partition_id: None,
            number_of_partitions: None,
        }
    }
}

/// Plain acknowledgment for the peer-to-peer view mutations.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub msg: String,
}

impl AckResponse {
    pub fn success() -> Self {
        Self {
            msg: "success".to_string(),
        }
    }
}
