//! Partition Introspection Protocol
//!
//! DTOs for the partition-info endpoints used by the rebalancer, operators,
//! and tests. The full-view JSON map (address -> partition id) exchanged by
//! `accept_view` lives in the rebalance protocol.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::table::NodeAddr;

#[derive(Debug, Serialize, Deserialize)]
pub struct PartitionQuery {
    pub partition_id: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartitionMembersResponse {
    pub msg: String,
    pub partition_members: Vec<NodeAddr>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartitionIdResponse {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartitionIdListResponse {
    pub msg: String,
    pub partition_id_list: Vec<u32>,
}

/// Debugging dump of the node's current view.
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewDumpResponse {
    pub current_view: BTreeMap<NodeAddr, u32>,
}
