//! Membership Rebalancer Module
//!
//! Executes the join/leave protocol for view-update requests.
//!
//! ## Join
//! Announce `add_node` to every current member, push the full view to the
//! joining node, and, when the join starts a brand-new partition while this
//! node holds a non-trivial number of keys, migrate roughly half of them to
//! the newcomer (deleting moved keys locally and from sibling replicas). The
//! response is delayed briefly so in-flight broadcasts land first.
//!
//! ## Leave
//! Remove the node, broadcast `remove_node` to the remaining members, and,
//! when the departing node was the sole replica of its partition, make it
//! redistribute every key it holds to surviving partitions before the
//! response is returned.
//!
//! Peer broadcasts are best-effort with bounded timeouts; a silent peer never
//! blocks the protocol, and the anti-entropy daemon reconciles stragglers.

pub mod handlers;
pub mod protocol;
pub mod service;

#[cfg(test)]
mod tests;
