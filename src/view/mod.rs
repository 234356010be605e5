//! View & Partition Table Module
//!
//! The authoritative mapping of node address to partition id, and everything
//! derived from it: replica sets, partition counts, and each node's fixed
//! index into the vector clocks of its partition.
//!
//! ## Invariants
//! - A joining node is assigned `floor(|view| / K)` where `|view|` is the
//!   size before the join; removals never renumber, so the surviving ids
//!   may have gaps and consumers must draw from `partition_ids`, not
//!   `0..partition_count`.
//! - A partition holds at most K nodes; the last partition may be
//!   under-replicated right after a join/leave until rebalanced.
//! - `members_of` sorts lexicographically; that order is the canonical index
//!   basis for vector-clock positions within a partition.
//!
//! Only the rebalancer mutates the table; the router, the store write paths,
//! and the anti-entropy daemon read it.

pub mod handlers;
pub mod protocol;
pub mod table;
