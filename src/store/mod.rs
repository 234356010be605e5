//! Local Store Module
//!
//! The per-node key table. Each key maps to a [`record::Record`] carrying the
//! value, its vector clock, and the wall-clock timestamp of the write that
//! produced it.
//!
//! ## Mutation Paths
//! Exactly three callers mutate the table, each serialized per key by the
//! underlying concurrent map:
//! - the client-facing write path (router),
//! - the migration path (rebalancer, keys moved during join/leave),
//! - the anti-entropy merge path (sync daemon).
//!
//! The store does not validate keys; the router and rebalancer enforce the
//! key charset/length rule at their boundaries.

pub mod memory;
pub mod record;
