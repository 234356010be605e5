//! Distributed Key-Value Store Library
//!
//! This library crate defines the core modules of a partition-aware,
//! causally-consistent key-value store. It is the foundation for the node
//! binary (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`clock`**: Vector-clock algebra (creation, increment, merge, partial-order
//!   comparison) and the dot-delimited causal payload wire format.
//! - **`store`**: The per-node key table. Maps keys to records carrying a value,
//!   a vector clock, and a last-writer-wins timestamp.
//! - **`view`**: Cluster membership and partition assignment. Maps node addresses
//!   to contiguous partition ids and derives replica sets and clock positions.
//! - **`router`**: Client-facing read/write routing. Serves locally when possible,
//!   otherwise probes and forwards to the rest of the cluster.
//! - **`rebalance`**: The join/leave protocol, including key migration when a
//!   join starts a new partition or a partition loses its last replica.
//! - **`sync`**: The anti-entropy daemon. Periodically pushes the local store to
//!   partition mates and merges incoming snapshots by causal dominance.

pub mod clock;
pub mod config;
pub mod error;
pub mod rebalance;
pub mod router;
pub mod server;
pub mod store;
pub mod sync;
pub mod view;
