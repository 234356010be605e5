//! Causal Payload Engine
//!
//! Vector clocks establish causality between writes to the same key across
//! replicas of a partition. Each clock has one counter per replica slot
//! (length = replication factor K); a node may only increment the counter at
//! its own position, which is its index in the lexicographically sorted
//! membership of its partition.
//!
//! ## Core Operations
//! - **Increment**: bump a single position after a local write.
//! - **Merge**: pointwise maximum, used when reconciling replicas.
//! - **Compare**: strict partial order (`Dominates` / `Dominated` /
//!   `Concurrent`). Equal clocks are `Concurrent` by construction; the tie is
//!   broken elsewhere by wall-clock timestamp.
//!
//! On the wire a clock travels as a dot-delimited integer sequence
//! (e.g. `"2.0.1"`), the `causal_payload` parameter of the client API.

pub mod vector;
