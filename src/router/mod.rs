//! Write/Read Router Module
//!
//! Decides local-vs-remote handling for client requests.
//!
//! ## Routing Rules
//! - **Read**: serve from the local store on a hit; otherwise fan out a
//!   point-query to every other node in the view concurrently with a short
//!   per-peer timeout, relaying the first hit verbatim.
//! - **Write**: overwrite in place when the key lives here; otherwise probe
//!   the cluster for an existing owner and forward to it, preserving the
//!   single-owner invariant. Genuinely new keys land on a uniformly random
//!   partition — either materialized locally or handed to the first sorted
//!   member of the target partition.
//!
//! Random placement plus broadcast probing trades deterministic lookup for
//! simplicity; it is a known scalability ceiling at the membership sizes
//! this system targets, not something to silently replace with a hash ring.

pub mod handlers;
pub mod protocol;
pub mod service;
