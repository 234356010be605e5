//! Anti-Entropy Module
//!
//! Background reconciliation of replicas within a partition. Every node runs
//! exactly one daemon task: after a short warm-up it loops on a fixed
//! interval, pushing a snapshot of its entire store to each partition mate.
//! The receiver merges per key — adopt when absent, otherwise keep the
//! clock-dominant record, falling back to last-writer-wins on concurrency.
//!
//! Pushes are best-effort: a timeout or error is swallowed and the next tick
//! retries naturally. The daemon never blocks request handling beyond the
//! store's brief per-key locking.

pub mod daemon;
pub mod handlers;

#[cfg(test)]
mod tests;
