//! Process-wide observability setup for stockbook embedders.
//!
//! The engine crates only *emit* `tracing` events (commit and reject points
//! in the movement executor); installing a subscriber is the embedding
//! process's job. Call [`init`] once at startup.

/// Initialize process-wide tracing/logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;
