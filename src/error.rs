//! Error types.
//!
//! The core treats malformed-but-routine input (unknown points, missing
//! registrations) as silent no-ops and caller programming bugs as panics;
//! the only `Err` values that flow out of it wrap failures raised by
//! user-registered callbacks.

use thiserror::Error;

/// Errors surfaced by the positioning layer.
#[derive(Debug, Error)]
pub enum PositionError {
    /// A registered pair watcher returned an error from its callback.
    #[error("watched-pair callback failed: {0}")]
    Watcher(#[from] anyhow::Error),
}

/// Errors surfaced by the identity indexer.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// An identity source failed to activate or deactivate.
    #[error("identity source failed: {0}")]
    Source(#[from] anyhow::Error),
}
