//! Domain layer - pure values with no external dependencies.
//!
//! This layer contains the core concepts of conditional logging:
//! - Accept/reject statistics snapshots and their transitions
//! - Rate limiter quotas
//! - Suppression summaries
//!
//! All types in this layer are plain values and easily testable.

pub mod quota;
pub mod state;
pub mod summary;
