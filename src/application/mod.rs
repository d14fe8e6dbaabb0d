//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates evaluation and keeps the runtime state:
//! - Context (lock-free per-conditional statistics)
//! - Conditional engine and its builder
//! - Registries (conditionals per identifier, rate limiters per name)
//! - Metrics and summary emission
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod conditional;
pub mod context;
pub mod emitter;
pub mod filter_result;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod registry;
