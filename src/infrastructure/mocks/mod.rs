//! Mock implementations for testing.
//!
//! Test doubles for infrastructure adapters, enabling controlled testing of
//! rate limiting and emission.

pub mod clock;
pub mod layer;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
