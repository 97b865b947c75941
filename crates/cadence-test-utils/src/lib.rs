//! Testing utilities for the cadence flow scheduler.
//!
//! A manual frame driver, an ordered event recorder, pool assertions and
//! tracing setup for tests.

pub mod assertions;
pub mod driver;
pub mod recorder;
pub mod util;

pub use assertions::pool::{assert_pool_clean, assert_pool_idle, PoolValidationError};
pub use driver::FrameDriver;
pub use recorder::Recorder;
pub use util::init_test_tracing;
