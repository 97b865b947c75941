//! Assertion utilities for validating pool state after runs.

use cadence_core::{ChainPool, Host};
use thiserror::Error;

/// Error type for pool validation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolValidationError {
    /// Runs still awaiting a tick
    #[error("{0} runs still in flight")]
    InFlight(usize),

    /// Chains spawned but not returned to the pool
    #[error("{0} chains spawned but never returned")]
    Leaked(u64),

    /// An idle chain still holds queued steps
    #[error("Idle chain holds pending steps")]
    DirtyIdleQueue,

    /// Idle chain count differs from the expected value
    #[error("Idle count mismatch: expected {expected}, got {actual}")]
    IdleCount { expected: usize, actual: usize },
}

/// Asserts that the host has nothing in flight and that every chain spawned
/// from its pool has come back with an empty queue.
pub fn assert_pool_clean(host: &Host) -> Result<(), PoolValidationError> {
    let in_flight = host.in_flight();
    if in_flight > 0 {
        return Err(PoolValidationError::InFlight(in_flight));
    }

    let pool = host.pool();
    let stats = pool.stats();
    // Every chain ever created is idle, discarded or still out.
    let outstanding = stats
        .created
        .saturating_sub(stats.discarded + stats.idle as u64);
    if outstanding > 0 {
        return Err(PoolValidationError::Leaked(outstanding));
    }

    if !pool.idle_queues_empty() {
        return Err(PoolValidationError::DirtyIdleQueue);
    }
    Ok(())
}

/// Asserts the number of idle chains in `pool`
pub fn assert_pool_idle(pool: &ChainPool, expected: usize) -> Result<(), PoolValidationError> {
    let actual = pool.idle_count();
    if actual != expected {
        return Err(PoolValidationError::IdleCount { expected, actual });
    }
    Ok(())
}
