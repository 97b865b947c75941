//!
//! Cadence Core - deferred step-chain scheduler
//!
//! Callers build a [`FlowChain`] of deferred steps bound to an [`Owner`],
//! start it, and let the [`Host`] drain it one tick at a time. Chains come
//! from a [`ChainPool`] and go back to it when their run ends. Destroying
//! the owner cancels every chain bound to it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - tokens, clock and step queues
pub mod domain;

/// Application layer - host, owners, pool and chains
pub mod application;

/// Configuration
pub mod config;

/// Error types
pub mod error;

// Re-export key types
pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};

pub use application::chain::FlowChain;
pub use application::context::StepContext;
pub use application::handle::{RunHandle, RunOutcome};
pub use application::host::{FinishedRun, Host, TickReport};
pub use application::owner::{Owner, OwnerId};
pub use application::pool::{ChainId, ChainPool, PoolStats};
pub use application::realtime::{drive, drive_until_idle};
pub use application::timing::{yield_tick, YieldTick};

pub use domain::break_state::BreakState;
pub use domain::cancel::CancelToken;
pub use domain::clock::{FrameClock, SharedClock};
pub use domain::step::{Step, StepFuture, StepKind, StepQueue, Work};
