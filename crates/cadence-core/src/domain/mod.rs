/// Hierarchical cancellation tokens
pub mod cancel;

/// Shared halt flag for nested chains
pub mod break_state;

/// Host frame clock
pub mod clock;

/// Steps, step queues and units of work
pub mod step;
