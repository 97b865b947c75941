/// Owners and their identifiers
pub mod owner;

/// Host tick loop
pub mod host;

/// Chain reuse pool
pub mod pool;

/// Fluent builder and drain loop
pub mod chain;

/// Per-step execution context
pub mod context;

/// Run handles and outcomes
pub mod handle;

/// Suspending primitives shared by the built-in steps
pub mod timing;

/// Tokio-driven host ticking
pub mod realtime;
