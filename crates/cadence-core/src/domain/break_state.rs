use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Halt flag shared by a root chain and every nested chain it spawns.
///
/// A fresh one is created for each root spawn; nested chains receive a clone
/// of their parent's.
#[derive(Debug, Clone, Default)]
pub struct BreakState {
    requested: Arc<AtomicBool>,
}

impl BreakState {
    /// Create a new, unset break state
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every chain sharing this state to stop at its next step boundary
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether a break has been requested
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Whether both handles refer to the same flag
    pub fn shares_with(&self, other: &BreakState) -> bool {
        Arc::ptr_eq(&self.requested, &other.requested)
    }
}
