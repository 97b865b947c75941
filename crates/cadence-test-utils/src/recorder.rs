//! Ordered, thread-safe log of events fired by chain callbacks.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared event log; clones append to the same list
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Callback that records `event` when invoked, for `FlowChain::call`
    pub fn hook(&self, event: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let recorder = self.clone();
        let event = event.into();
        move || recorder.record(event)
    }

    /// Reusable callback for loop bodies
    pub fn hook_fn(&self, event: impl Into<String>) -> impl Fn() + Send + Sync + 'static {
        let recorder = self.clone();
        let event = event.into();
        move || recorder.record(event.clone())
    }

    /// Copy of the events in recording order
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// How many times `event` was recorded
    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget every recorded event
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
