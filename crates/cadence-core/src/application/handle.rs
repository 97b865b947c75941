use futures::task::AtomicWaker;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::application::pool::ChainId;
use crate::domain::cancel::CancelToken;
use crate::error::{FlowError, FlowResult};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue was drained
    Completed,
    /// A break was requested somewhere in the chain tree
    Broken,
    /// The owner or the run was cancelled
    Cancelled,
    /// A step reported a failure
    Faulted(FlowError),
}

impl RunOutcome {
    pub(crate) fn from_error(err: FlowError) -> Self {
        if err.is_cancellation() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Faulted(err)
        }
    }

    /// Translate a nested chain's outcome into its parent step's result.
    ///
    /// A break is not an error for the parent: it observes the shared flag
    /// at its own next boundary.
    pub(crate) fn into_step_result(self) -> FlowResult<()> {
        match self {
            RunOutcome::Completed | RunOutcome::Broken => Ok(()),
            RunOutcome::Cancelled => Err(FlowError::Cancelled),
            RunOutcome::Faulted(err) => Err(err),
        }
    }

    /// Whether the run ended with a fault
    pub fn is_fault(&self) -> bool {
        matches!(self, RunOutcome::Faulted(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Broken => f.write_str("broken"),
            RunOutcome::Cancelled => f.write_str("cancelled"),
            RunOutcome::Faulted(err) => write!(f, "faulted: {}", err),
        }
    }
}

#[derive(Default)]
pub(crate) struct RunState {
    outcome: Mutex<Option<RunOutcome>>,
    waker: AtomicWaker,
}

impl RunState {
    pub(crate) fn complete(&self, outcome: RunOutcome) {
        *self.outcome.lock() = Some(outcome);
        self.waker.wake();
    }

    fn abandon(&self) {
        let mut outcome = self.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(RunOutcome::Cancelled);
            drop(outcome);
            self.waker.wake();
        }
    }
}

/// Completes a run's state when the run future goes away.
///
/// A run future dropped before it finishes (its host dropped, or a panic
/// unwinding through its poll) leaves the handle `Cancelled`.
pub(crate) struct RunCompletion {
    state: Arc<RunState>,
}

impl RunCompletion {
    pub(crate) fn new(state: Arc<RunState>) -> Self {
        Self { state }
    }

    pub(crate) fn finish(&self, outcome: RunOutcome) {
        self.state.complete(outcome);
    }
}

impl Drop for RunCompletion {
    fn drop(&mut self) {
        self.state.abandon();
    }
}

/// Handle to a launched run.
///
/// Dropping it does not affect the run. Awaiting it yields the outcome once
/// the chain has been returned to its pool.
#[derive(Clone)]
pub struct RunHandle {
    chain: ChainId,
    cancel: CancelToken,
    state: Arc<RunState>,
}

impl RunHandle {
    pub(crate) fn new(chain: ChainId, cancel: CancelToken) -> Self {
        Self {
            chain,
            cancel,
            state: Arc::new(RunState::default()),
        }
    }

    pub(crate) fn state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    /// Pooled chain executing this run
    pub fn chain_id(&self) -> ChainId {
        self.chain
    }

    /// Cancel this run and its nested chains; the owner stays alive
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the run has ended
    pub fn is_finished(&self) -> bool {
        self.state.outcome.lock().is_some()
    }

    /// Outcome, once the run has ended
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.state.outcome.lock().clone()
    }
}

impl Future for RunHandle {
    type Output = RunOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.state.waker.register(cx.waker());
        match self.state.outcome.lock().clone() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("chain", &self.chain)
            .field("outcome", &self.outcome())
            .finish()
    }
}
