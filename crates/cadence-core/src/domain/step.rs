use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;

use crate::application::context::StepContext;
use crate::domain::cancel::CancelToken;
use crate::error::FlowResult;

/// Future produced by a started step or unit of work
pub type StepFuture = BoxFuture<'static, FlowResult<()>>;

type StepFn = Box<dyn FnOnce(StepContext) -> StepFuture + Send>;

type WorkFn = Box<dyn FnOnce(CancelToken) -> StepFuture + Send>;

/// Which builder operation enqueued a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Caller-supplied unit of work
    Play,
    /// Timed suspension
    Wait,
    /// Suspension for a number of host ticks
    WaitFrames,
    /// Per-tick predicate poll
    WaitUntil,
    /// Synchronous callback
    Call,
    /// Concurrent units of work
    Parallel,
    /// Conditional nested chain
    If,
    /// Fixed-count nested chain loop
    Repeat,
    /// Condition-driven nested chain loop
    While,
    /// Wait ceiling that never fails the chain
    Timeout,
    /// Unconditional break
    StopChain,
    /// Conditional break
    StopChainIf,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Play => "play",
            StepKind::Wait => "wait",
            StepKind::WaitFrames => "wait_frames",
            StepKind::WaitUntil => "wait_until",
            StepKind::Call => "call",
            StepKind::Parallel => "parallel",
            StepKind::If => "if",
            StepKind::Repeat => "repeat",
            StepKind::While => "while",
            StepKind::Timeout => "timeout",
            StepKind::StopChain => "stop_chain",
            StepKind::StopChainIf => "stop_chain_if",
        };
        f.write_str(name)
    }
}

/// One deferred unit of a chain, started with the chain's context when dequeued
pub struct Step {
    kind: StepKind,
    run: StepFn,
}

impl Step {
    pub(crate) fn new<F>(kind: StepKind, run: F) -> Self
    where
        F: FnOnce(StepContext) -> StepFuture + Send + 'static,
    {
        Self {
            kind,
            run: Box::new(run),
        }
    }

    /// The operation that enqueued this step
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub(crate) fn start(self, ctx: StepContext) -> StepFuture {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("kind", &self.kind).finish()
    }
}

/// FIFO of pending steps. Its allocation is what the pool recycles.
#[derive(Debug, Default)]
pub struct StepQueue {
    steps: VecDeque<Step>,
}

impl StepQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step at the back
    pub fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    /// Remove the oldest step
    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    /// Number of pending steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are pending
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drop every pending step, keeping the allocation
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Allocated capacity
    pub fn capacity(&self) -> usize {
        self.steps.capacity()
    }

    /// Kinds of the pending steps in execution order
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(Step::kind).collect()
    }
}

/// A caller-supplied asynchronous unit of work, as used by `play` and `parallel`
pub struct Work {
    run: WorkFn,
}

impl Work {
    /// Wrap a closure that receives the chain's cancellation token
    pub fn new<F, Fut>(work: F) -> Self
    where
        F: FnOnce(CancelToken) -> Fut + Send + 'static,
        Fut: Future<Output = FlowResult<()>> + Send + 'static,
    {
        Self {
            run: Box::new(move |token| work(token).boxed()),
        }
    }

    /// Start the work with the given token
    pub fn start(self, token: CancelToken) -> StepFuture {
        (self.run)(token)
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Work")
    }
}
