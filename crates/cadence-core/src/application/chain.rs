//! Fluent builder and drain loop for flow chains.
//!
//! Every builder call appends exactly one step and hands the chain back.
//! `run` consumes the chain, so nothing can be appended once it is running.
//! Composite steps (`if_else`, `repeat`, `while_loop`) spawn nested chains
//! from the same pool that share the root's break state and run them inline.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

use crate::application::context::StepContext;
use crate::application::handle::{RunCompletion, RunHandle, RunOutcome};
use crate::application::host::RunTask;
use crate::application::owner::Owner;
use crate::application::pool::{ChainId, ChainPool};
use crate::application::timing::{self, yield_tick};
use crate::domain::break_state::BreakState;
use crate::domain::cancel::CancelToken;
use crate::domain::step::{Step, StepFuture, StepKind, StepQueue, Work};
use crate::error::{FlowError, FlowResult};

/// Per-spawn state attached to a pooled chain
#[derive(Debug)]
pub(crate) struct ChainBinding {
    pub(crate) owner: Owner,
    pub(crate) cancel: CancelToken,
    pub(crate) break_state: BreakState,
    pub(crate) ignore_time_scale: bool,
    pub(crate) depth: usize,
}

/// A pooled chain of deferred steps.
///
/// Obtain one from [`Owner::flow`] or [`ChainPool::spawn`], append steps,
/// then call [`FlowChain::run`]. The chain returns itself to its pool when
/// the run ends or when it is dropped unrun.
pub struct FlowChain {
    id: ChainId,
    queue: StepQueue,
    binding: ChainBinding,
    pool: ChainPool,
}

impl FlowChain {
    pub(crate) fn assemble(
        id: ChainId,
        queue: StepQueue,
        binding: ChainBinding,
        pool: ChainPool,
    ) -> Self {
        Self {
            id,
            queue,
            binding,
            pool,
        }
    }

    /// Pooled identity of this chain
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Owner the chain is bound to
    pub fn owner(&self) -> &Owner {
        &self.binding.owner
    }

    /// Nesting depth (0 for chains spawned by callers)
    pub fn depth(&self) -> usize {
        self.binding.depth
    }

    /// Break state shared with nested chains
    pub fn break_state(&self) -> &BreakState {
        &self.binding.break_state
    }

    /// Cancellation token derived from the owner (or the parent chain)
    pub fn cancel_token(&self) -> &CancelToken {
        &self.binding.cancel
    }

    /// Number of queued steps
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no steps are queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Kinds of the queued steps in execution order
    pub fn step_kinds(&self) -> Vec<StepKind> {
        self.queue.kinds()
    }

    fn push<F>(mut self, kind: StepKind, run: F) -> Self
    where
        F: FnOnce(StepContext) -> StepFuture + Send + 'static,
    {
        self.queue.push(Step::new(kind, run));
        self
    }

    /// Enqueue a caller-supplied unit of work.
    ///
    /// The work receives the chain's cancellation token. Returning
    /// `Err(FlowError::Cancelled)` ends the run silently; any other error
    /// faults it.
    pub fn play<F, Fut>(self, work: F) -> Self
    where
        F: FnOnce(CancelToken) -> Fut + Send + 'static,
        Fut: Future<Output = FlowResult<()>> + Send + 'static,
    {
        let work = Work::new(work);
        self.push(StepKind::Play, move |ctx| {
            work.start(ctx.cancel_token().clone())
        })
    }

    /// Suspend for `duration` on the scaled clock, or the unscaled one when
    /// the run ignores the time scale. A zero duration completes immediately.
    pub fn wait(self, duration: Duration) -> Self {
        self.push(StepKind::Wait, move |ctx| {
            async move { timing::wait_for(&ctx, duration).await }.boxed()
        })
    }

    /// [`FlowChain::wait`] in seconds; negative and NaN values complete immediately
    pub fn wait_seconds(self, seconds: f64) -> Self {
        let duration = if seconds > 0.0 {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        self.wait(duration)
    }

    /// Suspend for exactly `frames` host ticks
    pub fn wait_frames(self, frames: u32) -> Self {
        self.push(StepKind::WaitFrames, move |ctx| {
            async move { timing::wait_frames(&ctx, frames).await }.boxed()
        })
    }

    /// Poll `predicate` once per tick until it returns true
    pub fn wait_until<P>(self, predicate: P) -> Self
    where
        P: FnMut() -> bool + Send + 'static,
    {
        self.push(StepKind::WaitUntil, move |ctx| {
            async move { timing::wait_until(&ctx, predicate).await }.boxed()
        })
    }

    /// Invoke `action` synchronously when the step is reached
    pub fn call<A>(self, action: A) -> Self
    where
        A: FnOnce() + Send + 'static,
    {
        self.push(StepKind::Call, move |_ctx| {
            async move {
                action();
                Ok(())
            }
            .boxed()
        })
    }

    /// Invoke a fallible `action`; an `Err` faults the run
    pub fn try_call<A, E>(self, action: A) -> Self
    where
        A: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display + 'static,
    {
        self.push(StepKind::Call, move |_ctx| {
            async move { action().map_err(|err| FlowError::Callback(err.to_string())) }.boxed()
        })
    }

    /// Start every unit of work at once, complete when all have, then yield a tick
    pub fn parallel<I>(self, works: I) -> Self
    where
        I: IntoIterator<Item = Work>,
    {
        let works: Vec<Work> = works.into_iter().collect();
        self.push(StepKind::Parallel, move |ctx| {
            async move {
                let branches = works
                    .into_iter()
                    .map(|work| work.start(ctx.cancel_token().clone()))
                    .collect();
                timing::join_branches(branches).await?;
                yield_tick().await;
                Ok(())
            }
            .boxed()
        })
    }

    /// Evaluate `condition` when reached and run the chosen branch as a
    /// nested chain, then yield a tick
    pub fn if_else<C, T, E>(self, condition: C, then_branch: T, else_branch: E) -> Self
    where
        C: FnOnce() -> bool + Send + 'static,
        T: FnOnce(FlowChain) -> FlowChain + Send + 'static,
        E: FnOnce(FlowChain) -> FlowChain + Send + 'static,
    {
        self.push(StepKind::If, move |ctx| {
            async move {
                let take_then = condition();
                let nested = ctx.spawn_nested();
                let nested = if take_then {
                    then_branch(nested)
                } else {
                    else_branch(nested)
                };
                nested.drain().await.into_step_result()?;

                if !ctx.break_state().is_requested() {
                    yield_tick().await;
                }
                Ok(())
            }
            .boxed()
        })
    }

    /// [`FlowChain::if_else`] with an empty else branch
    pub fn when<C, T>(self, condition: C, then_branch: T) -> Self
    where
        C: FnOnce() -> bool + Send + 'static,
        T: FnOnce(FlowChain) -> FlowChain + Send + 'static,
    {
        self.if_else(condition, then_branch, |nested| nested)
    }

    /// Build and run `body` as a nested chain `count` times, one after another
    pub fn repeat<B>(self, count: usize, body: B) -> Self
    where
        B: Fn(FlowChain) -> FlowChain + Send + 'static,
    {
        self.push(StepKind::Repeat, move |ctx| {
            async move {
                for _ in 0..count {
                    if ctx.cancel_token().is_cancelled() {
                        return Err(FlowError::Cancelled);
                    }
                    if ctx.break_state().is_requested() {
                        return Ok(());
                    }
                    let nested = body(ctx.spawn_nested());
                    nested.drain().await.into_step_result()?;
                }
                Ok(())
            }
            .boxed()
        })
    }

    /// While `condition` holds, build and run `body` as a nested chain and
    /// yield a tick before checking again
    pub fn while_loop<C, B>(self, mut condition: C, body: B) -> Self
    where
        C: FnMut() -> bool + Send + 'static,
        B: Fn(FlowChain) -> FlowChain + Send + 'static,
    {
        self.push(StepKind::While, move |ctx| {
            async move {
                loop {
                    if ctx.cancel_token().is_cancelled() {
                        return Err(FlowError::Cancelled);
                    }
                    if ctx.break_state().is_requested() || !condition() {
                        return Ok(());
                    }
                    let nested = body(ctx.spawn_nested());
                    nested.drain().await.into_step_result()?;
                    if ctx.break_state().is_requested() {
                        return Ok(());
                    }
                    yield_tick().await;
                }
            }
            .boxed()
        })
    }

    /// Wait ceiling: completes when `duration` elapses or when the chain is
    /// cancelled, whichever comes first, without failing the chain
    pub fn timeout(self, duration: Duration) -> Self {
        self.push(StepKind::Timeout, move |ctx| {
            async move { timing::timeout(&ctx, duration).await }.boxed()
        })
    }

    /// Halt this chain and every chain sharing its break state
    pub fn stop_chain(self) -> Self {
        self.push(StepKind::StopChain, |ctx| {
            async move {
                debug!(chain = %ctx.chain_id(), depth = ctx.depth(), "Break requested");
                ctx.break_state().request();
                Ok(())
            }
            .boxed()
        })
    }

    /// Evaluate `condition`; halt only when it holds and `stop_immediately`
    /// is set. Without `stop_immediately` the step has no effect.
    pub fn stop_chain_if<C>(self, condition: C, stop_immediately: bool) -> Self
    where
        C: FnOnce() -> bool + Send + 'static,
    {
        self.push(StepKind::StopChainIf, move |ctx| {
            async move {
                if condition() && stop_immediately {
                    debug!(chain = %ctx.chain_id(), depth = ctx.depth(), "Conditional break requested");
                    ctx.break_state().request();
                }
                Ok(())
            }
            .boxed()
        })
    }

    /// Start draining the queue on the owner's host.
    ///
    /// The caller is not blocked. The returned handle may be dropped; it
    /// only observes or cancels the run.
    pub fn run(mut self, ignore_time_scale: bool) -> RunHandle {
        self.binding.ignore_time_scale = ignore_time_scale;
        let handle = RunHandle::new(self.id, self.binding.cancel.clone());

        let Some(host) = self.binding.owner.host() else {
            let owner = self.binding.owner.name().to_string();
            warn!(chain = %self.id, owner = %owner, "Host dropped before run");
            drop(self);
            handle
                .state()
                .complete(RunOutcome::Faulted(FlowError::HostUnavailable(owner)));
            return handle;
        };

        let chain = self.id;
        let owner = self.binding.owner.id();
        let completion = RunCompletion::new(handle.state());
        let future = async move {
            let outcome = self.drain().await;
            completion.finish(outcome.clone());
            outcome
        }
        .boxed();

        host.launch(RunTask {
            chain,
            owner,
            future,
        });
        handle
    }

    /// Run with the host's configured time-scale flag
    pub fn run_default(self) -> RunHandle {
        let ignore_time_scale = self
            .binding
            .owner
            .host()
            .map(|host| host.config().ignore_time_scale)
            .unwrap_or(false);
        self.run(ignore_time_scale)
    }

    fn context(&self) -> StepContext {
        StepContext {
            chain: self.id,
            depth: self.binding.depth,
            owner: self.binding.owner.clone(),
            cancel: self.binding.cancel.clone(),
            break_state: self.binding.break_state.clone(),
            ignore_time_scale: self.binding.ignore_time_scale,
            pool: self.pool.clone(),
        }
    }

    /// Execute queued steps in order until the queue is empty, the chain is
    /// cancelled or a break is requested. The chain is back in its pool
    /// before the outcome is returned.
    pub(crate) fn drain(mut self) -> BoxFuture<'static, RunOutcome> {
        async move {
            let id = self.id;
            let depth = self.binding.depth;
            debug!(chain = %id, depth, steps = self.queue.len(), "Flow chain started");

            let outcome = loop {
                if self.binding.cancel.is_cancelled() {
                    break RunOutcome::Cancelled;
                }
                if self.binding.break_state.is_requested() {
                    break RunOutcome::Broken;
                }
                let Some(step) = self.queue.pop() else {
                    break RunOutcome::Completed;
                };

                trace!(chain = %id, depth, step = %step.kind(), "Executing step");
                if let Err(err) = step.start(self.context()).await {
                    break RunOutcome::from_error(err);
                }
            };

            match &outcome {
                RunOutcome::Faulted(err) if depth == 0 => {
                    error!(chain = %id, error = %err, "Flow chain faulted")
                }
                other => debug!(chain = %id, depth, outcome = %other, "Flow chain finished"),
            }

            drop(self);
            outcome
        }
        .boxed()
    }
}

impl Drop for FlowChain {
    fn drop(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        self.pool.release(self.id, queue);
    }
}

impl fmt::Debug for FlowChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowChain")
            .field("id", &self.id)
            .field("depth", &self.binding.depth)
            .field("owner", &self.binding.owner.id())
            .field("steps", &self.queue.kinds())
            .finish()
    }
}
