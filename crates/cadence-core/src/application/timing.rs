//! Suspending primitives used by the built-in steps.
//!
//! The host polls every in-flight run once per tick, so a primitive that
//! returns `Pending` resumes on the next tick.

use futures::future::poll_fn;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::trace;

use crate::application::context::StepContext;
use crate::domain::step::StepFuture;
use crate::error::{FlowError, FlowResult};

/// Future that is pending exactly once
#[derive(Debug, Default)]
pub struct YieldTick {
    yielded: bool,
}

impl Future for YieldTick {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Give control back to the host until its next tick
pub fn yield_tick() -> YieldTick {
    YieldTick::default()
}

/// Suspend until `duration` has passed on the chain's clock
pub(crate) async fn wait_for(ctx: &StepContext, duration: Duration) -> FlowResult<()> {
    if duration.is_zero() {
        return Ok(());
    }

    // An unrepresentable deadline waits until cancelled.
    let deadline = ctx.now().checked_add(duration);
    loop {
        if ctx.cancel_token().is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        if matches!(deadline, Some(deadline) if ctx.now() >= deadline) {
            return Ok(());
        }
        yield_tick().await;
    }
}

/// Suspend for `frames` host ticks
pub(crate) async fn wait_frames(ctx: &StepContext, frames: u32) -> FlowResult<()> {
    for _ in 0..frames {
        if ctx.cancel_token().is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        yield_tick().await;
    }
    Ok(())
}

/// Poll `predicate` once per tick until it holds
pub(crate) async fn wait_until<P>(ctx: &StepContext, mut predicate: P) -> FlowResult<()>
where
    P: FnMut() -> bool,
{
    loop {
        if ctx.cancel_token().is_cancelled() {
            return Err(FlowError::Cancelled);
        }
        if predicate() {
            return Ok(());
        }
        yield_tick().await;
    }
}

/// Wait ceiling: completes when the timer elapses or the chain is cancelled
pub(crate) async fn timeout(ctx: &StepContext, duration: Duration) -> FlowResult<()> {
    match wait_for(ctx, duration).await {
        Err(FlowError::Cancelled) => {
            trace!(chain = %ctx.chain_id(), "Timeout cut short by cancellation");
            Ok(())
        }
        other => other,
    }
}

/// Poll every branch on each wake-up until all succeed.
///
/// All branches are started on the first poll. The first error wins and the
/// remaining branches are dropped.
pub(crate) async fn join_branches(branches: Vec<StepFuture>) -> FlowResult<()> {
    let mut slots: Vec<Option<StepFuture>> = branches.into_iter().map(Some).collect();

    poll_fn(move |cx| {
        let mut all_done = true;
        for slot in slots.iter_mut() {
            let Some(branch) = slot.as_mut() else {
                continue;
            };
            let polled = branch.as_mut().poll(cx);
            match polled {
                Poll::Ready(Ok(())) => *slot = None,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                Poll::Pending => all_done = false,
            }
        }

        if all_done {
            Poll::Ready(Ok(()))
        } else {
            Poll::Pending
        }
    })
    .await
}
