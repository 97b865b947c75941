//! The host: clock, pool and the set of in-flight runs.
//!
//! Call [`Host::tick`] once per frame. Each tick advances the clock and
//! polls every in-flight run exactly once; runs launched during a tick are
//! first polled on the next one (or inside `run()` when configured to start
//! immediately).

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::trace;

use crate::application::handle::RunOutcome;
use crate::application::owner::{Owner, OwnerId};
use crate::application::pool::{ChainId, ChainPool};
use crate::config::FlowConfig;
use crate::domain::clock::{FrameClock, SharedClock};
use crate::error::{FlowError, FlowResult};

pub(crate) struct RunTask {
    pub(crate) chain: ChainId,
    pub(crate) owner: OwnerId,
    pub(crate) future: BoxFuture<'static, RunOutcome>,
}

pub(crate) struct HostInner {
    config: FlowConfig,
    clock: SharedClock,
    pool: ChainPool,
    tasks: Mutex<Vec<RunTask>>,
}

/// A run that ended during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRun {
    /// Chain that executed the run
    pub chain: ChainId,
    /// Owner the chain was bound to
    pub owner: OwnerId,
    /// How the run ended
    pub outcome: RunOutcome,
}

/// Summary of one host tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frame number after this tick
    pub frame: u64,
    /// Wall time the clock advanced by
    pub delta: Duration,
    /// Runs that ended during this tick. Runs that end inside `run()`
    /// never reach a tick and are only visible through their handle.
    pub finished: Vec<FinishedRun>,
    /// Runs still in flight after this tick
    pub in_flight: usize,
}

impl TickReport {
    /// Faults raised by runs that ended during this tick
    pub fn faults(&self) -> Vec<(ChainId, &FlowError)> {
        self.finished
            .iter()
            .filter_map(|run| match &run.outcome {
                RunOutcome::Faulted(err) => Some((run.chain, err)),
                _ => None,
            })
            .collect()
    }

    /// Whether nothing is left in flight
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }
}

/// Host-side scheduler. Clones share the same state.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

impl Host {
    /// Create a host with the default configuration
    pub fn new() -> Self {
        Self::assemble(FlowConfig::default(), FrameClock::default())
    }

    /// Create a host from a validated configuration
    pub fn with_config(config: FlowConfig) -> FlowResult<Self> {
        config.validate()?;
        let clock = FrameClock::new(config.time_scale)?;
        Ok(Self::assemble(config, clock))
    }

    fn assemble(config: FlowConfig, clock: FrameClock) -> Self {
        let pool = ChainPool::from_config(&config);
        Self {
            inner: Arc::new(HostInner {
                config,
                clock: SharedClock::new(clock),
                pool,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<HostInner>) -> Self {
        Self { inner }
    }

    /// Configuration the host was created with
    pub fn config(&self) -> &FlowConfig {
        &self.inner.config
    }

    /// Create an owner living on this host
    pub fn create_owner(&self, name: impl Into<String>) -> Owner {
        Owner::new(
            name.into(),
            Arc::downgrade(&self.inner),
            self.inner.clock.clone(),
            self.inner.pool.clone(),
        )
    }

    /// Pool used by `Owner::flow`
    pub fn pool(&self) -> &ChainPool {
        &self.inner.pool
    }

    /// Shared frame clock
    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    /// Current time, scaled unless `ignore_time_scale`
    pub fn now(&self, ignore_time_scale: bool) -> Duration {
        self.inner.clock.now(ignore_time_scale)
    }

    /// Number of ticks processed
    pub fn frame(&self) -> u64 {
        self.inner.clock.frame()
    }

    /// Current time scale
    pub fn time_scale(&self) -> f64 {
        self.inner.clock.snapshot().time_scale
    }

    /// Change the time scale applied by subsequent ticks; 0 pauses scaled time
    pub fn set_time_scale(&self, time_scale: f64) -> FlowResult<()> {
        self.inner.clock.set_time_scale(time_scale)
    }

    /// Number of runs awaiting a tick
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.lock().len()
    }

    /// Advance the clock by `delta` and poll every in-flight run once.
    ///
    /// Panics raised by step callbacks unwind out of this call. The run that
    /// panicked is dropped: its chain returns to the pool and its handle ends
    /// `Cancelled`. Every other run stays in flight.
    pub fn tick(&self, delta: Duration) -> TickReport {
        let clock = self.inner.clock.advance(delta);
        let mut report = TickReport {
            frame: clock.frame,
            delta,
            ..TickReport::default()
        };

        let mut running = Requeue::take(&self.inner.tasks);
        while let Some(mut task) = running.unpolled.pop_front() {
            match poll_once(&mut task.future) {
                Poll::Ready(outcome) => report.finished.push(FinishedRun {
                    chain: task.chain,
                    owner: task.owner,
                    outcome,
                }),
                Poll::Pending => running.pending.push(task),
            }
        }
        drop(running);
        report.in_flight = self.in_flight();

        if !report.finished.is_empty() {
            trace!(
                frame = report.frame,
                finished = report.finished.len(),
                in_flight = report.in_flight,
                "Host tick"
            );
        }
        report
    }

    pub(crate) fn launch(&self, mut task: RunTask) {
        if self.inner.config.start_immediately {
            if let Poll::Ready(outcome) = poll_once(&mut task.future) {
                trace!(chain = %task.chain, %outcome, "Run finished without suspending");
                return;
            }
        }
        self.inner.tasks.lock().push(task);
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("clock", &self.inner.clock.snapshot())
            .field("in_flight", &self.in_flight())
            .field("pool", &self.inner.pool)
            .finish()
    }
}

/// Tasks taken out of the host for one tick.
///
/// Dropping it puts the pending and the not yet polled tasks back, ahead of
/// any run launched while polling. This also runs while a panic unwinds.
struct Requeue<'a> {
    tasks: &'a Mutex<Vec<RunTask>>,
    pending: Vec<RunTask>,
    unpolled: VecDeque<RunTask>,
}

impl<'a> Requeue<'a> {
    fn take(tasks: &'a Mutex<Vec<RunTask>>) -> Self {
        let unpolled: VecDeque<RunTask> = std::mem::take(&mut *tasks.lock()).into();
        Self {
            tasks,
            pending: Vec::with_capacity(unpolled.len()),
            unpolled,
        }
    }
}

impl Drop for Requeue<'_> {
    fn drop(&mut self) {
        let mut tasks = self.tasks.lock();
        let launched = std::mem::take(&mut *tasks);
        tasks.append(&mut self.pending);
        tasks.extend(self.unpolled.drain(..));
        tasks.extend(launched);
    }
}

fn poll_once(future: &mut BoxFuture<'static, RunOutcome>) -> Poll<RunOutcome> {
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.as_mut().poll(&mut cx)
}
