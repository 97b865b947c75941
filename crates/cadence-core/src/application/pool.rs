//! Reuse pool for flow chains.
//!
//! Idle entries keep only their id and their (empty) step queue allocation.
//! Owner, cancellation token and break state are attached on spawn and
//! dropped on return, so an idle entry never references an owner.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::application::chain::{ChainBinding, FlowChain};
use crate::application::context::StepContext;
use crate::application::owner::Owner;
use crate::config::FlowConfig;
use crate::domain::break_state::BreakState;
use crate::domain::step::StepQueue;

/// Value object: pooled chain identifier, stable across reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain-{}", self.0)
    }
}

/// Pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Chains currently idle
    pub idle: usize,
    /// Chains allocated because the pool was empty (or prewarmed)
    pub created: u64,
    /// Spawns served from the idle stack
    pub reused: u64,
    /// Chains handed back
    pub returned: u64,
    /// Returned chains dropped because the pool was full
    pub discarded: u64,
}

struct IdleChain {
    id: ChainId,
    queue: StepQueue,
}

struct PoolState {
    idle: Vec<IdleChain>,
    stats: PoolStats,
}

struct PoolInner {
    state: Mutex<PoolState>,
    next_id: AtomicU64,
    max_idle: usize,
}

/// LIFO pool of flow chains, safe to share between threads
#[derive(Clone)]
pub struct ChainPool {
    inner: Arc<PoolInner>,
}

impl ChainPool {
    /// Create an empty pool that keeps at most `max_idle` idle chains
    pub fn new(max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    idle: Vec::new(),
                    stats: PoolStats::default(),
                }),
                next_id: AtomicU64::new(1),
                max_idle,
            }),
        }
    }

    /// Create a pool sized and prewarmed from configuration
    pub fn from_config(config: &FlowConfig) -> Self {
        let pool = Self::new(config.pool_max_idle);
        pool.prewarm(config.pool_prewarm);
        pool
    }

    /// Allocate idle chains until `count` are idle (bounded by the capacity)
    pub fn prewarm(&self, count: usize) {
        let target = count.min(self.inner.max_idle);
        let mut state = self.inner.state.lock();
        while state.idle.len() < target {
            let id = self.next_id();
            state.idle.push(IdleChain {
                id,
                queue: StepQueue::new(),
            });
            state.stats.created += 1;
        }
    }

    /// Hand out a chain bound to `owner`, with a fresh cancellation token
    /// derived from the owner and a fresh break state
    pub fn spawn(&self, owner: &Owner) -> FlowChain {
        let (id, queue) = self.acquire();
        let binding = ChainBinding {
            owner: owner.clone(),
            cancel: owner.cancel_token().child(),
            break_state: BreakState::new(),
            ignore_time_scale: false,
            depth: 0,
        };
        debug!(chain = %id, owner = %owner.id(), "Spawned flow chain");
        FlowChain::assemble(id, queue, binding, self.clone())
    }

    pub(crate) fn spawn_nested(&self, parent: &StepContext) -> FlowChain {
        let (id, queue) = self.acquire();
        let binding = ChainBinding {
            owner: parent.owner.clone(),
            cancel: parent.cancel.child(),
            break_state: parent.break_state.clone(),
            ignore_time_scale: parent.ignore_time_scale,
            depth: parent.depth + 1,
        };
        trace!(chain = %id, parent = %parent.chain, depth = binding.depth, "Spawned nested chain");
        FlowChain::assemble(id, queue, binding, self.clone())
    }

    /// Return an unrun chain to the pool it was spawned from.
    ///
    /// Chains also return themselves when dropped or when their run ends,
    /// so this is only an explicit spelling of `drop(chain)`.
    pub fn despawn(&self, chain: FlowChain) {
        drop(chain);
    }

    pub(crate) fn release(&self, id: ChainId, mut queue: StepQueue) {
        // Pending steps may own chains of their own; drop them outside the lock.
        queue.clear();

        let mut state = self.inner.state.lock();
        state.stats.returned += 1;
        if state.idle.len() < self.inner.max_idle {
            state.idle.push(IdleChain { id, queue });
            trace!(chain = %id, idle = state.idle.len(), "Chain returned to pool");
        } else {
            state.stats.discarded += 1;
            trace!(chain = %id, "Pool full, chain discarded");
        }
    }

    fn acquire(&self) -> (ChainId, StepQueue) {
        let mut state = self.inner.state.lock();
        match state.idle.pop() {
            Some(idle) => {
                state.stats.reused += 1;
                (idle.id, idle.queue)
            }
            None => {
                state.stats.created += 1;
                (self.next_id(), StepQueue::new())
            }
        }
    }

    fn next_id(&self) -> ChainId {
        ChainId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            idle: state.idle.len(),
            ..state.stats
        }
    }

    /// Number of idle chains
    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Ids of idle chains, next to be spawned first
    pub fn idle_ids(&self) -> Vec<ChainId> {
        let state = self.inner.state.lock();
        state.idle.iter().rev().map(|idle| idle.id).collect()
    }

    /// Whether every idle chain has an empty queue
    pub fn idle_queues_empty(&self) -> bool {
        let state = self.inner.state.lock();
        state.idle.iter().all(|idle| idle.queue.is_empty())
    }

    /// Maximum number of idle chains kept
    pub fn max_idle(&self) -> usize {
        self.inner.max_idle
    }
}

impl fmt::Debug for ChainPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainPool")
            .field("max_idle", &self.inner.max_idle)
            .field("stats", &self.stats())
            .finish()
    }
}
