use std::time::Duration;

use crate::application::chain::FlowChain;
use crate::application::owner::Owner;
use crate::application::pool::{ChainId, ChainPool};
use crate::domain::break_state::BreakState;
use crate::domain::cancel::CancelToken;

/// Everything a step needs from the chain that is executing it
#[derive(Debug, Clone)]
pub struct StepContext {
    pub(crate) chain: ChainId,
    pub(crate) depth: usize,
    pub(crate) owner: Owner,
    pub(crate) cancel: CancelToken,
    pub(crate) break_state: BreakState,
    pub(crate) ignore_time_scale: bool,
    pub(crate) pool: ChainPool,
}

impl StepContext {
    /// Chain executing the step
    pub fn chain_id(&self) -> ChainId {
        self.chain
    }

    /// Nesting depth of the executing chain (0 for a root run)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Owner the chain is bound to
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Cancellation token of the executing chain
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Break state shared with the root chain and its descendants
    pub fn break_state(&self) -> &BreakState {
        &self.break_state
    }

    /// Whether timed steps read the unscaled clock
    pub fn ignore_time_scale(&self) -> bool {
        self.ignore_time_scale
    }

    /// Current time on the clock this chain waits against
    pub fn now(&self) -> Duration {
        self.owner.clock().now(self.ignore_time_scale)
    }

    /// Current host frame
    pub fn frame(&self) -> u64 {
        self.owner.clock().frame()
    }

    /// Whether the drain loop should stop at the next boundary
    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.break_state.is_requested()
    }

    /// Spawn a nested chain from the same pool, sharing this chain's break state
    pub(crate) fn spawn_nested(&self) -> FlowChain {
        self.pool.spawn_nested(self)
    }
}
