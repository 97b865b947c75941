//! Owners: the lifetimes chains are bound to.
//!
//! An owner stands in for whatever host entity a chain belongs to. Destroying
//! it cancels every chain spawned against it, including nested ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use uuid::Uuid;

use crate::application::chain::FlowChain;
use crate::application::host::{Host, HostInner};
use crate::application::pool::ChainPool;
use crate::domain::cancel::CancelToken;
use crate::domain::clock::SharedClock;

/// Value object: owner identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an owning lifetime. Clones refer to the same owner.
#[derive(Clone)]
pub struct Owner {
    inner: Arc<OwnerInner>,
}

struct OwnerInner {
    id: OwnerId,
    name: String,
    token: CancelToken,
    host: Weak<HostInner>,
    clock: SharedClock,
    pool: ChainPool,
}

impl Owner {
    pub(crate) fn new(
        name: String,
        host: Weak<HostInner>,
        clock: SharedClock,
        pool: ChainPool,
    ) -> Self {
        Self {
            inner: Arc::new(OwnerInner {
                id: OwnerId::new(),
                name,
                token: CancelToken::new(),
                host,
                clock,
                pool,
            }),
        }
    }

    /// Owner identifier
    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    /// Human readable name used in logs
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Root cancellation token; chains derive their tokens from it
    pub fn cancel_token(&self) -> &CancelToken {
        &self.inner.token
    }

    /// Whether the owner has not been destroyed
    pub fn is_alive(&self) -> bool {
        !self.inner.token.is_cancelled()
    }

    /// Tear the owner down, cancelling every chain bound to it.
    ///
    /// Running chains stop at their next cancellation check and return to
    /// the pool.
    pub fn destroy(&self) {
        debug!(owner = %self.inner.id, name = %self.inner.name, "Owner destroyed");
        self.inner.token.cancel();
    }

    /// Clock of the host this owner lives on
    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    /// Pool of the host this owner lives on
    pub fn pool(&self) -> &ChainPool {
        &self.inner.pool
    }

    /// Spawn a chain bound to this owner from its host's pool
    pub fn flow(&self) -> FlowChain {
        self.inner.pool.spawn(self)
    }

    /// Host driving this owner, if it is still alive
    pub fn host(&self) -> Option<Host> {
        self.inner.host.upgrade().map(Host::from_inner)
    }

    /// Whether both handles refer to the same owner
    pub fn same_owner(&self, other: &Owner) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}
