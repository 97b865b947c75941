//! Hierarchical cancellation signal.
//!
//! An owner holds a root token, every spawned chain holds a child of its
//! owner's token and nested chains hold a child of their parent's token.
//! Cancelling any token cancels everything below it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag linked to an optional parent
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    parent: Option<CancelToken>,
}

impl CancelToken {
    /// Create a new root token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that is cancelled whenever `self` is
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Cancel this token and every token derived from it
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Whether this token or any of its ancestors has been cancelled
    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(token) = current {
            if token.inner.cancelled.load(Ordering::Acquire) {
                return true;
            }
            current = token.inner.parent.as_ref();
        }
        false
    }

    /// Whether both handles refer to the same token
    pub fn same_token(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
