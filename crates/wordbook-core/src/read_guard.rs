//! Discarding results of superseded reads.
//!
//! A caller takes a [`ReadToken`] before starting a load and only applies the
//! result if that token is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadToken(u64);

/// Issues read tokens; cloning shares the sequence.
#[derive(Debug, Clone, Default)]
pub struct ReadGuard {
    latest: Arc<AtomicU64>,
}

impl ReadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a read; any earlier token becomes stale.
    pub fn begin(&self) -> ReadToken {
        ReadToken(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, token: ReadToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }

    /// `Some(value)` if `token` is still current, otherwise the value is dropped.
    pub fn apply<T>(&self, token: ReadToken, value: T) -> Option<T> {
        if self.is_current(token) {
            Some(value)
        } else {
            tracing::debug!("Discarding stale read result");
            None
        }
    }

    /// Make every outstanding token stale.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
