//! Explicit per-user session passed to the sync components.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::remote::TokenProvider;

/// App lifecycle facts that gate automatic reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub authenticated: bool,
    /// Setup/login screens where syncing must not run
    pub excluded: bool,
    pub foreground: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            authenticated: true,
            excluded: false,
            foreground: true,
        }
    }
}

impl Lifecycle {
    /// Whether any sync may run at all.
    pub const fn allows_sync(self) -> bool {
        self.authenticated && !self.excluded
    }
}

/// The active user, their token source and the app lifecycle.
#[derive(Clone)]
pub struct SessionContext {
    user_id: Arc<str>,
    tokens: Arc<dyn TokenProvider>,
    lifecycle: Arc<watch::Sender<Lifecycle>>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(user_id: impl AsRef<str>, tokens: Arc<dyn TokenProvider>) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::default());
        Self {
            user_id: Arc::from(user_id.as_ref().trim()),
            tokens,
            lifecycle: Arc::new(lifecycle),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_user(&self, user_id: &str) -> bool {
        &*self.user_id == user_id.trim()
    }

    /// Bearer token for remote calls.
    pub fn token(&self) -> Result<String> {
        self.tokens.token().ok_or(Error::NotAuthenticated)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    pub fn watch_lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.update(|lifecycle| lifecycle.authenticated = authenticated);
    }

    pub fn set_excluded(&self, excluded: bool) {
        self.update(|lifecycle| lifecycle.excluded = excluded);
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.update(|lifecycle| lifecycle.foreground = foreground);
    }

    fn update(&self, change: impl FnOnce(&mut Lifecycle)) {
        self.lifecycle.send_if_modified(|lifecycle| {
            let before = *lifecycle;
            change(lifecycle);
            before != *lifecycle
        });
    }
}
