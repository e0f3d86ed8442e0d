//! Single-flight reconciliation of the operation log with the remote
//! service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::session::SessionContext;
use super::state::SyncState;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::notify::EventNotifier;
use crate::remote::{SyncRemote, SyncRequest};
use crate::store::EntryStore;
use crate::translation::TranslationBackfill;

/// Clears the in-flight flag when dropped, whatever path the attempt took.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner {
    store: EntryStore,
    remote: Arc<dyn SyncRemote>,
    backfill: TranslationBackfill,
    connectivity: ConnectivityMonitor,
    session: SessionContext,
    notifier: EventNotifier,
    in_flight: AtomicBool,
    status: watch::Sender<SyncState>,
    last_sync_at: Mutex<Option<DateTime<Utc>>>,
}

/// Coordinates every sync trigger behind one in-flight guard.
#[derive(Clone)]
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
}

impl SyncOrchestrator {
    pub fn new(
        store: EntryStore,
        remote: Arc<dyn SyncRemote>,
        backfill: TranslationBackfill,
        connectivity: ConnectivityMonitor,
        session: SessionContext,
        notifier: EventNotifier,
    ) -> Self {
        let initial = if connectivity.is_online() {
            SyncState::Synced
        } else {
            SyncState::Offline
        };
        let (status, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                store,
                remote,
                backfill,
                connectivity,
                session,
                notifier,
                in_flight: AtomicBool::new(false),
                status,
                last_sync_at: Mutex::new(None),
            }),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    pub fn status(&self) -> SyncState {
        *self.inner.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SyncState> {
        self.inner.status.subscribe()
    }

    /// Completion time of the last accepted push in this process.
    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .last_sync_at
            .lock()
            .ok()
            .and_then(|last_sync_at| *last_sync_at)
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Reconcile local changes for `user_id`.
    ///
    /// Returns `false` when the call was refused (excluded context, other
    /// user, another attempt in flight) or when the push failed; the
    /// operation log is left untouched in every `false` case.
    pub async fn request_sync(&self, user_id: &str) -> bool {
        let inner = &self.inner;
        if !inner.session.lifecycle().allows_sync() {
            tracing::debug!("Sync refused: excluded or unauthenticated context");
            return false;
        }
        if !inner.session.is_user(user_id) || inner.store.user_id() != inner.session.user_id() {
            tracing::warn!("Sync refused: {user_id} is not the active user");
            return false;
        }
        let Some(_in_flight) = InFlight::acquire(&inner.in_flight) else {
            tracing::debug!("Sync already in flight");
            return false;
        };

        let pending = match inner.store.pending_work().await {
            Ok(pending) => pending,
            Err(error) => {
                tracing::error!("Sync failed reading pending work: {error}");
                self.set_status(SyncState::Error);
                return false;
            }
        };
        if pending.is_empty() {
            tracing::debug!("Nothing to sync");
            return true;
        }

        if pending.untranslated_entries > 0 {
            // Translation outcome does not decide the sync outcome
            inner.backfill.process_pending(user_id).await;
        }
        if pending.queued_operations == 0 {
            return true;
        }

        if !inner.connectivity.is_online() {
            tracing::info!(
                "Offline, keeping {} queued operation(s)",
                pending.queued_operations
            );
            self.set_status(SyncState::Offline);
            return false;
        }

        self.set_status(SyncState::Syncing);
        match self.push_pending().await {
            Ok(pushed) => {
                if let Ok(mut last_sync_at) = inner.last_sync_at.lock() {
                    *last_sync_at = Some(Utc::now());
                }
                self.set_status(SyncState::Synced);
                inner.notifier.publish();
                tracing::info!("Synced {pushed} operation(s)");
                true
            }
            Err(error) => {
                tracing::error!("Sync failed: {error}");
                self.set_status(SyncState::Error);
                false
            }
        }
    }

    async fn push_pending(&self) -> Result<usize> {
        let inner = &self.inner;
        let operations = inner.store.pending_operations().await?;
        let Some(high_water_mark) = operations.last().map(|operation| operation.sequence_id) else {
            return Ok(0);
        };

        let token = inner.session.token()?;
        let request = SyncRequest::new(
            inner.session.user_id(),
            &operations,
            inner.store.device_id().await?,
            inner.store.last_sync_timestamp().await?,
        );
        let response = inner.remote.push(&token, &request).await?;
        if let Some(failed) = response.failed_operations.filter(|failed| *failed > 0) {
            tracing::warn!("Remote reported {failed} failed operation(s)");
        }

        inner
            .store
            .complete_sync(high_water_mark, &response.sync_timestamp)
            .await?;
        Ok(operations.len())
    }

    fn set_status(&self, state: SyncState) {
        self.inner.status.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
