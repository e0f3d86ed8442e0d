//! Automatic sync triggers.
//!
//! One task watches connectivity and the session lifecycle and calls
//! [`SyncOrchestrator::request_sync`] on: a staggered initial sync, an
//! interval timer, return to foreground, and offline to online
//! transitions. All of them go through the orchestrator's in-flight guard.

use std::future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::orchestrator::SyncOrchestrator;
use super::session::Lifecycle;
use crate::config::EngineConfig;
use crate::connectivity::ConnectivityMonitor;

pub struct SyncScheduler {
    orchestrator: SyncOrchestrator,
    connectivity: ConnectivityMonitor,
    interval: Duration,
    initial_delay: Duration,
}

impl SyncScheduler {
    pub fn new(orchestrator: SyncOrchestrator, connectivity: ConnectivityMonitor) -> Self {
        Self::from_config(orchestrator, connectivity, &EngineConfig::default())
    }

    pub fn from_config(
        orchestrator: SyncOrchestrator,
        connectivity: ConnectivityMonitor,
        config: &EngineConfig,
    ) -> Self {
        Self {
            orchestrator,
            connectivity,
            interval: config.sync_interval(),
            initial_delay: config.initial_sync_delay(),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Start the trigger loop on the current runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, stop) = oneshot::channel();
        let task = tokio::spawn(self.run(stop));
        SchedulerHandle {
            shutdown: Some(shutdown),
            task,
        }
    }

    async fn run(self, mut stop: oneshot::Receiver<()>) {
        let session = self.orchestrator.session().clone();
        let mut network = self.connectivity.watch();
        let mut lifecycle_changes = session.watch_lifecycle();

        let mut known_online = *network.borrow_and_update();
        let mut lifecycle = *lifecycle_changes.borrow_and_update();
        let mut timer = self.arm(known_online == Some(true), lifecycle);

        let initial = time::sleep(self.initial_delay);
        tokio::pin!(initial);
        let mut initial_pending = known_online == Some(true) && lifecycle.allows_sync();
        let mut initial_done = false;

        loop {
            tokio::select! {
                _ = &mut stop => break,
                () = &mut initial, if initial_pending => {
                    initial_pending = false;
                    initial_done = true;
                    self.trigger("initial").await;
                }
                () = next_tick(&mut timer) => {
                    if lifecycle.foreground {
                        self.trigger("interval").await;
                    } else {
                        tracing::debug!("Skipping interval sync: app in background");
                    }
                }
                changed = network.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *network.borrow_and_update();
                    match (known_online, online) {
                        (Some(false), Some(true)) => self.trigger("reconnect").await,
                        // First observation: stagger the initial sync
                        (None, Some(true)) if !initial_done && lifecycle.allows_sync() => {
                            initial.as_mut().reset(Instant::now() + self.initial_delay);
                            initial_pending = true;
                        }
                        _ => {}
                    }
                    known_online = online;
                    timer = self.arm(known_online == Some(true), lifecycle);
                }
                changed = lifecycle_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = *lifecycle_changes.borrow_and_update();
                    let online = known_online == Some(true);
                    if current.foreground && !lifecycle.foreground && online {
                        self.trigger("foreground").await;
                    }
                    if !current.allows_sync() {
                        initial_pending = false;
                    }
                    lifecycle = current;
                    timer = self.arm(online, lifecycle);
                }
            }
        }
        tracing::debug!("Sync scheduler stopped");
    }

    /// Fresh interval timer, or none while offline or in an excluded context.
    fn arm(&self, online: bool, lifecycle: Lifecycle) -> Option<Interval> {
        if !online || !lifecycle.allows_sync() {
            return None;
        }
        let mut timer = time::interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(timer)
    }

    async fn trigger(&self, reason: &str) {
        let user_id = self.orchestrator.session().user_id().to_string();
        tracing::debug!("Sync trigger: {reason}");
        if !self.orchestrator.request_sync(&user_id).await {
            tracing::debug!("Sync trigger '{reason}' did not complete a sync");
        }
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => future::pending().await,
    }
}

/// Owner of a running [`SyncScheduler`].
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler after any in-progress trigger finishes.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        if let Err(error) = (&mut self.task).await {
            tracing::warn!("Sync scheduler task ended abnormally: {error}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.task.abort();
        }
    }
}
