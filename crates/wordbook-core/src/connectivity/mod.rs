//! Network reachability observer.
//!
//! The monitor never retries or schedules anything itself; platform code (or
//! a [`NetworkProbe`]) reports what it sees and the monitor turns those
//! reports into flip events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::notify::{Listeners, Subscription};
use crate::util::{is_http_url, normalize_text_option};

/// Raw observation from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkReport {
    /// A network interface is connected
    pub link_up: bool,
    /// The internet is actually reachable through it
    pub internet_reachable: bool,
}

impl NetworkReport {
    pub const ONLINE: Self = Self {
        link_up: true,
        internet_reachable: true,
    };

    pub const OFFLINE: Self = Self {
        link_up: false,
        internet_reachable: false,
    };

    /// Online requires both a link and reachability.
    pub const fn is_online(self) -> bool {
        self.link_up && self.internet_reachable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub online: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityTransition {
    CameOnline,
    WentOffline,
}

struct Inner {
    // None until the first report establishes a baseline
    status: watch::Sender<Option<bool>>,
    listeners: Listeners<ConnectivityTransition>,
}

/// Shared, cloneable connectivity observer.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<Inner>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    /// Monitor with no observation yet; reports offline until told otherwise.
    pub fn new() -> Self {
        Self::with_status(None)
    }

    /// Monitor seeded with a known baseline.
    pub fn with_initial(online: bool) -> Self {
        Self::with_status(Some(online))
    }

    fn with_status(status: Option<bool>) -> Self {
        let (status, _) = watch::channel(status);
        Self {
            inner: Arc::new(Inner {
                status,
                listeners: Listeners::new(),
            }),
        }
    }

    pub fn current_state(&self) -> ConnectivityState {
        ConnectivityState {
            online: self.inner.status.borrow().unwrap_or(false),
        }
    }

    pub fn is_online(&self) -> bool {
        self.current_state().online
    }

    /// Record an observation. Returns the transition when online status
    /// flipped; the first observation only sets the baseline.
    pub fn report(&self, report: NetworkReport) -> Option<ConnectivityTransition> {
        let online = report.is_online();
        let mut transition = None;
        self.inner.status.send_if_modified(|status| match *status {
            Some(previous) if previous == online => false,
            Some(_) => {
                *status = Some(online);
                transition = Some(if online {
                    ConnectivityTransition::CameOnline
                } else {
                    ConnectivityTransition::WentOffline
                });
                true
            }
            None => {
                *status = Some(online);
                true
            }
        });

        if let Some(transition) = transition {
            tracing::info!("Connectivity changed: {transition:?}");
            self.inner.listeners.emit(&transition);
        }
        transition
    }

    /// Listen for online/offline flips.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&ConnectivityTransition) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    /// Receiver that wakes on every baseline or status change.
    pub fn watch(&self) -> watch::Receiver<Option<bool>> {
        self.inner.status.subscribe()
    }

    /// Ask `probe` once and record the result.
    pub async fn poll_once(&self, probe: &dyn NetworkProbe) -> Option<ConnectivityTransition> {
        let report = probe.probe().await;
        tracing::debug!("Network probe: {report:?}");
        self.report(report)
    }

    /// Poll `probe` every `every` until the returned task is aborted.
    pub fn spawn_polling(&self, probe: Arc<dyn NetworkProbe>, every: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                monitor.poll_once(probe.as_ref()).await;
            }
        })
    }
}

/// Source of network observations.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn probe(&self) -> NetworkReport;
}

/// Probe that treats any HTTP answer from the API host as reachable.
pub struct HttpReachabilityProbe {
    url: String,
    client: reqwest::Client,
}

impl HttpReachabilityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = normalize_text_option(Some(url.into()))
            .filter(|url| is_http_url(url))
            .ok_or_else(|| {
                Error::Configuration("probe URL must include http:// or https://".into())
            })?;
        Ok(Self {
            url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl NetworkProbe for HttpReachabilityProbe {
    async fn probe(&self) -> NetworkReport {
        match self.client.head(&self.url).send().await {
            Ok(_) => NetworkReport::ONLINE,
            // A timeout means packets leave the device but nothing answers
            Err(error) if error.is_timeout() => NetworkReport {
                link_up: true,
                internet_reachable: false,
            },
            Err(error) => {
                tracing::debug!("Reachability probe failed: {error}");
                NetworkReport::OFFLINE
            }
        }
    }
}
