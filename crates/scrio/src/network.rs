//! # Network Monitor
//!
//! Cached reachability checks against the upstream host. A probe result
//! is reused inside a refresh window so hot request paths never queue
//! behind repeated connectivity checks, and status listeners fire only
//! on actual transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

/// Point-in-time connectivity snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStatus {
    /// Last known reachability; assumed online before the first probe
    pub is_online: bool,
    /// When the last probe completed, `None` before the first probe
    pub last_checked_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct MonitorState {
    online: Option<bool>,
    checked_instant: Option<Instant>,
    checked_at: Option<DateTime<Utc>>,
}

/// Upstream reachability monitor with a cached verdict
pub struct NetworkMonitor {
    client: Client,
    probe_url: Url,
    refresh_window: Duration,
    probe_timeout: Duration,
    state: Mutex<MonitorState>,
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
    next_listener_id: AtomicU64,
}

impl NetworkMonitor {
    pub fn new(
        client: Client,
        probe_url: Url,
        refresh_window: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            client,
            probe_url,
            refresh_window,
            probe_timeout,
            state: Mutex::new(MonitorState::default()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Reachability verdict, probing only when the cached one has aged
    /// out of the refresh window.
    pub async fn is_online(&self) -> bool {
        {
            let state = self.state.lock().unwrap();
            if let (Some(online), Some(checked)) = (state.online, state.checked_instant) {
                if checked.elapsed() < self.refresh_window {
                    return online;
                }
            }
        }
        self.probe_and_update().await
    }

    /// Probe immediately, bypassing the refresh window.
    pub async fn force_check(&self) -> bool {
        self.probe_and_update().await
    }

    /// Current snapshot without probing.
    pub fn status(&self) -> NetworkStatus {
        let state = self.state.lock().unwrap();
        NetworkStatus {
            is_online: state.online.unwrap_or(true),
            last_checked_at: state.checked_at,
        }
    }

    /// Poll until the upstream is reachable or the timeout elapses.
    /// Returns the final verdict.
    pub async fn wait_for_online(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.force_check().await {
                return true;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Register a callback fired on every online/offline transition.
    ///
    /// The callback stays registered until the returned subscription is
    /// dropped.
    pub fn on_status_change(
        &self,
        callback: impl Fn(bool) + Send + Sync + 'static,
    ) -> StatusSubscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap()
            .insert(id, Arc::new(callback));
        StatusSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    async fn probe_and_update(&self) -> bool {
        let online = self.probe().await;

        let transitioned = {
            let mut state = self.state.lock().unwrap();
            let transitioned = state.online.is_some_and(|prev| prev != online);
            state.online = Some(online);
            state.checked_instant = Some(Instant::now());
            state.checked_at = Some(Utc::now());
            transitioned
        };

        if transitioned {
            info!(online, "network status changed");
            let listeners: Vec<Listener> =
                self.listeners.lock().unwrap().values().cloned().collect();
            for listener in listeners {
                listener(online);
            }
        }

        online
    }

    /// Any HTTP response counts as reachable, error statuses included;
    /// only a transport failure means offline.
    async fn probe(&self) -> bool {
        let request = self
            .client
            .head(self.probe_url.clone())
            .timeout(self.probe_timeout);

        match request.send().await {
            Ok(response) => {
                debug!(status = %response.status(), "upstream probe responded");
                true
            }
            Err(e) => {
                debug!(error = %e, "upstream probe failed");
                false
            }
        }
    }
}

/// Handle keeping a status listener registered.
pub struct StatusSubscription {
    id: u64,
    listeners: Weak<Mutex<HashMap<u64, Listener>>>,
}

impl StatusSubscription {
    /// Remove the listener now instead of at drop time.
    pub fn unsubscribe(self) {}
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.remove(&self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }

    /// HTTP stub that can be flipped between answering probes and
    /// dropping them mid-request. Counts every connection it accepts.
    async fn spawn_stub(healthy: Arc<AtomicBool>, hits: Arc<AtomicUsize>) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                hits.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 512];
                let _ = socket.read(&mut buf).await;
                if healthy.load(Ordering::SeqCst) {
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                        )
                        .await;
                }
                // Dropping the socket without a response fails the probe.
            }
        });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn monitor(probe_url: Url, refresh_window: Duration) -> NetworkMonitor {
        NetworkMonitor::new(
            Client::new(),
            probe_url,
            refresh_window,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_probe_result_reused_within_refresh_window() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(true));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy, hits.clone()).await;

        let monitor = monitor(url, Duration::from_secs(30));

        assert!(monitor.is_online().await);
        assert!(monitor.is_online().await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // force_check bypasses the window.
        assert!(monitor.force_check().await);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_offline() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(false));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy, hits).await;

        let monitor = monitor(url, Duration::from_secs(30));
        assert!(!monitor.force_check().await);
        assert!(!monitor.status().is_online);
    }

    #[tokio::test]
    async fn test_status_is_optimistic_before_first_probe() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(true));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy, hits).await;

        let monitor = monitor(url, Duration::from_secs(30));
        let status = monitor.status();
        assert!(status.is_online);
        assert!(status.last_checked_at.is_none());

        monitor.force_check().await;
        assert!(monitor.status().last_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_listeners_fire_on_transitions_only() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(false));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy.clone(), hits).await;

        let monitor = monitor(url, Duration::ZERO);
        let events: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = monitor.on_status_change(move |online| {
            sink.lock().unwrap().push(online);
        });

        // First observation sets the baseline without firing.
        monitor.force_check().await;
        monitor.force_check().await;
        assert!(events.lock().unwrap().is_empty());

        healthy.store(true, Ordering::SeqCst);
        monitor.force_check().await;
        assert_eq!(*events.lock().unwrap(), vec![true]);

        // Staying online is not a transition.
        monitor.force_check().await;
        assert_eq!(*events.lock().unwrap(), vec![true]);

        healthy.store(false, Ordering::SeqCst);
        monitor.force_check().await;
        assert_eq!(*events.lock().unwrap(), vec![true, false]);

        // After unsubscribing, transitions go unreported.
        subscription.unsubscribe();
        healthy.store(true, Ordering::SeqCst);
        monitor.force_check().await;
        assert_eq!(*events.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_wait_for_online_picks_up_recovery() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(false));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy.clone(), hits).await;

        let monitor = monitor(url, Duration::ZERO);

        let flip = healthy.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flip.store(true, Ordering::SeqCst);
        });

        assert!(
            monitor
                .wait_for_online(Duration::from_secs(5), Duration::from_millis(25))
                .await
        );
    }

    #[tokio::test]
    async fn test_wait_for_online_times_out() {
        init_tracing();
        let healthy = Arc::new(AtomicBool::new(false));
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_stub(healthy, hits).await;

        let monitor = monitor(url, Duration::ZERO);
        assert!(
            !monitor
                .wait_for_online(Duration::from_millis(200), Duration::from_millis(50))
                .await
        );
    }
}
