//! Network connectivity tracking.
//!
//! The host platform (or [`HttpProbe`]) pushes state into a
//! [`ConnectivityMonitor`]; the sync service watches it and pauses or
//! resumes itself on transitions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Observed network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// No network link
    #[default]
    Disconnected,
    /// Link is up but the API cannot be reached
    ConnectedUnreachable,
    /// The API can be reached
    ConnectedReachable,
}

impl Connectivity {
    /// Build from the two flags mobile platforms report.
    pub fn from_flags(is_connected: bool, is_internet_reachable: bool) -> Self {
        match (is_connected, is_internet_reachable) {
            (false, _) => Connectivity::Disconnected,
            (true, false) => Connectivity::ConnectedUnreachable,
            (true, true) => Connectivity::ConnectedReachable,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Connectivity::ConnectedReachable)
    }
}

/// Shared, watchable connectivity state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<Connectivity>>,
}

impl ConnectivityMonitor {
    pub fn new(initial: Connectivity) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Record a new state. Returns `true` if it differs from the previous one.
    pub fn set(&self, state: Connectivity) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                tracing::debug!(from = ?*current, to = ?state, "Connectivity updated");
                *current = state;
                true
            }
        })
    }

    pub fn current(&self) -> Connectivity {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.sender.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(Connectivity::ConnectedReachable)
    }
}

/// Polls an HTTP health endpoint and feeds the result into a monitor.
///
/// A 2xx response means reachable; anything else, including a transport
/// error, means the link is up but the API is not usable. The probe cannot
/// tell a dead link from a dead server, so it never reports
/// [`Connectivity::Disconnected`].
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(interval.clamp(Duration::from_secs(1), Duration::from_secs(10)))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            interval,
        })
    }

    pub async fn check(&self) -> Connectivity {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => Connectivity::ConnectedReachable,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Health check rejected");
                Connectivity::ConnectedUnreachable
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                Connectivity::ConnectedUnreachable
            }
        }
    }

    /// Probe forever, publishing every result into `monitor`.
    pub async fn run(self, monitor: ConnectivityMonitor) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let state = self.check().await;
            if monitor.set(state) {
                tracing::info!(?state, url = %self.url, "Connectivity changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flags() {
        assert_eq!(Connectivity::from_flags(false, true), Connectivity::Disconnected);
        assert_eq!(
            Connectivity::from_flags(true, false),
            Connectivity::ConnectedUnreachable
        );
        assert!(Connectivity::from_flags(true, true).is_reachable());
        assert!(!Connectivity::ConnectedUnreachable.is_reachable());
    }

    #[tokio::test]
    async fn monitor_reports_only_changes() {
        let monitor = ConnectivityMonitor::new(Connectivity::Disconnected);
        let mut rx = monitor.subscribe();

        assert!(!monitor.set(Connectivity::Disconnected));
        assert!(monitor.set(Connectivity::ConnectedReachable));
        assert_eq!(monitor.current(), Connectivity::ConnectedReachable);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Connectivity::ConnectedReachable);
    }

    #[tokio::test]
    async fn probe_against_closed_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::new(format!("http://{}/health", addr), Duration::from_secs(1)).unwrap();
        assert_eq!(probe.check().await, Connectivity::ConnectedUnreachable);
    }
}
