use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::backend::UsageBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Checking,
    Connected,
    Disconnected,
}

impl ConnectivityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Last known backend reachability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    pub status: ConnectivityStatus,
    /// `None` until the first probe settles.
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl ConnectivityState {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectivityStatus::Connected
    }

    pub fn is_disconnected(&self) -> bool {
        self.status == ConnectivityStatus::Disconnected
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            status: ConnectivityStatus::Checking,
            last_checked_at: None,
        }
    }
}

/// Cached probe outcome plus the sequence number of the probe that set it.
#[derive(Debug, Default)]
struct Cached {
    probe: u64,
    state: ConnectivityState,
}

/// Probes `/health` and caches the outcome.
///
/// Probes may overlap. The cache always holds the result of the most
/// recently started probe that has settled, so a slow earlier probe cannot
/// overwrite a newer one.
pub struct HealthMonitor<B> {
    backend: Arc<B>,
    started: AtomicU64,
    cached: Mutex<Cached>,
}

impl<B: UsageBackend> HealthMonitor<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            started: AtomicU64::new(0),
            cached: Mutex::new(Cached::default()),
        }
    }

    /// Cached state from the most recent probe.
    pub fn state(&self) -> ConnectivityState {
        self.cached().state.clone()
    }

    /// Issue one probe. Any error (refused, timeout, non-2xx) means
    /// disconnected; this never fails. Returns this probe's own result.
    pub async fn check_health(&self) -> ConnectivityState {
        let probe = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let status = match self.backend.health().await {
            Ok(()) => {
                debug!("Health check OK: server reachable");
                ConnectivityStatus::Connected
            }
            Err(e) => {
                warn!("Health check: server unreachable ({e})");
                ConnectivityStatus::Disconnected
            }
        };
        let state = ConnectivityState {
            status,
            last_checked_at: Some(Utc::now()),
        };
        let mut cached = self.cached();
        if probe > cached.probe {
            *cached = Cached {
                probe,
                state: state.clone(),
            };
        } else {
            debug!(probe, newer = cached.probe, "Dropping stale health result");
        }
        state
    }

    fn cached(&self) -> std::sync::MutexGuard<'_, Cached> {
        self.cached.lock().expect("health mutex poisoned")
    }
}
